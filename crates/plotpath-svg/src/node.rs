//! Shape tree capability
//!
//! The walker does not parse markup. It consumes any tree that can report a
//! tag name, look up attributes, and hand over its transform list already
//! resolved to matrices. `SvgNode` is a plain in-memory implementation.

use std::collections::BTreeMap;

use plotpath_core::AffineMatrix;

/// A node of an externally parsed shape tree
pub trait ShapeNode {
    /// Element tag name, in any case
    fn tag(&self) -> &str;

    /// Attribute value by name
    fn attr(&self, name: &str) -> Option<&str>;

    /// Resolved `transform` list, outermost first
    fn transforms(&self) -> &[AffineMatrix];

    /// Child elements in document order
    fn children(&self) -> &[Self]
    where
        Self: Sized;
}

/// Owned shape tree node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub transforms: Vec<AffineMatrix>,
    pub children: Vec<SvgNode>,
}

impl SvgNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_transform(mut self, matrix: AffineMatrix) -> Self {
        self.transforms.push(matrix);
        self
    }

    pub fn with_child(mut self, child: SvgNode) -> Self {
        self.children.push(child);
        self
    }

    /// `<rect>` with the four geometry attributes set
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new("rect")
            .with_attr("x", x.to_string())
            .with_attr("y", y.to_string())
            .with_attr("width", width.to_string())
            .with_attr("height", height.to_string())
    }

    /// `<path>` with the given path data
    pub fn path(d: impl Into<String>) -> Self {
        Self::new("path").with_attr("d", d)
    }
}

impl ShapeNode for SvgNode {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn transforms(&self) -> &[AffineMatrix] {
        &self.transforms
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}
