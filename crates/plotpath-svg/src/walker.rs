//! Depth-first shape tree walker
//!
//! Every handled element gets its own transform context: pushed on entry,
//! composed with the element's resolved transforms, popped on exit whatever
//! the handler returned. Handler errors are recorded as issues and the walk
//! moves on to the next sibling.

use plotpath_core::{EmitterError, PathEmitter};
use tracing::{debug, warn};

use crate::error::{Result, SvgError};
use crate::node::ShapeNode;
use crate::shapes::{self, ShapeKind};

/// Banner comment for SVG conversions
pub const SVG_WELCOME: &str = "SVG to Path";

/// Default scale from SVG user units to device units
pub const DEFAULT_SVG_SCALE: f64 = 100.0;

/// Result of an SVG conversion
#[derive(Debug, Clone, PartialEq)]
pub struct SvgConversion {
    /// Instruction stream
    pub code: String,
    /// Elements that were skipped or rolled back
    pub issues: Vec<SvgError>,
}

/// Shape tree walker feeding one emitter
#[derive(Debug)]
pub struct ShapeWalker {
    emitter: PathEmitter,
    scale: f64,
    issues: Vec<SvgError>,
}

impl ShapeWalker {
    pub fn new(scale: f64) -> Self {
        Self {
            emitter: PathEmitter::new(Some(SVG_WELCOME)),
            scale,
            issues: Vec::new(),
        }
    }

    pub fn emitter(&self) -> &PathEmitter {
        &self.emitter
    }

    pub fn issues(&self) -> &[SvgError] {
        &self.issues
    }

    /// Visit every child of `node`, in document order
    pub fn walk_children<N: ShapeNode>(&mut self, node: &N) -> std::result::Result<(), EmitterError> {
        for child in node.children() {
            self.visit(child)?;
        }
        Ok(())
    }

    /// Visit one element
    ///
    /// Only stack contract violations are returned; input errors become
    /// issues.
    pub fn visit<N: ShapeNode>(&mut self, node: &N) -> std::result::Result<(), EmitterError> {
        let tag = node.tag().to_ascii_lowercase();
        let Some(kind) = ShapeKind::from_tag(&tag) else {
            debug!("Skipping <{}>", tag);
            self.emitter.comment(format!("{} not supported.", tag));
            self.issues.push(SvgError::UnsupportedElement { tag });
            return Ok(());
        };

        debug!("Entering <{}>", tag);
        self.emitter.store_context();
        for matrix in node.transforms() {
            self.emitter
                .transform(&matrix.with_scaled_translation(self.scale));
        }
        let outcome = self.dispatch(kind, node);
        self.emitter.release_context()?;

        match outcome {
            Ok(()) => Ok(()),
            Err(SvgError::Emitter(err)) => Err(err),
            Err(err) => {
                warn!(element = %tag, error = %err, "element discarded");
                self.issues.push(err);
                Ok(())
            }
        }
    }

    fn dispatch<N: ShapeNode>(&mut self, kind: ShapeKind, node: &N) -> Result<()> {
        match kind {
            ShapeKind::Group => {
                self.emitter.comment("g");
                self.walk_children(node)?;
                Ok(())
            }
            ShapeKind::Rect => shapes::rect(&mut self.emitter, node, self.scale),
            ShapeKind::Path => shapes::path(&mut self.emitter, node, self.scale),
            ShapeKind::Polygon => shapes::polyline(&mut self.emitter, node, self.scale, true),
            ShapeKind::Polyline => shapes::polyline(&mut self.emitter, node, self.scale, false),
            ShapeKind::Circle => shapes::circle(&mut self.emitter),
        }
    }

    /// Extract the instruction stream and the collected issues
    pub fn finish(self) -> Result<SvgConversion> {
        let code = self.emitter.finish()?;
        Ok(SvgConversion {
            code,
            issues: self.issues,
        })
    }
}

/// Convert the children of `root` into an instruction stream
pub fn svg_to_path<N: ShapeNode>(root: &N, scale: f64) -> Result<SvgConversion> {
    let mut walker = ShapeWalker::new(scale);
    walker.walk_children(root)?;
    let conversion = walker.finish()?;
    if !conversion.issues.is_empty() {
        debug!(count = conversion.issues.len(), "SVG conversion finished with issues");
    }
    Ok(conversion)
}
