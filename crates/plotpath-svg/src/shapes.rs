//! Primitive shape handlers
//!
//! Each handler reads its attributes, writes its label comment, and draws
//! inside an emitter transaction so a malformed element leaves no partial
//! motion behind.

use plotpath_core::{PathEmitter, Point};
use tracing::debug;

use crate::error::{Result, SvgError};
use crate::node::ShapeNode;
use crate::path_data::{normalize, scaled, SvgPathGrammar};

/// Element kinds with a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Group,
    Rect,
    Path,
    Polygon,
    Polyline,
    Circle,
}

impl ShapeKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "g" => Some(Self::Group),
            "rect" => Some(Self::Rect),
            "path" => Some(Self::Path),
            "polygon" => Some(Self::Polygon),
            "polyline" => Some(Self::Polyline),
            "circle" => Some(Self::Circle),
            _ => None,
        }
    }
}

/// Numeric attribute, scaled; a trailing `px` unit is accepted
fn length_attr<N: ShapeNode>(node: &N, name: &str, scale: f64) -> Result<Option<f64>> {
    node.attr(name)
        .map(|raw| {
            let raw = raw.trim();
            scaled(raw.strip_suffix("px").unwrap_or(raw), scale)
        })
        .transpose()
}

fn required_attr<N: ShapeNode>(
    node: &N,
    element: &'static str,
    attribute: &'static str,
    scale: f64,
) -> Result<f64> {
    length_attr(node, attribute, scale)?.ok_or(SvgError::MissingAttribute { element, attribute })
}

/// `<rect>`: outline drawn from the top-left corner, clockwise
pub fn rect<N: ShapeNode>(emitter: &mut PathEmitter, node: &N, scale: f64) -> Result<()> {
    let x = length_attr(node, "x", scale)?.unwrap_or(0.0);
    let y = length_attr(node, "y", scale)?.unwrap_or(0.0);
    let w = required_attr(node, "rect", "width", scale)?;
    let h = required_attr(node, "rect", "height", scale)?;

    emitter.comment(format!("rect {} {} {} {}", x, y, w, h));
    emitter.transaction(|e| -> Result<()> {
        e.move_to(x, y)
            .then()
            .line_by(w, 0.0)
            .then()
            .line_by(0.0, h)
            .then()
            .line_by(-w, 0.0)
            .then()
            .line_by(0.0, -h)
            .end();
        Ok(())
    })
}

/// `<path>`: the `d` attribute through the path-data grammar
pub fn path<N: ShapeNode>(emitter: &mut PathEmitter, node: &N, scale: f64) -> Result<()> {
    emitter.comment("path");
    let data = node.attr("d").ok_or(SvgError::MissingAttribute {
        element: "path",
        attribute: "d",
    })?;

    emitter.transaction(|e| -> Result<()> {
        e.comment(format!("Data: {}", normalize(data)));
        SvgPathGrammar::new(scale).parse(e, data)
    })
}

/// `<polyline>` and `<polygon>`; a polygon closes back to its first point
pub fn polyline<N: ShapeNode>(
    emitter: &mut PathEmitter,
    node: &N,
    scale: f64,
    closed: bool,
) -> Result<()> {
    let element = if closed { "polygon" } else { "polyline" };
    emitter.comment(if closed { "Polygon" } else { "Polyline" });
    let raw = node.attr("points").ok_or(SvgError::MissingAttribute {
        element,
        attribute: "points",
    })?;

    let tokens: Vec<&str> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() % 2 != 0 {
        return Err(SvgError::OddPointList {
            count: tokens.len(),
        });
    }

    emitter.transaction(|e| -> Result<()> {
        let mut first: Option<Point> = None;
        for pair in tokens.chunks_exact(2) {
            let p = Point::new(scaled(pair[0], scale)?, scaled(pair[1], scale)?);
            match first {
                None => {
                    e.move_to(p.x, p.y).end();
                    first = Some(p);
                }
                Some(_) => {
                    e.line_to(p.x, p.y).end();
                }
            }
        }
        if let (true, Some(start)) = (closed, first) {
            e.line_to(start.x, start.y).end();
        }
        Ok(())
    })
}

/// `<circle>`: annotation only
pub fn circle(emitter: &mut PathEmitter) -> Result<()> {
    debug!("circle drawing is not implemented, annotation only");
    emitter.comment("circ");
    Ok(())
}
