//! Instruction emitter shared by the SVG and GCode front ends
//!
//! `PathEmitter` owns:
//! - the active transform context and its push/pop stack
//! - the local position and elevation (pre-transform coordinates)
//! - the last emitted absolute device position
//! - the last Bézier control point, for mirrored smooth curves
//! - the instruction buffer and its snapshot stack for rollback
//!
//! Every position change goes through a shift: the local position is
//! transformed and rounded, and the difference to the last emitted device
//! position is emitted as a relative move. The device position is then set
//! to the rounded value, so the emitted deltas always add up to the rounded
//! displacement and rounding error never accumulates.
//!
//! Statement layout: `and()` joins the next instruction onto the open
//! statement, `end()`/`then()` terminates it. An instruction emitted into an
//! open statement without `and()` starts a new statement.

mod instruction;

pub use instruction::{format_number, Axis, Instruction, Statement};

use tracing::{trace, warn};

use crate::error::EmitterError;
use crate::flatten::{CurveFlattener, FlattenedCurve};
use crate::geometry::{AffineMatrix, Point};

/// Default short wait, in device time units
pub const DEFAULT_WAIT: f64 = 500.0;

/// Default long wait
pub const DEFAULT_LONG_WAIT: f64 = 1.0;

/// Banner written when no welcome text is supplied
pub const DEFAULT_WELCOME: &str = "Personalized path";

/// Largest delta magnitude that converts to `i64` without saturating
const MAX_DELTA: f64 = 9.0e18;

fn in_range(v: f64) -> bool {
    v.abs() <= MAX_DELTA
}

/// Position state, captured together with the code on `store_code`
#[derive(Debug, Clone, Copy, Default)]
struct Tracker {
    /// Local position, meaningful in the current context only
    position: Point,
    /// Local elevation
    elevation: f64,
    /// Last emitted device position (rounded)
    device: Point,
    /// Last emitted device elevation (rounded)
    device_z: f64,
    /// Last Bézier control point, local
    last_ctrl: Option<Point>,
}

#[derive(Debug, Clone)]
struct Snapshot {
    statements: usize,
    open: Vec<Instruction>,
    joined: bool,
    tracker: Tracker,
}

/// Path emitter
#[derive(Debug, Clone)]
pub struct PathEmitter {
    context: AffineMatrix,
    context_stack: Vec<AffineMatrix>,
    tracker: Tracker,
    statements: Vec<Statement>,
    open: Vec<Instruction>,
    joined: bool,
    code_stack: Vec<Snapshot>,
    flattener: CurveFlattener,
}

impl Default for PathEmitter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PathEmitter {
    /// Create an emitter; the welcome text becomes the first comment line
    pub fn new(welcome: Option<&str>) -> Self {
        let mut emitter = Self {
            context: AffineMatrix::IDENTITY,
            context_stack: Vec::new(),
            tracker: Tracker::default(),
            statements: Vec::new(),
            open: Vec::new(),
            joined: false,
            code_stack: Vec::new(),
            flattener: CurveFlattener::new(),
        };
        emitter.comment(welcome.unwrap_or(DEFAULT_WELCOME));
        emitter
    }

    // ------------------------------------------------------------------
    // Context stack
    // ------------------------------------------------------------------

    /// Push the current context. The local position is reset to the origin.
    pub fn store_context(&mut self) -> &mut Self {
        self.context_stack.push(self.context);
        self.tracker.position = Point::ORIGIN;
        self
    }

    /// Pop the context pushed by the matching `store_context`
    pub fn release_context(&mut self) -> Result<(), EmitterError> {
        match self.context_stack.pop() {
            Some(context) => {
                self.context = context;
                Ok(())
            }
            None => {
                warn!("release_context without matching store_context");
                Err(EmitterError::ContextUnderflow)
            }
        }
    }

    /// Compose `matrix` inside the current context
    pub fn transform(&mut self, matrix: &AffineMatrix) -> &mut Self {
        self.context = self.context.then(matrix);
        self
    }

    /// Run `f` inside a nested context built from `matrices`, in order
    pub fn with_context<R, F>(&mut self, matrices: &[AffineMatrix], f: F) -> Result<R, EmitterError>
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.store_context();
        for m in matrices {
            self.transform(m);
        }
        let result = f(self);
        self.release_context()?;
        Ok(result)
    }

    pub fn context(&self) -> &AffineMatrix {
        &self.context
    }

    pub fn context_depth(&self) -> usize {
        self.context_stack.len()
    }

    // ------------------------------------------------------------------
    // Code stack
    // ------------------------------------------------------------------

    /// Snapshot the instruction buffer and position state
    pub fn store_code(&mut self) -> &mut Self {
        self.code_stack.push(Snapshot {
            statements: self.statements.len(),
            open: self.open.clone(),
            joined: self.joined,
            tracker: self.tracker,
        });
        self
    }

    /// Commit: drop the most recent snapshot, keep the buffer as is
    pub fn release_code(&mut self) -> Result<(), EmitterError> {
        self.code_stack
            .pop()
            .map(|_| ())
            .ok_or(EmitterError::CodeUnderflow {
                operation: "release_code",
            })
    }

    /// Rollback: discard everything emitted since the most recent snapshot
    pub fn restore_code(&mut self) -> Result<(), EmitterError> {
        let snapshot = self.code_stack.pop().ok_or(EmitterError::CodeUnderflow {
            operation: "restore_code",
        })?;
        trace!(
            discarded = self.statements.len().saturating_sub(snapshot.statements),
            "restoring code snapshot"
        );
        self.statements.truncate(snapshot.statements);
        self.open = snapshot.open;
        self.joined = snapshot.joined;
        self.tracker = snapshot.tracker;
        Ok(())
    }

    /// Run `f` as one transaction: committed on `Ok`, rolled back on `Err`
    pub fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<EmitterError>,
    {
        self.store_code();
        match f(self) {
            Ok(value) => {
                self.release_code()?;
                Ok(value)
            }
            Err(err) => {
                self.restore_code()?;
                Err(err)
            }
        }
    }

    pub fn code_depth(&self) -> usize {
        self.code_stack.len()
    }

    // ------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------

    /// Local position in the current context
    pub fn position(&self) -> Point {
        self.tracker.position
    }

    /// Local elevation
    pub fn elevation(&self) -> f64 {
        self.tracker.elevation
    }

    /// Current position transformed to absolute coordinates (unrounded)
    pub fn current_position(&self) -> Point {
        self.context.transform_point(self.tracker.position)
    }

    /// Last emitted device position
    pub fn device_position(&self) -> Point {
        self.tracker.device
    }

    /// Last emitted device elevation
    pub fn device_elevation(&self) -> f64 {
        self.tracker.device_z
    }

    pub fn last_control(&self) -> Option<Point> {
        self.tracker.last_ctrl
    }

    // ------------------------------------------------------------------
    // Statement layout
    // ------------------------------------------------------------------

    fn emit(&mut self, instruction: Instruction) -> &mut Self {
        if !self.joined && !self.open.is_empty() {
            self.end();
        }
        self.open.push(instruction);
        self.joined = false;
        self
    }

    /// Continue the open statement with the next instruction
    pub fn and(&mut self) -> &mut Self {
        self.joined = true;
        self
    }

    /// Terminate the open statement
    pub fn end(&mut self) -> &mut Self {
        if !self.open.is_empty() {
            let open = std::mem::take(&mut self.open);
            self.statements.push(Statement::Instructions(open));
        }
        self.joined = false;
        self
    }

    /// Same as `end`
    pub fn then(&mut self) -> &mut Self {
        self.end()
    }

    /// Append a comment line
    pub fn comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.end();
        self.statements.push(Statement::Comment(text.into()));
        self
    }

    // ------------------------------------------------------------------
    // Motion
    // ------------------------------------------------------------------

    fn shift(&mut self) -> &mut Self {
        let target = self.current_position().round();
        let target_z = self.tracker.elevation.round();
        if !target.is_finite() || !target_z.is_finite() {
            warn!(?target, target_z, "non-finite position, shift skipped");
            return self;
        }

        let delta = target - self.tracker.device;
        let dz = target_z - self.tracker.device_z;
        if !(in_range(delta.x) && in_range(delta.y) && in_range(dz)) {
            warn!(?target, target_z, "device delta out of range, shift skipped");
            return self;
        }

        let moved = !delta.is_zero();
        if moved {
            self.emit(Instruction::Move {
                dx: delta.x as i64,
                dy: delta.y as i64,
            });
            self.tracker.device = target;
        }

        if dz != 0.0 {
            if moved {
                self.and();
            }
            self.emit(Instruction::Elevate { dz: dz as i64 });
            self.tracker.device_z = target_z;
        }
        self
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.tracker.position = Point::new(x, y);
        self.tracker.last_ctrl = None;
        self.shift()
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) -> &mut Self {
        let p = self.tracker.position.translate(dx, dy);
        self.move_to(p.x, p.y)
    }

    pub fn elevate_to(&mut self, z: f64) -> &mut Self {
        self.tracker.elevation = z;
        self.tracker.last_ctrl = None;
        self.shift()
    }

    pub fn elevate_by(&mut self, dz: f64) -> &mut Self {
        self.elevate_to(self.tracker.elevation + dz)
    }

    /// Force the position to `(x, y, z)` and emit an absolute reset
    ///
    /// No delta is computed; the device position is resynchronised to the
    /// new coordinates so later moves are relative to them.
    pub fn reset_position(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        self.end();
        self.emit(Instruction::SetPosition {
            axis: Axis::X,
            value: x,
        })
        .and()
        .emit(Instruction::SetPosition {
            axis: Axis::Y,
            value: y,
        })
        .and()
        .emit(Instruction::SetPosition {
            axis: Axis::Z,
            value: z,
        })
        .end();
        self.tracker.position = Point::new(x, y);
        self.tracker.elevation = z;
        self.tracker.device = self.current_position().round();
        self.tracker.device_z = z.round();
        self.tracker.last_ctrl = None;
        self
    }

    // ------------------------------------------------------------------
    // Device actions
    // ------------------------------------------------------------------

    pub fn extrude(&mut self, amount: f64, rate: Option<f64>) -> &mut Self {
        self.emit(Instruction::Extrude { amount, rate })
    }

    /// Short wait, `DEFAULT_WAIT` when `None`
    pub fn wait(&mut self, t: Option<f64>) -> &mut Self {
        self.emit(Instruction::Wait(t.unwrap_or(DEFAULT_WAIT)))
    }

    /// Long wait, `DEFAULT_LONG_WAIT` when `None`
    pub fn long_wait(&mut self, t: Option<f64>) -> &mut Self {
        self.emit(Instruction::LongWait(t.unwrap_or(DEFAULT_LONG_WAIT)))
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Move and extrude, as one statement
    fn segment_to(&mut self, p: Point) -> &mut Self {
        let before = self.tracker.device;
        self.move_to(p.x, p.y).and();
        let d = (self.tracker.device - before).abs();
        let amount = (d.x.max(d.y) / 2.0).ceil();
        self.extrude(amount, None).end()
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.segment_to(Point::new(x, y)).then().wait(None)
    }

    pub fn line_by(&mut self, dx: f64, dy: f64) -> &mut Self {
        let p = self.tracker.position.translate(dx, dy);
        self.line_to(p.x, p.y)
    }

    fn draw_flattened(&mut self, label: &str, curve: &FlattenedCurve) {
        self.comment(format!(
            "{}: len={:.2}, N={}",
            label,
            curve.length,
            curve.points.len()
        ));
        for p in curve.points.iter().skip(1) {
            self.segment_to(*p);
        }
    }

    /// Cubic Bézier from the current position
    pub fn curve_to(&mut self, c1: Point, c2: Point, to: Point) -> &mut Self {
        let curve = self
            .flattener
            .flatten_cubic(self.tracker.position, c1, c2, to);
        self.draw_flattened("curveTo", &curve);
        self.tracker.position = to;
        self.tracker.last_ctrl = Some(c2);
        self
    }

    pub fn curve_by(&mut self, c1: Point, c2: Point, to: Point) -> &mut Self {
        let origin = self.tracker.position;
        self.curve_to(origin + c1, origin + c2, origin + to)
    }

    fn mirrored_control(&self) -> Point {
        let pos = self.tracker.position;
        self.tracker
            .last_ctrl
            .map(|ctrl| ctrl.reflect(pos))
            .unwrap_or(pos)
    }

    /// Cubic Bézier whose first control point mirrors the previous curve's
    pub fn smooth_curve_to(&mut self, c2: Point, to: Point) -> &mut Self {
        let c1 = self.mirrored_control();
        self.curve_to(c1, c2, to)
    }

    pub fn smooth_curve_by(&mut self, c2: Point, to: Point) -> &mut Self {
        let origin = self.tracker.position;
        self.smooth_curve_to(origin + c2, origin + to)
    }

    /// Quadratic Bézier from the current position
    pub fn quad_to(&mut self, ctrl: Point, to: Point) -> &mut Self {
        let curve = self
            .flattener
            .flatten_quadratic(self.tracker.position, ctrl, to);
        self.draw_flattened("quadTo", &curve);
        self.tracker.position = to;
        self.tracker.last_ctrl = Some(ctrl);
        self
    }

    pub fn quad_by(&mut self, ctrl: Point, to: Point) -> &mut Self {
        let origin = self.tracker.position;
        self.quad_to(origin + ctrl, origin + to)
    }

    pub fn smooth_quad_to(&mut self, to: Point) -> &mut Self {
        let ctrl = self.mirrored_control();
        self.quad_to(ctrl, to)
    }

    pub fn smooth_quad_by(&mut self, to: Point) -> &mut Self {
        let origin = self.tracker.position;
        self.smooth_quad_to(origin + to)
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Completed statements, excluding the open one
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// All instructions emitted so far, in order, comments skipped
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.statements
            .iter()
            .filter_map(|s| match s {
                Statement::Instructions(list) => Some(list.iter()),
                Statement::Comment(_) => None,
            })
            .flatten()
            .chain(self.open.iter())
    }

    /// Render the buffer, including the open statement
    pub fn code(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(&statement.to_string());
            out.push('\n');
        }
        if !self.open.is_empty() {
            out.push_str(&Statement::Instructions(self.open.clone()).to_string());
            out.push('\n');
        }
        out
    }

    /// Terminate the open statement and return the instruction stream
    pub fn finish(mut self) -> Result<String, EmitterError> {
        if !self.code_stack.is_empty() {
            return Err(EmitterError::UnbalancedCodeStack {
                depth: self.code_stack.len(),
            });
        }
        if !self.context_stack.is_empty() {
            return Err(EmitterError::UnbalancedContextStack {
                depth: self.context_stack.len(),
            });
        }
        self.end();
        Ok(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(emitter: &PathEmitter) -> Vec<String> {
        emitter
            .code()
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_welcome_comment() {
        assert_eq!(PathEmitter::default().code(), "# Personalized path\n");
        assert_eq!(PathEmitter::new(Some("SVG to Path")).code(), "# SVG to Path\n");
    }

    #[test]
    fn test_move_emits_relative_delta() {
        let mut e = PathEmitter::default();
        e.move_to(10.0, 5.0).end();
        e.move_by(-3.0, 0.0).end();
        assert_eq!(body(&e), vec!["m 10 5", "m -3 0"]);
        assert_eq!(e.position(), Point::new(7.0, 5.0));
    }

    #[test]
    fn test_zero_move_emits_nothing() {
        let mut e = PathEmitter::default();
        e.move_to(0.2, -0.3).end();
        assert!(body(&e).is_empty());
    }

    #[test]
    fn test_out_of_range_move_is_skipped() {
        let mut e = PathEmitter::default();
        e.move_to(1e300, 0.0).end();
        assert!(body(&e).is_empty());
        assert_eq!(e.device_position(), Point::ORIGIN);

        e.move_to(5.0, 0.0).end();
        e.elevate_to(-1e20).end();
        assert_eq!(e.device_elevation(), 0.0);
        e.elevate_to(2.0).end();
        assert_eq!(body(&e), vec!["m 5 0", "z 2"]);
    }

    #[test]
    fn test_rounded_feedback_prevents_drift() {
        let mut e = PathEmitter::default();
        for _ in 0..10 {
            e.move_by(0.4, 0.0).end();
        }
        let total: i64 = e
            .instructions()
            .map(|i| match i {
                Instruction::Move { dx, .. } => *dx,
                _ => 0,
            })
            .sum();
        assert_eq!(total, 4);
        assert_eq!(e.device_position(), Point::new(4.0, 0.0));
    }

    #[test]
    fn test_move_and_elevate_share_statement() {
        let mut e = PathEmitter::default();
        e.elevate_to(3.0).end();
        e.move_to(1.0, 1.0).end();
        e.elevate_by(-1.0).end();
        assert_eq!(body(&e), vec!["z 3", "m 1 1", "z -1"]);
    }

    #[test]
    fn test_line_to_extrudes_and_waits() {
        let mut e = PathEmitter::default();
        e.line_to(10.0, -3.0).end();
        assert_eq!(body(&e), vec!["m 10 -3, e 5", "w 500"]);
    }

    #[test]
    fn test_line_speed_rounds_up() {
        let mut e = PathEmitter::default();
        e.line_to(7.0, 2.0).end();
        assert_eq!(body(&e)[0], "m 7 2, e 4");
    }

    #[test]
    fn test_unterminated_statement_is_split() {
        let mut e = PathEmitter::default();
        e.wait(None);
        e.move_to(1.0, 0.0);
        e.long_wait(None).end();
        assert_eq!(body(&e), vec!["w 500", "m 1 0", "W 1"]);
    }

    #[test]
    fn test_comment_terminates_open_statement() {
        let mut e = PathEmitter::default();
        e.move_to(1.0, 0.0).and();
        e.comment("note");
        let code = e.code();
        assert!(code.ends_with("m 1 0\n# note\n"));
    }

    #[test]
    fn test_store_context_resets_local_position() {
        let mut e = PathEmitter::default();
        e.move_to(50.0, 50.0).end();
        e.store_context();
        assert_eq!(e.position(), Point::ORIGIN);
        assert_eq!(e.device_position(), Point::new(50.0, 50.0));
        e.release_context().unwrap();
    }

    #[test]
    fn test_context_transforms_moves() {
        let mut e = PathEmitter::default();
        e.with_context(&[AffineMatrix::translation(100.0, 0.0)], |e| {
            e.move_to(1.0, 2.0).end();
        })
        .unwrap();
        e.move_to(0.0, 0.0).end();
        assert_eq!(body(&e), vec!["m 101 2", "m -101 -2"]);
        assert_eq!(e.context_depth(), 0);
    }

    #[test]
    fn test_release_context_underflow() {
        let mut e = PathEmitter::default();
        assert_eq!(e.release_context(), Err(EmitterError::ContextUnderflow));
    }

    #[test]
    fn test_restore_code_rolls_back_buffer_and_position() {
        let mut e = PathEmitter::default();
        e.move_to(5.0, 5.0).end();
        let before = e.code();
        e.store_code();
        e.line_to(20.0, 20.0).end();
        e.comment("partial");
        e.restore_code().unwrap();
        assert_eq!(e.code(), before);
        assert_eq!(e.device_position(), Point::new(5.0, 5.0));
        assert_eq!(e.position(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_release_code_keeps_buffer() {
        let mut e = PathEmitter::default();
        e.store_code();
        e.line_to(2.0, 0.0).end();
        let after = e.code();
        e.release_code().unwrap();
        assert_eq!(e.code(), after);
        assert_eq!(e.code_depth(), 0);
    }

    #[test]
    fn test_code_underflow() {
        let mut e = PathEmitter::default();
        assert!(matches!(
            e.release_code(),
            Err(EmitterError::CodeUnderflow { .. })
        ));
        assert!(matches!(
            e.restore_code(),
            Err(EmitterError::CodeUnderflow {
                operation: "restore_code"
            })
        ));
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut e = PathEmitter::default();
        let before = e.code();
        let result: Result<(), EmitterError> = e.transaction(|e| {
            e.line_to(10.0, 10.0).end();
            Err(EmitterError::ContextUnderflow)
        });
        assert!(result.is_err());
        assert_eq!(e.code(), before);
        assert_eq!(e.code_depth(), 0);
    }

    #[test]
    fn test_finish_rejects_pending_snapshot() {
        let mut e = PathEmitter::default();
        e.store_code();
        assert_eq!(
            e.finish(),
            Err(EmitterError::UnbalancedCodeStack { depth: 1 })
        );
    }

    #[test]
    fn test_finish_terminates_open_statement() {
        let mut e = PathEmitter::default();
        e.move_to(3.0, 4.0);
        assert_eq!(e.finish().unwrap(), "# Personalized path\nm 3 4\n");
    }

    #[test]
    fn test_smooth_curve_mirrors_last_control() {
        let mut e = PathEmitter::default();
        e.curve_to(
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 0.0),
        );
        assert_eq!(e.last_control(), Some(Point::new(100.0, 100.0)));
        assert_eq!(e.mirrored_control(), Point::new(100.0, -100.0));
    }

    #[test]
    fn test_smooth_without_previous_curve_uses_position() {
        let mut e = PathEmitter::default();
        e.move_to(10.0, 10.0).end();
        assert_eq!(e.last_control(), None);
        assert_eq!(e.mirrored_control(), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_curve_ends_at_exact_endpoint() {
        let mut e = PathEmitter::default();
        e.curve_by(
            Point::new(0.3, 40.0),
            Point::new(80.6, 40.0),
            Point::new(80.6, 0.2),
        );
        assert_eq!(e.position(), Point::new(80.6, 0.2));
        assert_eq!(e.device_position(), Point::new(81.0, 0.0));
        assert!(e.code().contains("# curveTo: len="));
    }

    #[test]
    fn test_move_clears_last_control() {
        let mut e = PathEmitter::default();
        e.quad_to(Point::new(10.0, 10.0), Point::new(20.0, 0.0));
        assert_eq!(e.last_control(), Some(Point::new(10.0, 10.0)));
        e.line_by(5.0, 0.0);
        assert_eq!(e.last_control(), None);
    }

    #[test]
    fn test_reset_position_resynchronises() {
        let mut e = PathEmitter::default();
        e.move_to(100.0, 50.0).end();
        e.reset_position(0.0, 0.0, 0.0);
        e.move_to(10.0, 0.0).end();
        assert_eq!(body(&e), vec!["m 100 50", "sxp 0, syp 0, szp 0", "m 10 0"]);
    }
}
