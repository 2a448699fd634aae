//! GCode modal interpreter
//!
//! Scans the program once, front to back. State carried between lines:
//! - the last value seen for each of X, Y, Z, F, E, A (all start at 0)
//! - absolute or relative positioning (starts absolute)
//! - the last G command dispatched, whether or not it succeeded
//!
//! A line with axes but no command repeats that G command when it is a
//! motion (G0 to G3); after any other G command it is rejected. A repeated
//! arc is reported like the arc itself. A line whose commands all fail
//! leaves the carried values untouched.

use plotpath_core::PathEmitter;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::block::{strip_comments, Block};
use crate::command::Command;
use crate::error::{GcodeError, Result};

/// Banner comment for GCode conversions
pub const GCODE_WELCOME: &str = "GCode to Path";

/// Conversion parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GcodeOptions {
    /// Multiplier applied to X, Y, Z before rounding
    pub scale: f64,
    /// An extrusion change is emitted only when it exceeds this magnitude
    pub extrusion_proximity: f64,
}

impl Default for GcodeOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            extrusion_proximity: 0.0,
        }
    }
}

/// Field values carried forward from earlier lines, unscaled
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CarriedFields {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub f: f64,
    pub e: f64,
    pub a: f64,
}

impl CarriedFields {
    fn update(&mut self, block: &Block) {
        for (letter, slot) in [
            ('X', &mut self.x),
            ('Y', &mut self.y),
            ('Z', &mut self.z),
            ('F', &mut self.f),
            ('E', &mut self.e),
            ('A', &mut self.a),
        ] {
            if let Some(value) = block.get(letter) {
                *slot = value;
            }
        }
    }
}

/// Result of a GCode conversion
#[derive(Debug, Clone, PartialEq)]
pub struct GcodeConversion {
    /// Instruction stream
    pub code: String,
    /// Lines that were skipped, with the reason
    pub issues: Vec<GcodeError>,
}

/// GCode to instruction stream interpreter
#[derive(Debug)]
pub struct GcodeInterpreter {
    emitter: PathEmitter,
    options: GcodeOptions,
    carried: CarriedFields,
    relative: bool,
    modal: Option<Command>,
    issues: Vec<GcodeError>,
}

impl Default for GcodeInterpreter {
    fn default() -> Self {
        Self::new(GcodeOptions::default())
    }
}

impl GcodeInterpreter {
    pub fn new(options: GcodeOptions) -> Self {
        Self {
            emitter: PathEmitter::new(Some(GCODE_WELCOME)),
            options,
            carried: CarriedFields::default(),
            relative: false,
            modal: None,
            issues: Vec::new(),
        }
    }

    pub fn emitter(&self) -> &PathEmitter {
        &self.emitter
    }

    pub fn carried(&self) -> &CarriedFields {
        &self.carried
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }

    pub fn issues(&self) -> &[GcodeError] {
        &self.issues
    }

    fn scaled(&self, value: f64) -> f64 {
        (value * self.options.scale).round()
    }

    /// Interpret every line of `text`
    pub fn process(&mut self, text: &str) {
        for (index, line) in text.lines().enumerate() {
            self.process_line(index + 1, line);
        }
    }

    /// Interpret one source line
    pub fn process_line(&mut self, line_number: usize, line: &str) {
        let cleaned = strip_comments(line);
        if cleaned.trim().is_empty() {
            return;
        }

        let block = match Block::parse(line_number, &cleaned) {
            Ok(block) => block,
            Err(err) => {
                self.report(err);
                return;
            }
        };

        let mut commands: Vec<Command> = block.command_words().map(Command::from_word).collect();
        if commands.is_empty() {
            match self.modal {
                Some(motion) if motion.is_modal_motion() && block.has_axis() => {
                    trace!(line_number, command = %motion, "repeating modal command");
                    commands.push(motion);
                }
                _ => {
                    self.report(GcodeError::NoCommand { line_number });
                    return;
                }
            }
        }

        let mut dispatched = false;
        let mut resets_baseline = false;
        for command in commands {
            if command.takes_modal_slot() {
                self.modal = Some(command);
            }
            match self.execute(command, &block) {
                Ok(()) => {
                    dispatched = true;
                    resets_baseline |= command == Command::SetPosition;
                }
                Err(err) => self.report(err),
            }
        }

        if dispatched && !resets_baseline {
            self.carried.update(&block);
        }
    }

    fn report(&mut self, err: GcodeError) {
        warn!(error = %err, "skipping G-Code");
        self.issues.push(err);
    }

    fn execute(&mut self, command: Command, block: &Block) -> Result<()> {
        let line_number = block.line_number;
        match command {
            Command::Rapid | Command::Linear => {
                self.linear_move(block);
                Ok(())
            }
            Command::ArcCw | Command::ArcCcw => Err(GcodeError::UnsupportedCode {
                line_number,
                code: command.to_string(),
            }),
            Command::Dwell => {
                self.dwell(block);
                Ok(())
            }
            Command::Home => {
                self.home(block);
                Ok(())
            }
            Command::Absolute => {
                self.relative = false;
                Ok(())
            }
            Command::Relative => {
                self.relative = true;
                Ok(())
            }
            Command::SetPosition => {
                self.set_position(block);
                Ok(())
            }
            Command::Other(word) => Err(GcodeError::UnknownCode {
                line_number,
                code: word.to_string(),
            }),
        }
    }

    /// G0/G1
    fn linear_move(&mut self, block: &Block) {
        let proximity = self.options.extrusion_proximity;
        let e = block.get('E').unwrap_or(self.carried.e);
        if (e - self.carried.e).abs() > proximity {
            self.emitter.extrude(e, None).and();
        } else if let Some(a) = block.get('A') {
            if (a - self.carried.a).abs() > proximity {
                debug!(line_number = block.line_number, a, "extrusion change from A field");
                self.emitter.extrude(a, None).and();
            }
        }

        if self.relative {
            if let Some(dz) = block.get('Z').filter(|dz| *dz != 0.0) {
                let dz = self.scaled(dz);
                self.emitter.elevate_by(dz).end();
            }
            let dx = block.get('X').unwrap_or(0.0);
            let dy = block.get('Y').unwrap_or(0.0);
            if dx != 0.0 || dy != 0.0 {
                let (dx, dy) = (self.scaled(dx), self.scaled(dy));
                self.emitter.move_by(dx, dy).end();
            }
        } else {
            let z = block.get('Z').unwrap_or(self.carried.z);
            if z != self.carried.z {
                let z = self.scaled(z);
                self.emitter.elevate_to(z).end();
            }
            let x = block.get('X').unwrap_or(self.carried.x);
            let y = block.get('Y').unwrap_or(self.carried.y);
            if x != self.carried.x || y != self.carried.y {
                let (x, y) = (self.scaled(x), self.scaled(y));
                self.emitter.move_to(x, y).end();
            }
        }
        self.emitter.end();
    }

    /// G4: short wait of P, or of S when P is absent
    fn dwell(&mut self, block: &Block) {
        if let Some(t) = block.get('P').or_else(|| block.get('S')) {
            self.emitter.wait(Some(t)).end();
        } else {
            debug!(line_number = block.line_number, "dwell without P or S");
        }
    }

    /// G28
    fn home(&mut self, block: &Block) {
        let (x, y, z) = (block.has('X'), block.has('Y'), block.has('Z'));
        if x || y || z {
            if x || y {
                let pos = self.emitter.position();
                self.emitter
                    .move_to(if x { 0.0 } else { pos.x }, if y { 0.0 } else { pos.y })
                    .end();
            }
            if z {
                self.emitter.elevate_to(0.0).end();
            }
        } else {
            self.emitter.move_to(0.0, 0.0).then().elevate_to(0.0).end();
        }

        let all = !(x || y || z);
        if all || x {
            self.carried.x = 0.0;
        }
        if all || y {
            self.carried.y = 0.0;
        }
        if all || z {
            self.carried.z = 0.0;
        }
    }

    /// G92: re-origin the named axes (all of X, Y, Z, E when none is named)
    fn set_position(&mut self, block: &Block) {
        let (x, y, z, e) = (block.has('X'), block.has('Y'), block.has('Z'), block.has('E'));
        if !(x || y || z || e) {
            self.emitter.reset_position(0.0, 0.0, 0.0);
            self.carried.x = 0.0;
            self.carried.y = 0.0;
            self.carried.z = 0.0;
            self.carried.e = 0.0;
            return;
        }

        let pos = self.emitter.position();
        let elevation = self.emitter.elevation();
        self.emitter.reset_position(
            if x { 0.0 } else { pos.x },
            if y { 0.0 } else { pos.y },
            if z { 0.0 } else { elevation },
        );
        if x {
            self.carried.x = 0.0;
        }
        if y {
            self.carried.y = 0.0;
        }
        if z {
            self.carried.z = 0.0;
        }
        if e {
            self.carried.e = 0.0;
        }
    }

    /// Extract the instruction stream and the collected issues
    pub fn finish(self) -> Result<GcodeConversion> {
        let code = self.emitter.finish()?;
        Ok(GcodeConversion {
            code,
            issues: self.issues,
        })
    }
}

/// Convert a GCode program into an instruction stream
pub fn gcode_to_path(text: &str, options: &GcodeOptions) -> Result<GcodeConversion> {
    let mut interpreter = GcodeInterpreter::new(*options);
    interpreter.process(text);
    let conversion = interpreter.finish()?;
    if !conversion.issues.is_empty() {
        debug!(count = conversion.issues.len(), "G-Code conversion finished with issues");
    }
    Ok(conversion)
}
