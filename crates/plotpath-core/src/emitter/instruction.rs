//! Output instruction stream
//!
//! One statement per line. Instructions belonging to the same statement are
//! separated by `, `; comments occupy a line of their own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis addressed by an absolute position reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn opcode(&self) -> &'static str {
        match self {
            Axis::X => "sxp",
            Axis::Y => "syp",
            Axis::Z => "szp",
        }
    }
}

/// A single device instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Relative XY move in device units (`m dx dy`)
    Move { dx: i64, dy: i64 },
    /// Relative elevation change (`z dz`)
    Elevate { dz: i64 },
    /// Absolute axis position reset (`sxp v`, `syp v`, `szp v`)
    SetPosition { axis: Axis, value: f64 },
    /// Extrusion amount with an optional rate (`e v [rate]`)
    Extrude { amount: f64, rate: Option<f64> },
    /// Short wait (`w v`)
    Wait(f64),
    /// Long wait (`W v`)
    LongWait(f64),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { dx, dy } => write!(f, "m {} {}", dx, dy),
            Self::Elevate { dz } => write!(f, "z {}", dz),
            Self::SetPosition { axis, value } => {
                write!(f, "{} {}", axis.opcode(), format_number(*value))
            }
            Self::Extrude { amount, rate } => match rate {
                Some(rate) => write!(f, "e {} {}", format_number(*amount), format_number(*rate)),
                None => write!(f, "e {}", format_number(*amount)),
            },
            Self::Wait(t) => write!(f, "w {}", format_number(*t)),
            Self::LongWait(t) => write!(f, "W {}", format_number(*t)),
        }
    }
}

/// One output line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Non-executable annotation (`# text`)
    Comment(String),
    /// Instructions executed as one logical step
    Instructions(Vec<Instruction>),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment(text) => write!(f, "# {}", text),
            Self::Instructions(list) => {
                for (i, instruction) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", instruction)?;
                }
                Ok(())
            }
        }
    }
}

/// Format a number without a trailing `.0` when it is integral
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_display() {
        assert_eq!(Instruction::Move { dx: 10, dy: -3 }.to_string(), "m 10 -3");
        assert_eq!(Instruction::Elevate { dz: -2 }.to_string(), "z -2");
        assert_eq!(
            Instruction::SetPosition {
                axis: Axis::Y,
                value: 0.0
            }
            .to_string(),
            "syp 0"
        );
        assert_eq!(
            Instruction::Extrude {
                amount: 3.0,
                rate: None
            }
            .to_string(),
            "e 3"
        );
        assert_eq!(
            Instruction::Extrude {
                amount: 0.25,
                rate: Some(10.0)
            }
            .to_string(),
            "e 0.25 10"
        );
        assert_eq!(Instruction::Wait(500.0).to_string(), "w 500");
        assert_eq!(Instruction::LongWait(1.0).to_string(), "W 1");
    }

    #[test]
    fn test_statement_display() {
        let stmt = Statement::Instructions(vec![
            Instruction::Move { dx: 1, dy: 2 },
            Instruction::Extrude {
                amount: 1.0,
                rate: None,
            },
        ]);
        assert_eq!(stmt.to_string(), "m 1 2, e 1");
        assert_eq!(Statement::Comment("rect".into()).to_string(), "# rect");
    }

    #[test]
    fn test_format_number_negative_zero() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-12.5), "-12.5");
    }
}
