//! Command codes understood by the interpreter

use std::fmt;

use crate::block::Word;

/// A dispatched command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// G0
    Rapid,
    /// G1
    Linear,
    /// G2, not implemented
    ArcCw,
    /// G3, not implemented
    ArcCcw,
    /// G4
    Dwell,
    /// G28
    Home,
    /// G90
    Absolute,
    /// G91
    Relative,
    /// G92
    SetPosition,
    /// Any other G, M or T word
    Other(Word),
}

impl Command {
    pub fn from_word(word: &Word) -> Self {
        if word.letter != 'G' || word.value.fract() != 0.0 {
            return Command::Other(*word);
        }
        match word.value as i64 {
            0 => Command::Rapid,
            1 => Command::Linear,
            2 => Command::ArcCw,
            3 => Command::ArcCcw,
            4 => Command::Dwell,
            28 => Command::Home,
            90 => Command::Absolute,
            91 => Command::Relative,
            92 => Command::SetPosition,
            _ => Command::Other(*word),
        }
    }

    /// Motion commands persist on lines that only carry coordinates
    pub fn is_modal_motion(&self) -> bool {
        matches!(
            self,
            Command::Rapid | Command::Linear | Command::ArcCw | Command::ArcCcw
        )
    }

    /// G words that replace the interpreter's modal command
    ///
    /// G90/G91 only switch the distance mode and leave it in place.
    pub fn takes_modal_slot(&self) -> bool {
        match self {
            Command::Absolute | Command::Relative => false,
            Command::Other(word) => word.letter == 'G',
            _ => true,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Rapid => f.write_str("G0"),
            Command::Linear => f.write_str("G1"),
            Command::ArcCw => f.write_str("G2"),
            Command::ArcCcw => f.write_str("G3"),
            Command::Dwell => f.write_str("G4"),
            Command::Home => f.write_str("G28"),
            Command::Absolute => f.write_str("G90"),
            Command::Relative => f.write_str("G91"),
            Command::SetPosition => f.write_str("G92"),
            Command::Other(word) => write!(f, "{}", word),
        }
    }
}
