//! Line cleaning and field tokenizing
//!
//! A source line becomes a `Block`: its comments are removed, whitespace
//! collapsed, and the rest split into letter/number fields in source order.

use std::fmt;
use std::sync::OnceLock;

use plotpath_core::format_number;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GcodeError, Result};

/// Letters that name a command rather than a parameter
pub const COMMAND_LETTERS: [char; 3] = ['G', 'M', 'T'];

/// Remove `(...)` remarks and everything from `;` on
///
/// An unterminated `(` comments out the rest of the line.
pub fn strip_comments(line: &str) -> String {
    static REMARK_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex =
        REMARK_REGEX.get_or_init(|| Regex::new(r"\([^)]*\)").expect("invalid regex pattern"));
    let without_remarks = regex.replace_all(line, "");
    match without_remarks.find([';', '(']) {
        Some(pos) => without_remarks[..pos].to_string(),
        None => without_remarks.into_owned(),
    }
}

/// One letter/number field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub letter: char,
    pub value: f64,
}

impl Word {
    pub fn is_command(&self) -> bool {
        COMMAND_LETTERS.contains(&self.letter)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, format_number(self.value))
    }
}

/// The fields of one source line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based source line
    pub line_number: usize,
    /// Fields in source order, letters uppercased
    pub words: Vec<Word>,
}

impl Block {
    /// Split a comment-free line into fields
    pub fn parse(line_number: usize, cleaned: &str) -> Result<Self> {
        static FIELD_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = FIELD_REGEX.get_or_init(|| {
            Regex::new(r"([A-Za-z])([-+]?(?:\d+\.?\d*|\.\d+))?").expect("invalid regex pattern")
        });

        let compact: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();
        let mut words = Vec::new();
        let mut cursor = 0;

        for caps in regex.captures_iter(&compact) {
            let (Some(whole), Some(letter)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() != cursor {
                return Err(GcodeError::InvalidSyntax {
                    line_number,
                    reason: format!("unexpected '{}'", &compact[cursor..whole.start()]),
                });
            }
            // a bare letter is a flag, e.g. the axes of `G28 X Y`
            let value = match caps.get(2) {
                Some(number) => {
                    number
                        .as_str()
                        .parse::<f64>()
                        .map_err(|e| GcodeError::InvalidSyntax {
                            line_number,
                            reason: format!("bad number '{}': {}", number.as_str(), e),
                        })?
                }
                None => 0.0,
            };
            let letter = letter.as_str().chars().next().unwrap_or('?');
            words.push(Word {
                letter: letter.to_ascii_uppercase(),
                value,
            });
            cursor = whole.end();
        }

        if cursor != compact.len() {
            return Err(GcodeError::InvalidSyntax {
                line_number,
                reason: format!("unexpected '{}'", &compact[cursor..]),
            });
        }

        Ok(Self { line_number, words })
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Value of a field; a repeated letter yields its last occurrence
    pub fn get(&self, letter: char) -> Option<f64> {
        self.words
            .iter()
            .rev()
            .find(|w| w.letter == letter)
            .map(|w| w.value)
    }

    pub fn has(&self, letter: char) -> bool {
        self.words.iter().any(|w| w.letter == letter)
    }

    /// G/M/T words, in source order
    pub fn command_words(&self) -> impl Iterator<Item = &Word> {
        self.words.iter().filter(|w| w.is_command())
    }

    /// Whether any of X, Y, Z is present
    pub fn has_axis(&self) -> bool {
        self.has('X') || self.has('Y') || self.has('Z')
    }
}
