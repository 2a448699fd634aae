//! SVG path-data grammar
//!
//! Tokenizes a `d` attribute and drives the emitter with one call per
//! command repetition. The active command persists across coordinate
//! groups, so `L 1 2 3 4` draws two lines. A move switches to line mode
//! (keeping its case) after its first coordinate pair.
//!
//! Coordinates are scaled and rounded to integers before they reach the
//! emitter. Elliptical arcs are rejected.

use plotpath_core::{PathEmitter, Point};
use tracing::trace;

use crate::error::{Result, SvgError};

/// One token of path data
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Command(char),
    Number(String),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Command(c) => c.to_string(),
            Token::Number(n) => n.clone(),
        }
    }
}

fn is_command_letter(ch: char) -> bool {
    matches!(
        ch,
        'M' | 'm'
            | 'L'
            | 'l'
            | 'H'
            | 'h'
            | 'V'
            | 'v'
            | 'C'
            | 'c'
            | 'S'
            | 's'
            | 'Q'
            | 'q'
            | 'T'
            | 't'
            | 'A'
            | 'a'
            | 'Z'
            | 'z'
    )
}

/// Split path data into command letters and number tokens
///
/// Command letters always stand alone. Whitespace and commas separate
/// numbers; anything else stays inside the current number token.
pub fn tokenize(data: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in data.chars() {
        if is_command_letter(ch) {
            if !current.is_empty() {
                tokens.push(Token::Number(std::mem::take(&mut current)));
            }
            tokens.push(Token::Command(ch));
        } else if ch == ',' || ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push(Token::Number(std::mem::take(&mut current)));
            }
        } else {
            current.push(ch);
        }
    }

    if !current.is_empty() {
        tokens.push(Token::Number(current));
    }

    tokens
}

/// Path data with letters isolated and separators collapsed to one space
pub fn normalize(data: &str) -> String {
    tokenize(data)
        .iter()
        .map(Token::text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Path command kind, case-independent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Move,
    Line,
    Horizontal,
    Vertical,
    Cubic,
    SmoothCubic,
    Quadratic,
    SmoothQuadratic,
    Arc,
    Close,
}

impl CommandKind {
    /// Numbers consumed by one repetition
    pub fn arity(&self) -> usize {
        match self {
            CommandKind::Move | CommandKind::Line => 2,
            CommandKind::Horizontal | CommandKind::Vertical => 1,
            CommandKind::Cubic => 6,
            CommandKind::SmoothCubic | CommandKind::Quadratic => 4,
            CommandKind::SmoothQuadratic => 2,
            CommandKind::Arc => 7,
            CommandKind::Close => 0,
        }
    }
}

/// A command letter: kind plus absolute/relative flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathCommand {
    pub kind: CommandKind,
    pub relative: bool,
}

impl PathCommand {
    pub fn from_letter(letter: char) -> Option<Self> {
        let kind = match letter.to_ascii_uppercase() {
            'M' => CommandKind::Move,
            'L' => CommandKind::Line,
            'H' => CommandKind::Horizontal,
            'V' => CommandKind::Vertical,
            'C' => CommandKind::Cubic,
            'S' => CommandKind::SmoothCubic,
            'Q' => CommandKind::Quadratic,
            'T' => CommandKind::SmoothQuadratic,
            'A' => CommandKind::Arc,
            'Z' => CommandKind::Close,
            _ => return None,
        };
        Some(Self {
            kind,
            relative: letter.is_ascii_lowercase(),
        })
    }

    pub fn letter(&self) -> char {
        let upper = match self.kind {
            CommandKind::Move => 'M',
            CommandKind::Line => 'L',
            CommandKind::Horizontal => 'H',
            CommandKind::Vertical => 'V',
            CommandKind::Cubic => 'C',
            CommandKind::SmoothCubic => 'S',
            CommandKind::Quadratic => 'Q',
            CommandKind::SmoothQuadratic => 'T',
            CommandKind::Arc => 'A',
            CommandKind::Close => 'Z',
        };
        if self.relative {
            upper.to_ascii_lowercase()
        } else {
            upper
        }
    }
}

/// Parse a coordinate token, scale it and round to device units
pub fn scaled(token: &str, scale: f64) -> Result<f64> {
    let value = token
        .parse::<f64>()
        .map(|v| (v * scale).round())
        .map_err(|_| SvgError::MalformedCoordinate {
            token: token.to_string(),
        })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SvgError::MalformedCoordinate {
            token: token.to_string(),
        })
    }
}

/// Path-data state machine
#[derive(Debug, Clone)]
pub struct SvgPathGrammar {
    scale: f64,
    mode: Option<PathCommand>,
    subpath_start: Option<Point>,
}

impl SvgPathGrammar {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            mode: None,
            subpath_start: None,
        }
    }

    /// Drive `emitter` with the commands in `data`
    ///
    /// Stops at the first error. The caller owns rollback of whatever was
    /// emitted before the error.
    pub fn parse(&mut self, emitter: &mut PathEmitter, data: &str) -> Result<()> {
        let tokens = tokenize(data);
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Command(letter) => {
                    let command = PathCommand::from_letter(*letter)
                        .ok_or(SvgError::UnsupportedPathCommand { command: *letter })?;
                    i += 1;
                    match command.kind {
                        CommandKind::Arc => {
                            return Err(SvgError::UnsupportedPathCommand { command: *letter });
                        }
                        CommandKind::Close => self.close(emitter)?,
                        _ => {}
                    }
                    self.mode = Some(command);
                }
                Token::Number(token) => {
                    let command = match self.mode {
                        Some(command) if command.kind != CommandKind::Close => command,
                        _ => {
                            return Err(SvgError::UnexpectedNumber {
                                token: token.clone(),
                            })
                        }
                    };
                    let values = self.take_values(&tokens[i..], command)?;
                    i += values.len();
                    self.apply(emitter, command, &values);
                }
            }
        }
        Ok(())
    }

    fn take_values(&self, tokens: &[Token], command: PathCommand) -> Result<Vec<f64>> {
        let arity = command.kind.arity();
        let available: Vec<&String> = tokens
            .iter()
            .take(arity)
            .map_while(|t| match t {
                Token::Number(n) => Some(n),
                Token::Command(_) => None,
            })
            .collect();
        if available.len() < arity {
            return Err(SvgError::MissingCoordinates {
                command: command.letter(),
                expected: arity,
                found: available.len(),
            });
        }
        available
            .into_iter()
            .map(|token| scaled(token, self.scale))
            .collect()
    }

    fn close(&mut self, emitter: &mut PathEmitter) -> Result<()> {
        let start = self.subpath_start.ok_or(SvgError::CloseBeforeMove)?;
        trace!(?start, "closing subpath");
        emitter.line_to(start.x, start.y).end();
        Ok(())
    }

    fn apply(&mut self, emitter: &mut PathEmitter, command: PathCommand, v: &[f64]) {
        let rel = command.relative;
        match command.kind {
            CommandKind::Move => {
                if rel {
                    emitter.move_by(v[0], v[1]).end();
                } else {
                    emitter.move_to(v[0], v[1]).end();
                }
                self.subpath_start = Some(emitter.position());
                self.mode = Some(PathCommand {
                    kind: CommandKind::Line,
                    relative: rel,
                });
            }
            CommandKind::Line => {
                if rel {
                    emitter.line_by(v[0], v[1]).end();
                } else {
                    emitter.line_to(v[0], v[1]).end();
                }
            }
            CommandKind::Horizontal => {
                if rel {
                    emitter.line_by(v[0], 0.0).end();
                } else {
                    let y = emitter.position().y;
                    emitter.line_to(v[0], y).end();
                }
            }
            CommandKind::Vertical => {
                if rel {
                    emitter.line_by(0.0, v[0]).end();
                } else {
                    let x = emitter.position().x;
                    emitter.line_to(x, v[0]).end();
                }
            }
            CommandKind::Cubic => {
                let (c1, c2, to) = (
                    Point::new(v[0], v[1]),
                    Point::new(v[2], v[3]),
                    Point::new(v[4], v[5]),
                );
                if rel {
                    emitter.curve_by(c1, c2, to).end();
                } else {
                    emitter.curve_to(c1, c2, to).end();
                }
            }
            CommandKind::SmoothCubic => {
                let (c2, to) = (Point::new(v[0], v[1]), Point::new(v[2], v[3]));
                if rel {
                    emitter.smooth_curve_by(c2, to).end();
                } else {
                    emitter.smooth_curve_to(c2, to).end();
                }
            }
            CommandKind::Quadratic => {
                let (ctrl, to) = (Point::new(v[0], v[1]), Point::new(v[2], v[3]));
                if rel {
                    emitter.quad_by(ctrl, to).end();
                } else {
                    emitter.quad_to(ctrl, to).end();
                }
            }
            CommandKind::SmoothQuadratic => {
                let to = Point::new(v[0], v[1]);
                if rel {
                    emitter.smooth_quad_by(to).end();
                } else {
                    emitter.smooth_quad_to(to).end();
                }
            }
            // rejected when the letter is read
            CommandKind::Arc | CommandKind::Close => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(data: &str, scale: f64) -> (Result<()>, Vec<String>) {
        let mut emitter = PathEmitter::default();
        let result = SvgPathGrammar::new(scale).parse(&mut emitter, data);
        let lines = emitter
            .code()
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        (result, lines)
    }

    #[test]
    fn test_tokenize_isolates_letters() {
        let tokens = tokenize("M10,20L30 40z");
        assert_eq!(
            tokens,
            vec![
                Token::Command('M'),
                Token::Number("10".into()),
                Token::Number("20".into()),
                Token::Command('L'),
                Token::Number("30".into()),
                Token::Number("40".into()),
                Token::Command('z'),
            ]
        );
    }

    #[test]
    fn test_tokenize_keeps_exponent() {
        assert_eq!(
            tokenize("1e-2"),
            vec![Token::Number("1e-2".into())]
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  M1,2 ,L 3,4Z "), "M 1 2 L 3 4 Z");
    }

    #[test]
    fn test_scaled_rounds() {
        assert_eq!(scaled("0.126", 100.0).unwrap(), 13.0);
        assert!(matches!(
            scaled("abc", 100.0),
            Err(SvgError::MalformedCoordinate { .. })
        ));
        assert!(scaled("inf", 1.0).is_err());
    }

    #[test]
    fn test_move_switches_to_line_mode() {
        let (result, lines) = run("M 0 0 1 0 1 1", 10.0);
        assert!(result.is_ok());
        assert_eq!(lines, vec!["m 10 0, e 5", "w 500", "m 0 10, e 5", "w 500"]);
    }

    #[test]
    fn test_relative_move_switches_to_relative_line() {
        let (result, lines) = run("m 1 1 1 0", 1.0);
        assert!(result.is_ok());
        assert_eq!(lines, vec!["m 1 1", "m 1 0, e 1", "w 500"]);
    }

    #[test]
    fn test_close_returns_to_subpath_start() {
        let (result, lines) = run("M 1 1 L 3 1 L 3 3 Z", 1.0);
        assert!(result.is_ok());
        assert_eq!(lines.last().map(String::as_str), Some("w 500"));
        assert_eq!(lines[lines.len() - 2], "m -2 -2, e 1");
    }

    #[test]
    fn test_horizontal_and_vertical() {
        let (result, lines) = run("M 0 0 H 4 V 2 h -4 v -2", 1.0);
        assert!(result.is_ok());
        let moves: Vec<&str> = lines
            .iter()
            .filter(|l| l.starts_with('m'))
            .map(String::as_str)
            .collect();
        assert_eq!(
            moves,
            vec!["m 4 0, e 2", "m 0 2, e 1", "m -4 0, e 2", "m 0 -2, e 1"]
        );
    }

    #[test]
    fn test_arc_is_unsupported() {
        let (result, _) = run("M 0 0 A 5 5 0 0 1 10 10", 1.0);
        assert_eq!(result, Err(SvgError::UnsupportedPathCommand { command: 'A' }));
    }

    #[test]
    fn test_close_before_move() {
        let (result, _) = run("z", 1.0);
        assert_eq!(result, Err(SvgError::CloseBeforeMove));
    }

    #[test]
    fn test_number_before_command() {
        let (result, _) = run("10 20", 1.0);
        assert!(matches!(result, Err(SvgError::UnexpectedNumber { .. })));
    }

    #[test]
    fn test_number_after_close() {
        let (result, _) = run("M 0 0 L 1 1 Z 5 5", 1.0);
        assert!(matches!(result, Err(SvgError::UnexpectedNumber { .. })));
    }

    #[test]
    fn test_truncated_cubic() {
        let (result, _) = run("M 0 0 C 1 1 2 2", 1.0);
        assert_eq!(
            result,
            Err(SvgError::MissingCoordinates {
                command: 'C',
                expected: 6,
                found: 4
            })
        );
    }

    #[test]
    fn test_malformed_coordinate() {
        let (result, _) = run("M 0 0 L 1 x", 1.0);
        assert_eq!(
            result,
            Err(SvgError::MalformedCoordinate { token: "x".into() })
        );
    }

    #[test]
    fn test_cubic_ends_at_endpoint() {
        let mut emitter = PathEmitter::default();
        SvgPathGrammar::new(1.0)
            .parse(&mut emitter, "M 0 0 C 0 100 100 100 100 0 S 200 -100 200 0")
            .unwrap();
        assert_eq!(emitter.position(), Point::new(200.0, 0.0));
        assert_eq!(emitter.device_position(), Point::new(200.0, 0.0));
        assert_eq!(emitter.last_control(), Some(Point::new(200.0, -100.0)));
        assert_eq!(emitter.code().matches("# curveTo").count(), 2);
    }

    #[test]
    fn test_quadratic_commands() {
        let mut emitter = PathEmitter::default();
        SvgPathGrammar::new(1.0)
            .parse(&mut emitter, "M 0 0 q 50 50 100 0 t 100 0")
            .unwrap();
        assert_eq!(emitter.position(), Point::new(200.0, 0.0));
        assert_eq!(emitter.last_control(), Some(Point::new(150.0, -50.0)));
        assert_eq!(emitter.code().matches("# quadTo").count(), 2);
    }

    #[test]
    fn test_command_letter_roundtrip() {
        for letter in "MmLlHhVvCcSsQqTtAaZz".chars() {
            let command = PathCommand::from_letter(letter).unwrap();
            assert_eq!(command.letter(), letter);
        }
        assert!(PathCommand::from_letter('x').is_none());
    }
}
