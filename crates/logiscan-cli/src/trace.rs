//! Keystroke trace format.
//!
//! One event per line, `<t_ms> <token>`:
//!
//! ```text
//! # scanner burst, 10 ms apart
//! 0 A
//! 10 B
//! 20 SPACE
//! 30 ENTER
//! 500 RESET
//! ```
//!
//! A token is a single character or one of `SPACE`, `ENTER`, `TAB` and
//! `RESET`. Blank lines and lines starting with `#` are ignored.

use logiscan_core::Millis;
use thiserror::Error;

/// What happened at one point of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceToken {
    /// A character keystroke.
    Key(char),

    /// Enter or Tab.
    Terminator,

    /// The capture was reset (screen change).
    Reset,
}

/// A timestamped trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    pub at: Millis,
    pub token: TraceToken,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraceError {
    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: usize, value: String },

    #[error("line {line}: missing token")]
    MissingToken { line: usize },

    #[error("line {line}: unknown token '{token}'")]
    UnknownToken { line: usize, token: String },
}

/// Parse a whole trace.
pub fn parse_trace(input: &str) -> Result<Vec<TraceEvent>, TraceError> {
    input
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                None
            } else {
                Some(parse_line(index + 1, line))
            }
        })
        .collect()
}

fn parse_line(line: usize, text: &str) -> Result<TraceEvent, TraceError> {
    let (time, token) = match text.split_once(char::is_whitespace) {
        Some((time, token)) => (time, token.trim()),
        None => (text, ""),
    };

    let at = time
        .parse::<Millis>()
        .map_err(|_| TraceError::InvalidTimestamp {
            line,
            value: time.to_string(),
        })?;

    if token.is_empty() {
        return Err(TraceError::MissingToken { line });
    }

    let token = match token {
        "SPACE" => TraceToken::Key(' '),
        "ENTER" | "TAB" => TraceToken::Terminator,
        "RESET" => TraceToken::Reset,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => TraceToken::Key(c),
                _ => {
                    return Err(TraceError::UnknownToken {
                        line,
                        token: other.to_string(),
                    });
                }
            }
        }
    };

    Ok(TraceEvent { at, token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_trace() {
        let trace = "# header\n\n0 A\n10 SPACE\n  20 #\n30 ENTER\n40 TAB\n50 RESET\n";

        let events = parse_trace(trace).unwrap();

        assert_eq!(
            events,
            vec![
                TraceEvent { at: 0, token: TraceToken::Key('A') },
                TraceEvent { at: 10, token: TraceToken::Key(' ') },
                TraceEvent { at: 20, token: TraceToken::Key('#') },
                TraceEvent { at: 30, token: TraceToken::Terminator },
                TraceEvent { at: 40, token: TraceToken::Terminator },
                TraceEvent { at: 50, token: TraceToken::Reset },
            ]
        );
    }

    #[test]
    fn test_parse_negative_timestamp() {
        let events = parse_trace("-5 x").unwrap();
        assert_eq!(events[0].at, -5);
    }

    #[rstest]
    #[case("abc A", TraceError::InvalidTimestamp { line: 1, value: "abc".into() })]
    #[case("10", TraceError::MissingToken { line: 1 })]
    #[case("10   ", TraceError::MissingToken { line: 1 })]
    #[case("10 ESC", TraceError::UnknownToken { line: 1, token: "ESC".into() })]
    fn test_parse_errors(#[case] trace: &str, #[case] expected: TraceError) {
        assert_eq!(parse_trace(trace), Err(expected));
    }

    #[test]
    fn test_error_reports_source_line() {
        let err = parse_trace("# comment\n0 A\nx B").unwrap_err();
        assert_eq!(err.to_string(), "line 3: invalid timestamp 'x'");
    }
}
