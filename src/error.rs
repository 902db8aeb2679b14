//! Error type shared by every operation of the crate.
//!
//! All failures are synchronous and terminal for the requested operation:
//! nothing returns a partial result alongside an error.

use std::fmt;
use std::ops::Range;

/// Error type for parsing, algebraic and automaton operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed text, with the offending character range.
    SyntaxError { position: Range<usize>, message: String },
    /// Operator not meaningful in the active format or context.
    UnsupportedOperator { position: Range<usize>, operator: String },
    /// Label outside the declared alphabet, or a reserved escape.
    BadLabel { label: String, reason: String },
    /// Operation between values of mismatched contexts, or a cast without embedding.
    IncompatibleContext { expected: String, found: String },
    /// The weightset lacks a property required by the operation.
    UnsupportedWeightset { operation: &'static str, weightset: String },
    /// A structural precondition (determinism, completeness, ...) is not met.
    PreconditionViolation { operation: &'static str, requirement: String },
    /// Epsilon-elimination met a spontaneous cycle whose weight has no star.
    InvalidEpsilonCycle { state: usize, weight: String },
    /// Polynomial left division has no valid quotient.
    NotDivisible { reason: String },
    /// `ambiguous_word` requested on an unambiguous automaton.
    Unambiguous,
    /// Star of a weight that is not starable in its semiring.
    NotStarable { weight: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn syntax(position: Range<usize>, message: impl Into<String>) -> Self {
        Error::SyntaxError {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn bad_label(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::BadLabel {
            label: label.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn incompatible(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Error::IncompatibleContext {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn precondition(operation: &'static str, requirement: impl Into<String>) -> Self {
        Error::PreconditionViolation {
            operation,
            requirement: requirement.into(),
        }
    }

    pub(crate) fn not_divisible(reason: impl Into<String>) -> Self {
        Error::NotDivisible { reason: reason.into() }
    }

    /// Shift the reported position by `offset` characters.
    ///
    /// Used when a sub-parser works on a slice of a larger input.
    pub(crate) fn shifted(self, offset: usize) -> Self {
        match self {
            Error::SyntaxError { position, message } => Error::SyntaxError {
                position: position.start + offset..position.end + offset,
                message,
            },
            Error::UnsupportedOperator { position, operator } => Error::UnsupportedOperator {
                position: position.start + offset..position.end + offset,
                operator,
            },
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SyntaxError { position, message } => {
                write!(f, "{}: syntax error: {}", show_range(position), message)
            }
            Error::UnsupportedOperator { position, operator } => {
                write!(f, "{}: unsupported operator: {}", show_range(position), operator)
            }
            Error::BadLabel { label, reason } => write!(f, "invalid label: {}: {}", label, reason),
            Error::IncompatibleContext { expected, found } => {
                write!(f, "incompatible contexts: expected {}, got {}", expected, found)
            }
            Error::UnsupportedWeightset { operation, weightset } => {
                write!(f, "{}: unsupported weightset: {}", operation, weightset)
            }
            Error::PreconditionViolation { operation, requirement } => {
                write!(f, "{}: {}", operation, requirement)
            }
            Error::InvalidEpsilonCycle { state, weight } => {
                write!(f, "proper: invalid spontaneous cycle on state {} (weight {})", state, weight)
            }
            Error::NotDivisible { reason } => write!(f, "ldiv: not divisible: {}", reason),
            Error::Unambiguous => write!(f, "automaton is unambiguous"),
            Error::NotStarable { weight } => write!(f, "star: invalid value: {}", weight),
        }
    }
}

impl std::error::Error for Error {}

/// Render a character range the way editors do: `1.3` or `1.3-5` (1-based).
fn show_range(position: &Range<usize>) -> String {
    if position.end <= position.start + 1 {
        format!("1.{}", position.start + 1)
    } else {
        format!("1.{}-{}", position.start + 1, position.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_positions() {
        let e = Error::UnsupportedOperator {
            position: 0..1,
            operator: "^".to_string(),
        };
        assert_eq!(e.to_string(), "1.1: unsupported operator: ^");

        let e = Error::UnsupportedOperator {
            position: 0..2,
            operator: "\\b".to_string(),
        };
        assert_eq!(e.to_string(), "1.1-2: unsupported operator: \\b");
    }

    #[test]
    fn test_shifted() {
        let e = Error::syntax(1..2, "unexpected").shifted(3);
        assert_eq!(e, Error::syntax(4..5, "unexpected"));
        assert_eq!(Error::Unambiguous.shifted(3), Error::Unambiguous);
    }
}
