//! Errors raised while converting simple values between attribute text and
//! native scalars.
//!
//! - **`ValueErrorKind`** : the four failure classes, cheap to match on
//! - **`ValueError`**     : the error itself, carrying the offending text
//!   where there is one
//!
//! Parse failures (`Format`, `Overflow`) are the only kinds the tolerant
//! `try_parse` entry point swallows; the rest always reach the caller.

use thiserror::Error;

/// Failure classes for simple value operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueErrorKind {
    /// Text is not a syntactically valid literal for the native type.
    Format,
    /// Literal is well formed but outside the native type's range.
    Overflow,
    /// An absent source was handed to a copy operation.
    InvalidArgument,
    /// An absent or empty value was asked for its native form.
    InvalidOperation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("'{text}' is not a valid {target} literal")]
    Format { text: String, target: &'static str },

    #[error("'{text}' is outside the range of {target}")]
    Overflow { text: String, target: &'static str },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

impl ValueError {
    pub fn format(text: impl Into<String>, target: &'static str) -> Self {
        ValueError::Format {
            text: text.into(),
            target,
        }
    }

    pub fn overflow(text: impl Into<String>, target: &'static str) -> Self {
        ValueError::Overflow {
            text: text.into(),
            target,
        }
    }

    pub fn kind(&self) -> ValueErrorKind {
        match self {
            ValueError::Format { .. } => ValueErrorKind::Format,
            ValueError::Overflow { .. } => ValueErrorKind::Overflow,
            ValueError::InvalidArgument(_) => ValueErrorKind::InvalidArgument,
            ValueError::InvalidOperation(_) => ValueErrorKind::InvalidOperation,
        }
    }

    /// `true` for the kinds produced by decoding text.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self.kind(),
            ValueErrorKind::Format | ValueErrorKind::Overflow
        )
    }
}

impl PartialEq<ValueErrorKind> for ValueError {
    fn eq(&self, other: &ValueErrorKind) -> bool {
        self.kind() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_text_and_target() {
        let err = ValueError::format("abc", "Int64");
        assert_eq!(err.to_string(), "'abc' is not a valid Int64 literal");

        let err = ValueError::overflow("99999999999999999999", "Int64");
        assert_eq!(
            err.to_string(),
            "'99999999999999999999' is outside the range of Int64"
        );
    }

    #[test]
    fn parse_failures_are_classified() {
        assert!(ValueError::format("x", "Byte").is_parse_failure());
        assert!(ValueError::overflow("300", "Byte").is_parse_failure());
        assert!(!ValueError::InvalidArgument("source").is_parse_failure());
        assert_eq!(
            ValueError::InvalidOperation("empty"),
            ValueErrorKind::InvalidOperation
        );
    }
}
