//! Error kinds raised by the record model, filter engine and statistics engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BikeshareError {
    /// A raw record could not be turned into a [`crate::model::TripRecord`].
    #[error("parse error on line {line}, field `{field}`: {message}")]
    Parse {
        line: usize,
        field: &'static str,
        message: String,
    },

    /// A statistic that needs at least one trip was asked to run over none.
    #[error("cannot compute {statistic} over zero trips")]
    EmptyInput { statistic: &'static str },

    /// A filter value outside the canonical month/weekday sets.
    #[error("invalid {kind} filter `{value}`")]
    InvalidCriteria { kind: &'static str, value: String },
}

impl BikeshareError {
    pub(crate) fn parse(line: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            field,
            message: message.into(),
        }
    }

    /// Re-tags a parse error with the data line it came from.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Self::Parse { field, message, .. } => Self::Parse {
                line,
                field,
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = BikeshareError::parse(7, "Trip Duration", "not a number: abc");
        assert_eq!(
            err.to_string(),
            "parse error on line 7, field `Trip Duration`: not a number: abc"
        );
    }

    #[test]
    fn test_at_line_only_touches_parse_errors() {
        let err = BikeshareError::parse(0, "Start Time", "empty").at_line(12);
        assert!(matches!(err, BikeshareError::Parse { line: 12, .. }));

        let empty = BikeshareError::EmptyInput { statistic: "mean" }.at_line(12);
        assert_eq!(empty, BikeshareError::EmptyInput { statistic: "mean" });
    }
}
