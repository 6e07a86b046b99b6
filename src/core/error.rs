//! Typed errors raised by the analytics engine
//!
//! Missing data is never an error: scores that cannot be computed come back
//! as `None`. The errors here cover malformed staging and values that fall
//! outside their clinical range.

use miette::Diagnostic;
use thiserror::Error;

/// A staging string could not be mapped onto a TNM triple
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum StageParseError {
    #[error("empty staging string")]
    #[diagnostic(
        code(srcc::stage::empty),
        help("provide a TNM string such as 'T3N1M0'")
    )]
    Empty,

    #[error("staging '{raw}' is too short ({len} characters after cleaning, need at least 6)")]
    #[diagnostic(
        code(srcc::stage::too_short),
        help("a complete staging names all three components, e.g. 'T2N0M0'")
    )]
    TooShort { raw: String, len: usize },

    #[error("unrecognized tumor category '{token}' in '{raw}'")]
    #[diagnostic(
        code(srcc::stage::tumor),
        help("valid tumor categories: T0, Tis, T1, T1a, T1b, T2, T3, T4, T4a, T4b, Tx")
    )]
    UnknownTumor { raw: String, token: String },

    #[error("unrecognized node category '{token}' in '{raw}'")]
    #[diagnostic(
        code(srcc::stage::node),
        help("valid node categories: N0, N1, N2, N3, N3a, N3b, Nx")
    )]
    UnknownNode { raw: String, token: String },

    #[error("unrecognized metastasis category '{token}' in '{raw}'")]
    #[diagnostic(
        code(srcc::stage::metastasis),
        help("valid metastasis categories: M0, M1, M1a, M1b, Mx")
    )]
    UnknownMetastasis { raw: String, token: String },
}

/// A case record holds a value the engine refuses to score
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum InputError {
    #[error("{field} = {value} is out of range (expected {expected})")]
    #[diagnostic(code(srcc::input::out_of_range))]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("{0}")]
    #[diagnostic(code(srcc::input::inconsistent))]
    Inconsistent(String),
}

impl InputError {
    pub(crate) fn out_of_range(field: &'static str, value: f64, expected: &'static str) -> Self {
        InputError::OutOfRange {
            field,
            value,
            expected,
        }
    }
}

/// Check that an optional value lies within an inclusive range
pub(crate) fn check_range(
    field: &'static str,
    value: Option<f64>,
    min: f64,
    max: f64,
    expected: &'static str,
) -> Result<(), InputError> {
    match value {
        Some(v) if !v.is_finite() || v < min || v > max => {
            Err(InputError::out_of_range(field, v, expected))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range_accepts_missing() {
        assert!(check_range("age", None, 0.0, 120.0, "0-120").is_ok());
    }

    #[test]
    fn test_check_range_bounds_inclusive() {
        assert!(check_range("ecog", Some(0.0), 0.0, 4.0, "0-4").is_ok());
        assert!(check_range("ecog", Some(4.0), 0.0, 4.0, "0-4").is_ok());
        let err = check_range("ecog", Some(7.0), 0.0, 4.0, "0-4").unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { field: "ecog", .. }));
    }

    #[test]
    fn test_check_range_rejects_nan() {
        assert!(check_range("bmi", Some(f64::NAN), 10.0, 60.0, "10-60").is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = StageParseError::TooShort {
            raw: "T3N1".into(),
            len: 4,
        };
        assert!(err.to_string().contains("too short"));
        let err = InputError::out_of_range("age", 130.0, "0-120");
        assert_eq!(err.to_string(), "age = 130 is out of range (expected 0-120)");
    }
}
