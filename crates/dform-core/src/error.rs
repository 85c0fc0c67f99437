#![forbid(unsafe_code)]

//! Configuration errors: malformed descriptor sets.
//!
//! These surface to the integrating developer at compile/mount time. Field
//! level problems caused by user input are never reported through this type.

use std::fmt;

/// A descriptor list (or a call naming a field) that cannot be honoured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    Parse(String),
    /// A descriptor has an empty `name`.
    EmptyName { index: usize },
    /// Two descriptors share a `name`.
    DuplicateName { name: String },
    /// A call or override referenced a field that is not declared.
    UnknownField { name: String },
    /// `showWhen` references a field that is not declared.
    UnknownDependency { field: String, depends_on: String },
    /// `showWhen` rules form a cycle. The path starts and ends on the same field.
    VisibilityCycle { path: Vec<String> },
    /// `pattern` is not a valid regular expression.
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },
    /// Contradictory or meaningless bounds (`min > max`, `step <= 0`, ...).
    InvalidBounds { field: String, detail: String },
    /// A date/time bound could not be parsed for the field's kind.
    InvalidDateBound { field: String, value: String },
    /// A kind-specific operation was called on a field of another kind.
    WrongKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid form configuration: {msg}"),
            Self::EmptyName { index } => write!(f, "field #{index} has an empty name"),
            Self::DuplicateName { name } => write!(f, "field name `{name}` is declared twice"),
            Self::UnknownField { name } => write!(f, "no field named `{name}`"),
            Self::UnknownDependency { field, depends_on } => write!(
                f,
                "field `{field}` is shown conditionally on unknown field `{depends_on}`"
            ),
            Self::VisibilityCycle { path } => {
                write!(f, "showWhen cycle: {}", path.join(" -> "))
            }
            Self::InvalidPattern {
                field,
                pattern,
                reason,
            } => write!(f, "field `{field}` has invalid pattern `{pattern}`: {reason}"),
            Self::InvalidBounds { field, detail } => {
                write!(f, "field `{field}` has invalid bounds: {detail}")
            }
            Self::InvalidDateBound { field, value } => {
                write!(f, "field `{field}` has unparsable date bound `{value}`")
            }
            Self::WrongKind {
                name,
                expected,
                actual,
            } => write!(f, "field `{name}` is `{actual}`, expected `{expected}`"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
