#![forbid(unsafe_code)]

//! Runtime errors. None of these escape the engine as a panic; they are
//! returned from the call that caused them or recorded for the renderer.

use std::fmt;

use dform_validation::ErrorMap;

/// The host's submit callback failed.
///
/// The engine keeps only the error's display text and never interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionError {
    message: String,
}

impl SubmissionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Capture any displayable error.
    #[must_use]
    pub fn from_display(error: &impl fmt::Display) -> Self {
        Self::new(error.to_string())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SubmissionError {}

/// Why a submission never reached the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejected {
    /// Another submission is still in flight.
    InFlight,
    /// Validation failed; the map is also stored on the engine.
    Invalid(ErrorMap),
}

impl SubmitRejected {
    /// The validation errors, when rejected for invalid input.
    #[must_use]
    pub fn errors(&self) -> Option<&ErrorMap> {
        match self {
            Self::InFlight => None,
            Self::Invalid(errors) => Some(errors),
        }
    }
}

impl fmt::Display for SubmitRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InFlight => f.write_str("a submission is already in flight"),
            Self::Invalid(errors) => write!(f, "{} field(s) failed validation", errors.len()),
        }
    }
}

impl std::error::Error for SubmitRejected {}

/// Reading one file for its preview failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReadError {
    pub file: String,
    pub reason: String,
}

impl FileReadError {
    #[must_use]
    pub fn new(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FileReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not read `{}`: {}", self.file, self.reason)
    }
}

impl std::error::Error for FileReadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_error_is_opaque_text() {
        let io = std::io::Error::other("503 Service Unavailable");
        let err = SubmissionError::from_display(&io);
        assert_eq!(err.message(), "503 Service Unavailable");
        assert_eq!(err.to_string(), "503 Service Unavailable");
    }

    #[test]
    fn rejected_display() {
        assert_eq!(
            SubmitRejected::InFlight.to_string(),
            "a submission is already in flight"
        );
        assert!(SubmitRejected::InFlight.errors().is_none());
        assert_eq!(
            SubmitRejected::Invalid(ErrorMap::new()).to_string(),
            "0 field(s) failed validation"
        );
    }

    #[test]
    fn file_read_display() {
        let err = FileReadError::new("a.png", "permission denied");
        assert_eq!(err.to_string(), "could not read `a.png`: permission denied");
    }
}
