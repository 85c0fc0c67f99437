#![forbid(unsafe_code)]

//! dform public facade crate.
//!
//! Re-exports the descriptor model, the schema compiler and the form engine,
//! plus a prelude for day-to-day use.
//!
//! # Example
//!
//! ```rust
//! use dform::prelude::*;
//!
//! let config = FormConfig::from_json_str(r#"{
//!     "fields": [
//!         { "name": "age", "label": "Age", "type": "number", "min": 18, "max": 120 }
//!     ]
//! }"#)?;
//! let mut form = FormEngine::from_config(&config)?;
//! form.set_value("age", 15)?;
//! assert!(!form.validate());
//! assert_eq!(form.error("age").as_deref(), Some("Minimum value is 18"));
//! # Ok::<(), dform::Error>(())
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use dform_core::{
    ChoiceConstraints, ChoiceOption, ConditionalRule, ConfigError, DateConstraints,
    FieldDescriptor, FieldKind, FieldValue, FileConstraints, FileHandle, FormConfig, FormStep,
    MultiChoiceConstraints, NumericConstraints, Operator, TagConstraints, TagKey, TagList,
    TagOutcome, TextConstraints, ValidationRule, Values, VisibleSet, is_visible, visible_fields,
};

// --- Validation re-exports -------------------------------------------------

pub use dform_validation::{
    CompiledSchema, ErrorMap, Predicate, PredicateRegistry, SchemaCompiler, ValidationError,
    ValidationResult, Validator, compile,
};

// --- Runtime re-exports ----------------------------------------------------

pub use dform_runtime::{
    EngineConfig, FieldState, FileReadError, FileSource, FormEngine, FormEngineBuilder, Lifecycle,
    MemorySource, PreviewJob, PreviewReport, PreviewSlot, PreviewState, PreviewStore, StepMove,
    StepNavigator, SubmissionError, SubmissionEvent, SubmissionTrace, SubmitOutcome,
    SubmitRejected, SubmitTicket, SubmitToken,
};
#[cfg(feature = "logging")]
pub use dform_runtime::{LoggingError, init_logging};

// --- Errors ---------------------------------------------------------------

/// Top-level error for hosts that want one error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed configuration or a call naming an undeclared field.
    Config(ConfigError),
    /// A submission did not reach the callback.
    Rejected(SubmitRejected),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Rejected(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Rejected(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<SubmitRejected> for Error {
    fn from(err: SubmitRejected) -> Self {
        Self::Rejected(err)
    }
}

/// Standard result type for dform APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ConditionalRule, EngineConfig, Error, FieldDescriptor, FieldKind, FieldValue, FileHandle,
        FormConfig, FormEngine, FormStep, Lifecycle, Result, StepMove, StepNavigator,
        SubmissionError, SubmitOutcome, SubmitRejected, TagKey, TagOutcome, ValidationRule,
        Values,
    };

    pub use crate::{core, runtime, validation};
}

pub use dform_core as core;
pub use dform_runtime as runtime;
pub use dform_validation as validation;
