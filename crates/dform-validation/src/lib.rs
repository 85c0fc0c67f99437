//! Validation for dform: composable validators, the custom predicate
//! registry and the schema compiler that turns a descriptor list into a
//! reusable validator.
//!
//! # Example
//!
//! ```rust
//! use dform_core::{FieldDescriptor, FieldKind, Values};
//! use dform_validation::compile;
//!
//! let schema = compile(&[FieldDescriptor::new("country", "Country", FieldKind::select(["USA", "UK"]))])
//!     .unwrap();
//! let values: Values = [("country", "France")].into_iter().collect();
//! let errors = schema.validate(&values).unwrap_err();
//! assert_eq!(
//!     errors.message("country").as_deref(),
//!     Some("Invalid option. Expected one of: USA, UK")
//! );
//! ```

#![forbid(unsafe_code)]

pub mod compiler;
mod error_map;
pub mod predicates;
mod validators;

pub use compiler::{CompiledSchema, SchemaCompiler, compile};
pub use error_map::ErrorMap;
pub use predicates::{Predicate, PredicateRegistry};
pub use validators::{
    // Built-in validators
    Accept,
    AcceptEntry,
    // Composition
    All,
    Count,
    DateRange,
    // Error codes
    ERROR_CODE_COLOR,
    ERROR_CODE_CUSTOM,
    ERROR_CODE_DATE,
    ERROR_CODE_DATE_MAX,
    ERROR_CODE_DATE_MIN,
    ERROR_CODE_EMAIL,
    ERROR_CODE_FILE_COUNT,
    ERROR_CODE_FILE_SIZE,
    ERROR_CODE_FILE_TYPE,
    ERROR_CODE_MAX,
    ERROR_CODE_MAX_LENGTH,
    ERROR_CODE_MIN,
    ERROR_CODE_MIN_LENGTH,
    ERROR_CODE_OPTION,
    ERROR_CODE_PATTERN,
    ERROR_CODE_PHONE,
    ERROR_CODE_REQUIRED,
    ERROR_CODE_STEP,
    ERROR_CODE_TOO_FEW,
    ERROR_CODE_TOO_MANY,
    ERROR_CODE_TYPE,
    ERROR_CODE_URL,
    EachOneOf,
    Email,
    FileCount,
    HexColor,
    MaxFileSize,
    MaxLength,
    MinLength,
    MultipleOf,
    OneOf,
    Pattern,
    Phone,
    Range,
    Required,
    TemporalBound,
    TemporalKind,
    Url,
    // Core types
    ValidationError,
    ValidationResult,
    Validator,
    // Builder
    ValidatorBuilder,
};
