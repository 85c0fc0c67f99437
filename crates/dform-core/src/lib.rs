//! Data model for dform: field descriptors, values, conditional visibility
//! and the tag-list control.
//!
//! # Role in dform
//! `dform-core` holds everything that is pure data or a pure function of
//! data. It has no notion of validation messages or of a running form; those
//! live in `dform-validation` and `dform-runtime`.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`descriptor`] | Closed set of field kinds and their constraints |
//! | [`value`] | Raw field values and the per-form value map |
//! | [`visibility`] | `showWhen` evaluation and dependency checks |
//! | [`tags`] | Tag-list editing state machine |
//! | [`config`] | Whole-form configuration document |
//! | [`error`] | Configuration errors |

#![forbid(unsafe_code)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod tags;
pub mod value;
pub mod visibility;

pub use config::{FormConfig, FormStep};
pub use descriptor::{
    ChoiceConstraints, ChoiceOption, ConditionalRule, DateConstraints, FieldDescriptor, FieldKind,
    FileConstraints, MultiChoiceConstraints, NumericConstraints, Operator, TagConstraints,
    TextConstraints, ValidationRule, check_names,
};
pub use error::ConfigError;
pub use tags::{TagKey, TagList, TagOutcome};
pub use value::{FieldValue, FileHandle, Values};
pub use visibility::{VisibleSet, check_dependencies, evaluate, is_visible, visible_fields};
