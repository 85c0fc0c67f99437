//! Runtime for dform: the form engine state machine, the submission
//! protocol, file previews and multi-step navigation.
//!
//! # Role in dform
//! `dform-runtime` owns the only mutable state in dform. It mounts a
//! descriptor list through `dform-validation`, tracks values, visibility
//! and errors, and drives the host's submit callback.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`engine`] | `FormEngine` and its builder |
//! | [`submission`] | Lifecycle, tokens and the submission trace |
//! | [`preview`] | Concurrent file previews with stale-write protection |
//! | [`steps`] | Multi-step navigation |
//! | [`config`] | Engine options |
//! | `logging` | `init_logging` (feature `logging`) |

#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod preview;
pub mod steps;
pub mod submission;

pub use config::EngineConfig;
pub use engine::{FieldState, FormEngine, FormEngineBuilder};
pub use error::{FileReadError, SubmissionError, SubmitRejected};
#[cfg(feature = "logging")]
pub use logging::{LOG_ENV, LoggingError, init_logging};
pub use preview::{
    FileSource, MemorySource, PreviewJob, PreviewReport, PreviewSlot, PreviewState, PreviewStore,
    data_url,
};
pub use steps::{StepMove, StepNavigator};
pub use submission::{
    Lifecycle, SubmissionEvent, SubmissionTrace, SubmitOutcome, SubmitTicket, SubmitToken,
};
