#![forbid(unsafe_code)]

//! Submission lifecycle with token-based staleness and an event trace.
//!
//! Every accepted submission is issued a [`SubmitToken`]. Tokens are strictly
//! monotonic per engine. A completion is applied only while its token is still
//! the current one; `reset()` retires the current token, so a callback that
//! settles after a reset is recorded as [`SubmissionEvent::StaleDiscarded`]
//! and changes nothing. Any other completion that matches no in-flight token
//! (a second completion, or a token never started) is recorded as
//! [`SubmissionEvent::Unmatched`].
//!
//! The trace carries no timestamps, so two runs that see the same sequence of
//! events produce the same [`SubmissionTrace::checksum`].

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use dform_core::Values;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// The engine's submission phase.
///
/// None of the phases is terminal: `Succeeded` and `Failed` accept further
/// edits and submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl Lifecycle {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SubmitToken
// ---------------------------------------------------------------------------

/// Identifies one submission attempt.
///
/// Token 0 is reserved for "none issued yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SubmitToken(u64);

impl SubmitToken {
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for SubmitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Submit({})", self.0)
    }
}

/// An accepted submission: the token to complete it with and the validated
/// values of the visible fields to hand to the callback.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    pub token: SubmitToken,
    pub values: Values,
}

/// How a callback-driven submission settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    Failed(crate::SubmissionError),
}

impl SubmitOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

// ---------------------------------------------------------------------------
// SubmissionEvent
// ---------------------------------------------------------------------------

/// One step of the submission audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    /// Validation passed and the callback is about to run.
    Started { token: SubmitToken, fields: usize },
    /// A submit arrived while `token` was still in flight.
    Rejected { token: SubmitToken },
    /// Validation failed; the callback was not invoked.
    Invalid { token: SubmitToken, errors: usize },
    Succeeded { token: SubmitToken },
    Failed { token: SubmitToken, message: String },
    /// A completion arrived for a token that `reset()` retired.
    StaleDiscarded {
        token: SubmitToken,
        current_token: SubmitToken,
    },
    /// A completion arrived for a token that was already settled or never
    /// started.
    Unmatched { token: SubmitToken },
}

impl SubmissionEvent {
    #[must_use]
    pub fn token(&self) -> SubmitToken {
        match self {
            Self::Started { token, .. }
            | Self::Rejected { token }
            | Self::Invalid { token, .. }
            | Self::Succeeded { token }
            | Self::Failed { token, .. }
            | Self::StaleDiscarded { token, .. }
            | Self::Unmatched { token } => *token,
        }
    }

    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Rejected { .. } => "rejected",
            Self::Invalid { .. } => "invalid",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::StaleDiscarded { .. } => "stale_discarded",
            Self::Unmatched { .. } => "unmatched",
        }
    }
}

impl Hash for SubmissionEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Started { token, fields } => {
                token.hash(state);
                fields.hash(state);
            }
            Self::Rejected { token } | Self::Succeeded { token } | Self::Unmatched { token } => {
                token.hash(state);
            }
            Self::Invalid { token, errors } => {
                token.hash(state);
                errors.hash(state);
            }
            Self::Failed { token, message } => {
                token.hash(state);
                message.hash(state);
            }
            Self::StaleDiscarded {
                token,
                current_token,
            } => {
                token.hash(state);
                current_token.hash(state);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SubmissionTrace
// ---------------------------------------------------------------------------

/// Ordered record of submission events.
///
/// With a non-zero `max_events` the oldest event is dropped once the trace is
/// full, and [`SubmissionTrace::dropped`] counts how many went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionTrace {
    events: Vec<SubmissionEvent>,
    max_events: usize,
    dropped: u64,
}

impl SubmissionTrace {
    /// An unbounded trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A trace holding at most `max_events` events (0 = unbounded).
    #[must_use]
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            max_events,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Events evicted to respect `max_events`.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn push(&mut self, event: SubmissionEvent) {
        if self.max_events > 0 && self.events.len() >= self.max_events {
            self.events.remove(0);
            self.dropped += 1;
        }
        self.events.push(event);
    }

    #[must_use]
    pub fn events(&self) -> &[SubmissionEvent] {
        &self.events
    }

    #[must_use]
    pub fn last(&self) -> Option<&SubmissionEvent> {
        self.events.last()
    }

    #[must_use]
    pub fn contains_event_type(&self, token: SubmitToken, event_type: &str) -> bool {
        self.events
            .iter()
            .any(|e| e.token() == token && e.event_type() == event_type)
    }

    #[must_use]
    pub fn events_for_token(&self, token: SubmitToken) -> Vec<&SubmissionEvent> {
        self.events.iter().filter(|e| e.token() == token).collect()
    }

    /// Order-sensitive hash of every event.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for event in &self.events {
            event.hash(&mut hasher);
        }
        hasher.finish()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }

    /// Check the trace for protocol violations. Empty means none.
    #[must_use]
    pub fn verify_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        // Issued tokens (Started or Invalid) increase strictly.
        let mut last_issued = SubmitToken::NONE;
        for event in &self.events {
            if let SubmissionEvent::Started { token, .. } | SubmissionEvent::Invalid { token, .. } =
                event
            {
                if *token <= last_issued {
                    violations.push(format!("Non-monotonic token: {token} after {last_issued}"));
                }
                last_issued = *token;
            }
        }

        // Each started token settles at most once.
        for event in &self.events {
            if let SubmissionEvent::Started { token, .. } = event {
                let settled = self
                    .events
                    .iter()
                    .filter(|e| {
                        e.token() == *token
                            && matches!(
                                e,
                                SubmissionEvent::Succeeded { .. }
                                    | SubmissionEvent::Failed { .. }
                                    | SubmissionEvent::StaleDiscarded { .. }
                            )
                    })
                    .count();
                if settled > 1 {
                    violations.push(format!("{token} settled {settled} times"));
                }
            }
        }

        for event in &self.events {
            if let SubmissionEvent::StaleDiscarded {
                token,
                current_token,
            } = event
                && token >= current_token
            {
                violations.push(format!(
                    "StaleDiscarded with non-stale token: {token} >= {current_token}"
                ));
            }
        }

        violations
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
