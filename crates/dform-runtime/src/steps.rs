#![forbid(unsafe_code)]

//! Multi-step navigation over a mounted form.

use dform_core::{FormConfig, FormStep};
use dform_validation::ErrorMap;
use tracing::debug;

use crate::engine::FormEngine;

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepMove {
    /// Now on the step with this index.
    Moved(usize),
    /// The current step's fields failed validation.
    Blocked(ErrorMap),
    AtStart,
    AtEnd,
}

/// Tracks the current step of a [`FormEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepNavigator {
    steps: Vec<FormStep>,
    current: usize,
}

impl StepNavigator {
    #[must_use]
    pub fn new(steps: Vec<FormStep>) -> Self {
        Self { steps, current: 0 }
    }

    #[must_use]
    pub fn from_config(config: &FormConfig) -> Self {
        Self::new(config.steps.clone())
    }

    #[must_use]
    pub fn steps(&self) -> &[FormStep] {
        &self.steps
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_step(&self) -> Option<&FormStep> {
        self.steps.get(self.current)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    /// The current step's fields that `engine` currently shows.
    #[must_use]
    pub fn visible_fields<'a>(&'a self, engine: &FormEngine) -> Vec<&'a str> {
        self.current_step()
            .map(|step| {
                step.fields
                    .iter()
                    .map(String::as_str)
                    .filter(|name| engine.is_visible(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Advance one step.
    ///
    /// When the current step has `validate` set, its visible fields are
    /// validated first and a failure keeps the form on this step.
    pub fn next(&mut self, engine: &mut FormEngine) -> StepMove {
        if self.is_last() {
            return StepMove::AtEnd;
        }
        if let Some(step) = self.steps.get(self.current)
            && step.validate
            && let Err(errors) = engine.validate_fields(&step.fields)
        {
            debug!(step = self.current, errors = errors.len(), "step blocked");
            return StepMove::Blocked(errors);
        }
        self.current += 1;
        debug!(step = self.current, "moved to next step");
        StepMove::Moved(self.current)
    }

    /// Go back one step. Never validates.
    pub fn prev(&mut self) -> StepMove {
        if self.current == 0 {
            return StepMove::AtStart;
        }
        self.current -= 1;
        StepMove::Moved(self.current)
    }

    /// Return to the first step.
    pub fn restart(&mut self) {
        self.current = 0;
    }
}
