#![forbid(unsafe_code)]

//! The form engine: values, visibility, errors and the submission lifecycle.
//!
//! # State
//!
//! | Piece | Recomputed |
//! |-------|------------|
//! | values | on every edit |
//! | visible fields | from scratch on every edit |
//! | errors | wholesale by `validate`/`submit`, per field by `blur` |
//! | lifecycle | by `submit`/`reset` |
//!
//! Hidden fields are excluded from validation entirely and from the values
//! handed to the submit callback. Hiding a field also drops its error.
//!
//! # Example
//!
//! ```rust
//! use dform_core::{ConditionalRule, FieldDescriptor, FieldKind, Values};
//! use dform_runtime::{FormEngine, Lifecycle};
//!
//! let mut form = FormEngine::mount(
//!     vec![
//!         FieldDescriptor::new("hasExperience", "Experience?", FieldKind::radio(["Yes", "No"])),
//!         FieldDescriptor::new("years", "Years", FieldKind::number())
//!             .show_when(ConditionalRule::equals("hasExperience", "Yes")),
//!     ],
//!     Values::new(),
//! )
//! .unwrap();
//! form.set_value("hasExperience", "No").unwrap();
//! assert!(!form.is_visible("years"));
//!
//! let outcome = pollster::block_on(form.submit(|values| async move {
//!     assert!(!values.contains("years"));
//!     Ok::<(), String>(())
//! }));
//! assert!(outcome.unwrap().is_success());
//! assert_eq!(form.lifecycle(), Lifecycle::Succeeded);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dform_core::{
    ConfigError, FieldDescriptor, FieldKind, FieldValue, FileHandle, FormConfig, TagKey, TagList,
    TagOutcome, Values, VisibleSet, visible_fields,
};
use dform_validation::{CompiledSchema, ErrorMap, PredicateRegistry, SchemaCompiler};
use tracing::{Instrument, debug, info, info_span, trace, warn};
use web_time::Instant;

use crate::config::EngineConfig;
use crate::error::{SubmissionError, SubmitRejected};
use crate::preview::{PreviewJob, PreviewSlot, PreviewStore};
use crate::submission::{
    Lifecycle, SubmissionEvent, SubmissionTrace, SubmitOutcome, SubmitTicket, SubmitToken,
};

// ---------------------------------------------------------------------------
// FieldState
// ---------------------------------------------------------------------------

/// What a renderer needs to draw one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState<'a> {
    pub descriptor: &'a FieldDescriptor,
    pub value: &'a FieldValue,
    pub error: Option<String>,
    pub visible: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub touched: bool,
    pub dirty: bool,
}

impl FieldState<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and mounts a [`FormEngine`].
#[derive(Debug)]
#[must_use]
pub struct FormEngineBuilder {
    fields: Vec<FieldDescriptor>,
    overrides: Values,
    config: EngineConfig,
    compiler: SchemaCompiler,
}

impl FormEngineBuilder {
    /// Caller-supplied values that win over descriptor defaults.
    pub fn defaults(mut self, overrides: Values) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn compiler(mut self, compiler: SchemaCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Shorthand for a compiler using `registry`.
    pub fn registry(mut self, registry: PredicateRegistry) -> Self {
        self.compiler = SchemaCompiler::with_registry(registry);
        self
    }

    /// Compile the descriptors and mount the form.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] the schema compiler reports.
    pub fn build(self) -> Result<FormEngine, ConfigError> {
        let schema = Arc::new(self.compiler.compile(&self.fields)?);

        let mut initial = Values::new();
        for field in &self.fields {
            if let Some(value) = &field.default_value {
                initial.set(field.name.clone(), value.clone());
            }
        }
        for (name, value) in self.overrides.iter() {
            if schema.contains(name) {
                initial.set(name, value.clone());
            } else {
                warn!(field = name, "default override names an undeclared field; dropped");
            }
        }

        let mut tags = BTreeMap::new();
        for field in &self.fields {
            if let FieldKind::Tags(constraints) = &field.kind {
                let mut list = TagList::from_constraints(constraints);
                if let Some(value) = sync_tags(&mut list, initial.get(&field.name)) {
                    initial.set(field.name.clone(), value);
                }
                tags.insert(field.name.clone(), list);
            }
        }

        let visible = visible_fields(&self.fields, &initial);
        info!(
            fields = self.fields.len(),
            visible = visible.len(),
            "form mounted"
        );

        Ok(FormEngine {
            fields: self.fields,
            schema,
            config: self.config,
            values: initial.clone(),
            initial,
            errors: ErrorMap::new(),
            visible,
            lifecycle: Lifecycle::Idle,
            touched: BTreeSet::new(),
            tags,
            issued: SubmitToken::NONE,
            in_flight: None,
            retired: BTreeSet::new(),
            trace: SubmissionTrace::with_max_events(self.config.trace_capacity),
            last_error: None,
            previews: PreviewStore::new(),
        })
    }
}

/// Load `value` into `list` and, when `value` is a list, return the tags as
/// the list holds them (trimmed, without blanks or duplicates). Any other
/// value empties the list.
fn sync_tags(list: &mut TagList, value: &FieldValue) -> Option<FieldValue> {
    list.set_tags(value.as_list().unwrap_or_default());
    value
        .as_list()
        .map(|_| FieldValue::List(list.tags().to_vec()))
}

// ---------------------------------------------------------------------------
// FormEngine
// ---------------------------------------------------------------------------

/// A mounted form.
///
/// All mutation goes through `&mut self`, so one engine is never edited and
/// submitted at the same time. Dropping the engine closes its preview store;
/// preview jobs still running afterwards write nothing.
#[derive(Debug)]
pub struct FormEngine {
    fields: Vec<FieldDescriptor>,
    schema: Arc<CompiledSchema>,
    config: EngineConfig,
    initial: Values,
    values: Values,
    errors: ErrorMap,
    visible: VisibleSet,
    lifecycle: Lifecycle,
    touched: BTreeSet<String>,
    tags: BTreeMap<String, TagList>,
    /// Last token handed out; also bumped by `reset` to retire the in-flight one.
    issued: SubmitToken,
    in_flight: Option<SubmitToken>,
    /// Tokens retired by `reset` whose completion has not arrived yet.
    retired: BTreeSet<SubmitToken>,
    trace: SubmissionTrace,
    last_error: Option<SubmissionError>,
    previews: PreviewStore,
}

impl FormEngine {
    /// Start configuring an engine for `fields`.
    pub fn builder(fields: Vec<FieldDescriptor>) -> FormEngineBuilder {
        FormEngineBuilder {
            fields,
            overrides: Values::new(),
            config: EngineConfig::default(),
            compiler: SchemaCompiler::new(),
        }
    }

    /// Mount with default options. `overrides` win over descriptor defaults.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] the schema compiler reports.
    pub fn mount(fields: Vec<FieldDescriptor>, overrides: Values) -> Result<Self, ConfigError> {
        Self::builder(fields).defaults(overrides).build()
    }

    /// Mount a parsed configuration document.
    ///
    /// # Errors
    ///
    /// Step lists naming undeclared fields, plus anything [`FormEngine::mount`] rejects.
    pub fn from_config(config: &FormConfig) -> Result<Self, ConfigError> {
        config.check()?;
        Self::mount(config.fields.clone(), config.default_values.clone())
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.schema
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    #[must_use]
    pub fn values(&self) -> &Values {
        &self.values
    }

    #[must_use]
    pub fn value(&self, name: &str) -> &FieldValue {
        self.values.get(name)
    }

    #[must_use]
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    /// The formatted error message for `name`, if any.
    #[must_use]
    pub fn error(&self, name: &str) -> Option<String> {
        self.errors.message(name)
    }

    #[must_use]
    pub fn visible_fields(&self) -> &VisibleSet {
        &self.visible
    }

    #[must_use]
    pub fn is_visible(&self, name: &str) -> bool {
        self.visible.contains(name)
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The error of the last failed submit callback.
    #[must_use]
    pub fn last_error(&self) -> Option<&SubmissionError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn submission_trace(&self) -> &SubmissionTrace {
        &self.trace
    }

    #[must_use]
    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.contains(name)
    }

    /// Whether `name`'s value differs from its mount-time value.
    #[must_use]
    pub fn is_dirty(&self, name: &str) -> bool {
        self.values.get(name) != self.initial.get(name)
    }

    /// No field differs from its mount-time value.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.fields.iter().all(|f| !self.is_dirty(&f.name))
    }

    /// Render state for `name`.
    #[must_use]
    pub fn field_state(&self, name: &str) -> Option<FieldState<'_>> {
        self.field(name).map(|descriptor| self.state_of(descriptor))
    }

    /// Render state for every field, in declaration order.
    #[must_use]
    pub fn field_states(&self) -> Vec<FieldState<'_>> {
        self.fields.iter().map(|f| self.state_of(f)).collect()
    }

    fn state_of<'a>(&'a self, descriptor: &'a FieldDescriptor) -> FieldState<'a> {
        let name = descriptor.name.as_str();
        FieldState {
            descriptor,
            value: self.values.get(name),
            error: self.errors.message(name),
            visible: self.is_visible(name),
            disabled: descriptor.disabled,
            read_only: descriptor.read_only,
            touched: self.is_touched(name),
            dirty: self.is_dirty(name),
        }
    }

    // -- Editing ------------------------------------------------------------

    fn require(&self, name: &str) -> Result<&FieldDescriptor, ConfigError> {
        self.field(name).ok_or_else(|| ConfigError::UnknownField {
            name: name.to_string(),
        })
    }

    /// Record a new value for `name` and recompute visibility.
    ///
    /// The lifecycle is unchanged. The field's error is kept unless
    /// [`EngineConfig::clear_error_on_change`] is set.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownField`] when `name` is not declared.
    pub fn set_value(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), ConfigError> {
        self.require(name)?;
        let mut value = value.into();
        if let Some(list) = self.tags.get_mut(name)
            && let Some(normalized) = sync_tags(list, &value)
        {
            value = normalized;
        }
        self.store(name, value);
        Ok(())
    }

    fn store(&mut self, name: &str, value: FieldValue) {
        trace!(field = name, kind = value.type_name(), "value changed");
        self.values.set(name, value);
        if self.config.clear_error_on_change {
            self.errors.remove(name);
        }
        self.refresh_visibility();
    }

    fn refresh_visibility(&mut self) {
        let visible = visible_fields(&self.fields, &self.values);
        if visible != self.visible {
            debug!(
                before = self.visible.len(),
                after = visible.len(),
                "visible fields changed"
            );
            self.errors.retain(|name| visible.contains(name));
            self.visible = visible;
        }
    }

    // -- Tags ---------------------------------------------------------------

    #[must_use]
    pub fn tag_list(&self, name: &str) -> Option<&TagList> {
        self.tags.get(name)
    }

    /// Run `edit` against `name`'s tag list, writing the tags back as the
    /// field value when they changed.
    fn edit_tags<R>(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut TagList) -> R,
    ) -> Result<R, ConfigError> {
        let kind = self.require(name)?.kind.type_name();
        let Some(list) = self.tags.get_mut(name) else {
            return Err(ConfigError::WrongKind {
                name: name.to_string(),
                expected: "tags",
                actual: kind,
            });
        };
        let before = list.tags().to_vec();
        let result = edit(list);
        if list.tags() != before.as_slice() {
            let tags = list.tags().to_vec();
            self.store(name, FieldValue::List(tags));
        }
        Ok(result)
    }

    /// Add a tag to a `tags` field. Dropped adds leave the value unchanged.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownField`] or [`ConfigError::WrongKind`].
    pub fn add_tag(&mut self, name: &str, raw: &str) -> Result<TagOutcome, ConfigError> {
        self.edit_tags(name, |list| list.add_tag(raw))
    }

    /// Remove a tag, returning whether it was present.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownField`] or [`ConfigError::WrongKind`].
    pub fn remove_tag(&mut self, name: &str, value: &str) -> Result<bool, ConfigError> {
        self.edit_tags(name, |list| list.remove_tag(value))
    }

    /// Replace the tag input text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownField`] or [`ConfigError::WrongKind`].
    pub fn set_tag_input(&mut self, name: &str, text: &str) -> Result<(), ConfigError> {
        self.edit_tags(name, |list| list.set_input(text))
    }

    /// Apply one key press to a tag field.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownField`] or [`ConfigError::WrongKind`].
    pub fn handle_tag_key(&mut self, name: &str, key: TagKey) -> Result<Option<TagOutcome>, ConfigError> {
        self.edit_tags(name, |list| list.handle_key(key))
    }

    /// Commit a filtered suggestion.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownField`] or [`ConfigError::WrongKind`].
    pub fn select_tag_suggestion(
        &mut self,
        name: &str,
        index: usize,
    ) -> Result<Option<TagOutcome>, ConfigError> {
        self.edit_tags(name, |list| list.select_suggestion(index))
    }

    // -- Files --------------------------------------------------------------

    /// Set a `file` field's selection.
    ///
    /// Returns a preview job when the descriptor asks for previews. Running
    /// it fills [`FormEngine::previews`]; a later selection, `reset` or drop
    /// makes it write nothing.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownField`] or [`ConfigError::WrongKind`].
    pub fn select_files(
        &mut self,
        name: &str,
        files: Vec<FileHandle>,
    ) -> Result<Option<PreviewJob>, ConfigError> {
        let descriptor = self.require(name)?;
        let FieldKind::File(constraints) = &descriptor.kind else {
            return Err(ConfigError::WrongKind {
                name: name.to_string(),
                expected: "file",
                actual: descriptor.kind.type_name(),
            });
        };
        let (multiple, preview) = (constraints.multiple, constraints.preview);

        let job = if preview {
            Some(
                self.previews
                    .begin(name, &files, self.config.preview_images_only),
            )
        } else {
            self.previews.clear_field(name);
            None
        };

        let value = match files.len() {
            0 => FieldValue::Empty,
            1 if !multiple => files.into_iter().next().map_or(FieldValue::Empty, FieldValue::File),
            _ => FieldValue::Files(files),
        };
        self.store(name, value);
        Ok(job)
    }

    /// Snapshot of `name`'s preview slots.
    #[must_use]
    pub fn previews(&self, name: &str) -> Vec<PreviewSlot> {
        self.previews.previews(name)
    }

    /// Shared handle to the preview store.
    #[must_use]
    pub fn preview_store(&self) -> &PreviewStore {
        &self.previews
    }

    // -- Validation ---------------------------------------------------------

    /// Validate every visible field, replacing the error map.
    pub fn validate(&mut self) -> bool {
        match self.schema.validate_visible(&self.values, &self.visible) {
            Ok(_) => {
                self.errors.clear();
                true
            }
            Err(errors) => {
                self.errors = errors;
                false
            }
        }
    }

    /// Validate only the visible fields among `names`.
    ///
    /// Errors for those fields are replaced; other entries are kept.
    ///
    /// # Errors
    ///
    /// The errors found among `names`.
    pub fn validate_fields<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), ErrorMap> {
        let wanted: BTreeSet<&str> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| self.visible.contains(*n))
            .collect();
        let result = self
            .schema
            .validate_where(&self.values, |name| wanted.contains(name));
        for name in names {
            self.errors.remove(name.as_ref());
        }
        match result {
            Ok(_) => Ok(()),
            Err(errors) => {
                for (name, error) in errors.iter() {
                    self.errors.insert(name, error.clone());
                }
                Err(errors)
            }
        }
    }

    /// Mark `name` touched and revalidate it alone.
    ///
    /// Hidden fields are never validated. Returns whether the field passes.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownField`] when `name` is not declared.
    pub fn blur(&mut self, name: &str) -> Result<bool, ConfigError> {
        self.require(name)?;
        self.touched.insert(name.to_string());
        if !self.is_visible(name) {
            self.errors.remove(name);
            return Ok(true);
        }
        let result = self
            .schema
            .validate_field(name, self.values.get(name))
            .unwrap_or_default();
        match result.error() {
            Some(error) => {
                self.errors.insert(name, error.clone());
                Ok(false)
            }
            None => {
                self.errors.remove(name);
                Ok(true)
            }
        }
    }

    // -- Submission ---------------------------------------------------------

    /// First half of a submission: validate and issue a ticket.
    ///
    /// On success the lifecycle is `Submitting` until
    /// [`FormEngine::complete_submit`] is called with the ticket's token.
    ///
    /// # Errors
    ///
    /// [`SubmitRejected::InFlight`] while another ticket is outstanding
    /// (state untouched); [`SubmitRejected::Invalid`] when validation fails
    /// (lifecycle `Failed`, errors stored).
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitRejected> {
        if let Some(token) = self.in_flight {
            warn!(%token, "submit rejected: already in flight");
            self.trace.push(SubmissionEvent::Rejected { token });
            return Err(SubmitRejected::InFlight);
        }

        self.issued = self.issued.next();
        let token = self.issued;
        self.lifecycle = Lifecycle::Submitting;
        self.last_error = None;

        match self.schema.validate_visible(&self.values, &self.visible) {
            Ok(values) => {
                self.errors.clear();
                self.in_flight = Some(token);
                self.trace.push(SubmissionEvent::Started {
                    token,
                    fields: values.len(),
                });
                debug!(%token, fields = values.len(), "submission started");
                Ok(SubmitTicket { token, values })
            }
            Err(errors) => {
                info!(%token, errors = errors.len(), "submission blocked by validation");
                self.trace.push(SubmissionEvent::Invalid {
                    token,
                    errors: errors.len(),
                });
                self.errors = errors.clone();
                self.lifecycle = Lifecycle::Failed;
                Err(SubmitRejected::Invalid(errors))
            }
        }
    }

    /// Second half of a submission: record the callback's result.
    ///
    /// Returns `false`, changing nothing, when `token` is not the one in
    /// flight (for example after a `reset`).
    pub fn complete_submit(&mut self, token: SubmitToken, result: Result<(), SubmissionError>) -> bool {
        if self.in_flight != Some(token) {
            if self.retired.remove(&token) {
                debug!(%token, current = %self.issued, "stale submission result discarded");
                self.trace.push(SubmissionEvent::StaleDiscarded {
                    token,
                    current_token: self.issued,
                });
            } else {
                warn!(%token, "submission result matches no in-flight submission");
                self.trace.push(SubmissionEvent::Unmatched { token });
            }
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(()) => {
                info!(%token, "submission succeeded");
                self.trace.push(SubmissionEvent::Succeeded { token });
                self.lifecycle = Lifecycle::Succeeded;
            }
            Err(error) => {
                warn!(%token, error = %error, "submission failed");
                self.trace.push(SubmissionEvent::Failed {
                    token,
                    message: error.message().to_string(),
                });
                self.lifecycle = Lifecycle::Failed;
                self.last_error = Some(error);
            }
        }
        true
    }

    /// Validate, then hand the visible values to `handler` and await it.
    ///
    /// `handler` is invoked at most once, and only with values that passed
    /// validation. Its error is kept as opaque text and never retried.
    ///
    /// # Errors
    ///
    /// [`SubmitRejected`] when the handler was not invoked.
    pub async fn submit<F, Fut, E>(&mut self, handler: F) -> Result<SubmitOutcome, SubmitRejected>
    where
        F: FnOnce(Values) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        let ticket = self.begin_submit()?;
        let token = ticket.token;
        let span = info_span!("submit", token = token.raw());
        let started = Instant::now();
        let result = handler(ticket.values)
            .instrument(span)
            .await
            .map_err(|e| SubmissionError::from_display(&e));
        debug!(
            %token,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "submit handler settled"
        );
        let outcome = match &result {
            Ok(()) => SubmitOutcome::Succeeded,
            Err(error) => SubmitOutcome::Failed(error.clone()),
        };
        self.complete_submit(token, result);
        Ok(outcome)
    }

    /// Restore mount-time values and return to `Idle`.
    ///
    /// Clears errors, touched flags and previews. An outstanding ticket
    /// becomes stale.
    pub fn reset(&mut self) {
        if let Some(token) = self.in_flight.take() {
            self.retired.insert(token);
            self.issued = self.issued.next();
            debug!(%token, "in-flight submission retired by reset");
        }
        self.values = self.initial.clone();
        for (name, list) in &mut self.tags {
            list.clear();
            sync_tags(list, self.initial.get(name));
        }
        self.errors.clear();
        self.touched.clear();
        self.last_error = None;
        self.lifecycle = Lifecycle::Idle;
        self.previews.clear();
        self.visible = visible_fields(&self.fields, &self.values);
        info!("form reset");
    }
}

impl Drop for FormEngine {
    fn drop(&mut self) {
        self.previews.close();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use dform_core::{ConditionalRule, FileConstraints, TagConstraints};
    use dform_validation::ERROR_CODE_REQUIRED;

    use crate::preview::MemorySource;

    fn profile() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("name", "Name", FieldKind::text()),
            FieldDescriptor::new("age", "Age", FieldKind::number_between(18.0, 120.0)),
            FieldDescriptor::new("hasExperience", "Experience?", FieldKind::radio(["Yes", "No"])),
            FieldDescriptor::new("years", "Years", FieldKind::number())
                .show_when(ConditionalRule::equals("hasExperience", "Yes")),
        ]
    }

    fn mount(fields: Vec<FieldDescriptor>) -> FormEngine {
        FormEngine::mount(fields, Values::new()).unwrap()
    }

    #[test]
    fn mount_merges_defaults_and_overrides() {
        let fields = vec![
            FieldDescriptor::new("a", "A", FieldKind::text()).with_default("from-descriptor"),
            FieldDescriptor::new("b", "B", FieldKind::text()).with_default("keep"),
        ];
        let overrides: Values = [("a", "override"), ("ghost", "dropped")].into_iter().collect();
        let form = FormEngine::mount(fields, overrides).unwrap();
        assert_eq!(form.value("a"), &FieldValue::from("override"));
        assert_eq!(form.value("b"), &FieldValue::from("keep"));
        assert!(!form.values().contains("ghost"));
        assert_eq!(form.lifecycle(), Lifecycle::Idle);
        assert!(form.errors().is_empty());
        assert!(form.is_pristine());
    }

    #[test]
    fn mount_rejects_bad_config() {
        let dup = vec![
            FieldDescriptor::new("a", "A", FieldKind::text()),
            FieldDescriptor::new("a", "A2", FieldKind::text()),
        ];
        assert!(matches!(
            FormEngine::mount(dup, Values::new()),
            Err(ConfigError::DuplicateName { .. })
        ));
    }

    #[test]
    fn set_value_recomputes_visibility() {
        let mut form = mount(profile());
        assert!(!form.is_visible("years"));
        form.set_value("hasExperience", "Yes").unwrap();
        assert!(form.is_visible("years"));
        form.set_value("hasExperience", "No").unwrap();
        assert!(!form.is_visible("years"));
        assert_eq!(form.lifecycle(), Lifecycle::Idle);
    }

    #[test]
    fn set_value_unknown_field() {
        let mut form = mount(profile());
        assert_eq!(
            form.set_value("nope", 1),
            Err(ConfigError::UnknownField { name: "nope".into() })
        );
    }

    #[test]
    fn errors_survive_edits_by_default() {
        let mut form = mount(profile());
        assert!(!form.validate());
        assert!(form.error("name").is_some());
        form.set_value("name", "Ada").unwrap();
        assert_eq!(form.error("name").as_deref(), Some("Name is required"));
    }

    #[test]
    fn clear_error_on_change_option() {
        let mut form = FormEngine::builder(profile())
            .config(EngineConfig::new().clear_error_on_change(true))
            .build()
            .unwrap();
        form.validate();
        form.set_value("name", "Ada").unwrap();
        assert!(form.error("name").is_none());
        assert!(form.error("age").is_some());
    }

    #[test]
    fn hiding_a_field_drops_its_error() {
        let mut form = mount(profile());
        form.set_value("hasExperience", "Yes").unwrap();
        form.validate();
        assert!(form.errors().contains("years"));
        form.set_value("hasExperience", "No").unwrap();
        assert!(!form.errors().contains("years"));
    }

    #[test]
    fn validate_excludes_hidden_fields() {
        let mut form = mount(profile());
        form.set_value("name", "Ada").unwrap();
        form.set_value("age", 30).unwrap();
        form.set_value("hasExperience", "No").unwrap();
        assert!(form.validate());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn blur_validates_single_field() {
        let mut form = mount(profile());
        assert!(!form.blur("name").unwrap());
        assert!(form.is_touched("name"));
        assert_eq!(
            form.errors().get("name").map(|e| e.code),
            Some(ERROR_CODE_REQUIRED)
        );
        assert!(!form.errors().contains("age"));

        form.set_value("name", "Ada").unwrap();
        assert!(form.blur("name").unwrap());
        assert!(form.errors().is_empty());

        assert!(form.blur("years").unwrap());
        assert!(form.blur("ghost").is_err());
    }

    #[test]
    fn validate_fields_merges() {
        let mut form = mount(profile());
        form.validate();
        form.set_value("name", "Ada").unwrap();
        assert!(form.validate_fields(&["name"]).is_ok());
        assert!(!form.errors().contains("name"));
        assert!(form.errors().contains("age"));

        let errors = form.validate_fields(&["age", "years"]).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn dirty_tracking() {
        let mut form = mount(profile());
        form.set_value("name", "Ada").unwrap();
        assert!(form.is_dirty("name"));
        assert!(!form.is_dirty("age"));
        assert!(!form.is_pristine());
        let state = form.field_state("name").unwrap();
        assert!(state.dirty && state.visible && !state.touched);
        assert_eq!(state.name(), "name");
        assert_eq!(form.field_states().len(), 4);
    }

    #[test]
    fn submit_invalid_never_calls_handler() {
        let mut form = mount(profile());
        form.set_value("name", "Ada").unwrap();
        form.set_value("age", 15).unwrap();
        form.set_value("hasExperience", "No").unwrap();
        let mut called = false;
        let result = pollster::block_on(form.submit(|_| {
            called = true;
            async { Ok::<(), String>(()) }
        }));
        assert!(!called);
        let errors = result.unwrap_err();
        assert_eq!(
            errors.errors().and_then(|e| e.message("age")).as_deref(),
            Some("Minimum value is 18")
        );
        assert_eq!(form.lifecycle(), Lifecycle::Failed);
        assert_eq!(form.errors().len(), 1);
    }

    #[test]
    fn submit_success_passes_visible_coerced_values() {
        let mut form = mount(profile());
        form.set_value("name", "Ada").unwrap();
        form.set_value("age", "42").unwrap();
        form.set_value("hasExperience", "No").unwrap();
        form.set_value("years", "abc").unwrap();
        let mut seen = None;
        let outcome = pollster::block_on(form.submit(|values| {
            seen = Some(values);
            async { Ok::<(), String>(()) }
        }))
        .unwrap();
        assert_eq!(outcome, SubmitOutcome::Succeeded);
        let seen = seen.unwrap();
        assert_eq!(seen.get("age"), &FieldValue::Number(42.0));
        assert!(!seen.contains("years"));
        assert_eq!(form.lifecycle(), Lifecycle::Succeeded);
    }

    #[test]
    fn submit_failure_is_opaque_and_recoverable() {
        let mut form = mount(vec![FieldDescriptor::new("name", "Name", FieldKind::text())]);
        form.set_value("name", "Ada").unwrap();
        let outcome = pollster::block_on(
            form.submit(|_| async { Err::<(), _>("503 Service Unavailable") }),
        )
        .unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Failed(SubmissionError::new("503 Service Unavailable"))
        );
        assert_eq!(form.lifecycle(), Lifecycle::Failed);
        assert_eq!(
            form.last_error().map(SubmissionError::message),
            Some("503 Service Unavailable")
        );

        // Failed is not terminal.
        let outcome = pollster::block_on(form.submit(|_| async { Ok::<(), String>(()) })).unwrap();
        assert!(outcome.is_success());
        assert!(form.last_error().is_none());
    }

    #[test]
    fn second_begin_while_in_flight_is_rejected() {
        let mut form = mount(vec![FieldDescriptor::new("name", "Name", FieldKind::text())]);
        form.set_value("name", "Ada").unwrap();
        let ticket = form.begin_submit().unwrap();
        assert_eq!(form.lifecycle(), Lifecycle::Submitting);
        assert_eq!(form.begin_submit(), Err(SubmitRejected::InFlight));
        assert_eq!(form.lifecycle(), Lifecycle::Submitting);
        assert!(form.complete_submit(ticket.token, Ok(())));
        assert_eq!(form.lifecycle(), Lifecycle::Succeeded);
        assert!(form.submission_trace().verify_invariants().is_empty());
    }

    #[test]
    fn completion_after_reset_is_stale() {
        let mut form = mount(vec![FieldDescriptor::new("name", "Name", FieldKind::text())]);
        form.set_value("name", "Ada").unwrap();
        let ticket = form.begin_submit().unwrap();
        form.reset();
        assert_eq!(form.lifecycle(), Lifecycle::Idle);
        assert!(!form.complete_submit(ticket.token, Err(SubmissionError::new("late"))));
        assert_eq!(form.lifecycle(), Lifecycle::Idle);
        assert!(form.last_error().is_none());
        let trace = form.submission_trace();
        assert_eq!(trace.last().map(SubmissionEvent::event_type), Some("stale_discarded"));
        assert!(trace.verify_invariants().is_empty());

        // A retired token is discarded as stale only once.
        assert!(!form.complete_submit(ticket.token, Ok(())));
        let trace = form.submission_trace();
        assert_eq!(trace.last().map(SubmissionEvent::event_type), Some("unmatched"));
        assert!(trace.verify_invariants().is_empty());
    }

    #[test]
    fn second_completion_is_unmatched() {
        let mut form = mount(vec![FieldDescriptor::new("name", "Name", FieldKind::text())]);
        form.set_value("name", "Ada").unwrap();
        let ticket = form.begin_submit().unwrap();
        assert!(form.complete_submit(ticket.token, Ok(())));
        assert!(!form.complete_submit(ticket.token, Err(SubmissionError::new("again"))));
        assert_eq!(form.lifecycle(), Lifecycle::Succeeded);
        assert!(form.last_error().is_none());

        let trace = form.submission_trace();
        assert_eq!(
            trace.events().iter().map(SubmissionEvent::event_type).collect::<Vec<_>>(),
            vec!["started", "succeeded", "unmatched"]
        );
        assert!(trace.verify_invariants().is_empty());

        assert!(!form.complete_submit(SubmitToken::from_raw(99), Ok(())));
        assert_eq!(
            form.submission_trace().last().map(SubmissionEvent::event_type),
            Some("unmatched")
        );
    }

    #[test]
    fn trace_is_bounded_by_config() {
        let mut form = FormEngine::builder(vec![FieldDescriptor::new("name", "Name", FieldKind::text())])
            .config(EngineConfig::default().trace_capacity(2))
            .build()
            .unwrap();
        for _ in 0..5 {
            let _ = form.begin_submit();
        }
        let trace = form.submission_trace();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.dropped(), 3);
        assert!(trace.verify_invariants().is_empty());
    }

    #[test]
    fn trace_checksum_is_deterministic() {
        let run = || {
            let mut form = mount(profile());
            let _ = form.begin_submit();
            form.set_value("name", "Ada").unwrap();
            form.set_value("age", 30).unwrap();
            form.set_value("hasExperience", "No").unwrap();
            let ticket = form.begin_submit().unwrap();
            form.complete_submit(ticket.token, Ok(()));
            form.submission_trace().checksum()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn reset_restores_defaults() {
        let fields = vec![
            FieldDescriptor::new("name", "Name", FieldKind::text()).with_default("Ada"),
            FieldDescriptor::new("skills", "Skills", FieldKind::tags()).with_default(vec!["rust"]),
        ];
        let mut form = mount(fields);
        form.set_value("name", "").unwrap();
        form.add_tag("skills", "go").unwrap();
        form.blur("name").unwrap();
        assert!(!form.validate());
        form.reset();
        assert_eq!(form.value("name"), &FieldValue::from("Ada"));
        assert_eq!(form.tag_list("skills").unwrap().tags(), ["rust"]);
        assert!(form.errors().is_empty());
        assert!(!form.is_touched("name"));
        assert!(form.is_pristine());
    }

    #[test]
    fn tag_edits_flow_into_values() {
        let kind = FieldKind::Tags(TagConstraints::default().with_max_tags(2));
        let mut form = mount(vec![FieldDescriptor::new("skills", "Skills", kind)]);
        assert_eq!(form.add_tag("skills", "rust").unwrap(), TagOutcome::Added);
        assert_eq!(form.add_tag("skills", "rust").unwrap(), TagOutcome::Duplicate);
        form.set_tag_input("skills", "go").unwrap();
        assert_eq!(
            form.handle_tag_key("skills", TagKey::Enter).unwrap(),
            Some(TagOutcome::Added)
        );
        assert_eq!(form.add_tag("skills", "elm").unwrap(), TagOutcome::Full);
        assert_eq!(form.value("skills"), &FieldValue::from(vec!["rust", "go"]));

        form.handle_tag_key("skills", TagKey::Backspace).unwrap();
        assert_eq!(form.value("skills"), &FieldValue::from(vec!["rust"]));
        assert!(form.remove_tag("skills", "rust").unwrap());
        assert_eq!(form.value("skills"), &FieldValue::List(Vec::new()));
    }

    #[test]
    fn dropped_tag_add_leaves_value_untouched() {
        let mut form = mount(vec![FieldDescriptor::new("skills", "Skills", FieldKind::tags())]);
        form.add_tag("skills", "   ").unwrap();
        assert!(!form.values().contains("skills"));
        assert!(!form.is_dirty("skills"));
    }

    #[test]
    fn set_value_on_tags_stores_what_the_list_shows() {
        let kind = FieldKind::Tags(TagConstraints::default().with_max_tags(2));
        let mut form = mount(vec![FieldDescriptor::new("skills", "Skills", kind)]);
        form.set_value("skills", vec!["rust", "rust", "  ", " go "]).unwrap();
        assert_eq!(form.value("skills"), &FieldValue::from(vec!["rust", "go"]));
        assert_eq!(form.tag_list("skills").unwrap().tags(), ["rust", "go"]);

        let ticket = form.begin_submit().unwrap();
        assert_eq!(ticket.values.get("skills"), &FieldValue::from(vec!["rust", "go"]));

        form.set_value("skills", FieldValue::Empty).unwrap();
        assert!(form.tag_list("skills").unwrap().tags().is_empty());
        assert_eq!(form.value("skills"), &FieldValue::Empty);
    }

    #[test]
    fn tag_defaults_and_overrides_are_cleaned_at_mount() {
        let fields = vec![
            FieldDescriptor::new("skills", "Skills", FieldKind::tags())
                .with_default(vec!["a", "a", " "]),
            FieldDescriptor::new("langs", "Languages", FieldKind::tags()),
        ];
        let overrides: Values = [("langs", vec!["rust", " rust "])].into_iter().collect();
        let mut form = FormEngine::mount(fields, overrides).unwrap();
        assert_eq!(form.value("skills"), &FieldValue::from(vec!["a"]));
        assert_eq!(form.value("langs"), &FieldValue::from(vec!["rust"]));
        assert!(form.is_pristine());

        form.add_tag("langs", "go").unwrap();
        form.reset();
        assert_eq!(form.tag_list("langs").unwrap().tags(), ["rust"]);
        assert_eq!(form.value("langs"), &FieldValue::from(vec!["rust"]));
    }

    #[test]
    fn tag_calls_on_wrong_kind() {
        let mut form = mount(profile());
        assert_eq!(
            form.add_tag("name", "x"),
            Err(ConfigError::WrongKind {
                name: "name".into(),
                expected: "tags",
                actual: "text",
            })
        );
        assert!(matches!(
            form.select_files("name", Vec::new()),
            Err(ConfigError::WrongKind { expected: "file", .. })
        ));
    }

    #[test]
    fn select_files_sets_value_and_previews() {
        let kind = FieldKind::File(FileConstraints::default().with_preview());
        let mut form = mount(vec![FieldDescriptor::new("avatar", "Avatar", kind)]);
        let file = FileHandle::new("me.png", "image/png", 3);
        let job = form
            .select_files("avatar", vec![file.clone()])
            .unwrap()
            .unwrap();
        assert_eq!(form.value("avatar"), &FieldValue::File(file));
        let source = MemorySource::new().with_file("me.png", b"abc".to_vec());
        let report = pollster::block_on(job.run(&source));
        assert_eq!(report.written, 1);
        assert_eq!(
            form.previews("avatar")[0].url(),
            Some("data:image/png;base64,YWJj")
        );
        form.reset();
        assert!(form.previews("avatar").is_empty());
    }

    #[test]
    fn select_files_without_preview() {
        let kind = FieldKind::File(FileConstraints::default().multiple());
        let mut form = mount(vec![FieldDescriptor::new("docs", "Docs", kind)]);
        let files = vec![
            FileHandle::new("a.pdf", "application/pdf", 1),
            FileHandle::new("b.pdf", "application/pdf", 1),
        ];
        assert!(form.select_files("docs", files).unwrap().is_none());
        assert_eq!(form.value("docs").files().len(), 2);
    }

    #[test]
    fn preview_job_outliving_engine_writes_nothing() {
        let kind = FieldKind::File(FileConstraints::default().with_preview());
        let mut form = mount(vec![FieldDescriptor::new("avatar", "Avatar", kind)]);
        let job = form
            .select_files("avatar", vec![FileHandle::new("me.png", "image/png", 1)])
            .unwrap()
            .unwrap();
        let store = form.preview_store().clone();
        let source = MemorySource::new().with_file("me.png", b"x".to_vec());
        let handle = std::thread::spawn(move || {
            drop(form);
            pollster::block_on(job.run(&source))
        });
        let report = handle.join().unwrap();
        assert_eq!(report.discarded, 1);
        assert!(store.is_closed());
        assert!(store.previews("avatar").is_empty());
    }
}
