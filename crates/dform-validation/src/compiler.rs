#![forbid(unsafe_code)]

//! Schema compiler: descriptors in, a reusable validator out.
//!
//! Compilation checks the descriptor list once (names, `showWhen` graph,
//! patterns, bounds) and builds one check pipeline per field. Each pipeline
//! runs in a fixed order:
//!
//! 1. blank values: report `"{label} is required"` for required fields,
//!    otherwise accept the value and skip every later step;
//! 2. coercion to the kind's type (numeric text to a number, `"true"` to a
//!    boolean, a single file to a one-element list);
//! 3. kind format and range checks;
//! 4. option-domain restriction;
//! 5. cardinality of multi-value kinds;
//! 6. custom rules from the predicate registry.
//!
//! The first failure is the field's error.
//!
//! ```rust
//! use dform_core::{FieldDescriptor, FieldKind, Values};
//! use dform_validation::compile;
//!
//! let schema = compile(&[FieldDescriptor::new("age", "Age", FieldKind::number_between(18.0, 120.0))])
//!     .unwrap();
//! let values: Values = [("age", 15)].into_iter().collect();
//! let errors = schema.validate(&values).unwrap_err();
//! assert_eq!(errors.message("age").as_deref(), Some("Minimum value is 18"));
//! ```

use std::sync::Arc;

use dform_core::{
    ConfigError, DateConstraints, FieldDescriptor, FieldKind, FieldValue, FileConstraints,
    FileHandle, MultiChoiceConstraints, NumericConstraints, TagConstraints, TextConstraints,
    ValidationRule, Values, VisibleSet, check_dependencies, check_names,
};
use tracing::{debug, trace};

use crate::error_map::ErrorMap;
use crate::predicates::PredicateRegistry;
use crate::validators::{
    Accept, All, Count, DateRange, ERROR_CODE_CUSTOM, ERROR_CODE_TYPE, EachOneOf, Email,
    FileCount, HexColor, MaxFileSize, OneOf, Pattern, Phone, Required,
    TemporalBound, TemporalKind, Url, ValidationError, ValidationResult, Validator,
    ValidatorBuilder,
};

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compiles descriptor lists against a predicate registry.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    registry: Arc<PredicateRegistry>,
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCompiler {
    /// A compiler with the built-in predicates.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(PredicateRegistry::with_builtins())
    }

    #[must_use]
    pub fn with_registry(registry: PredicateRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    /// Check `fields` and build the validator.
    pub fn compile(&self, fields: &[FieldDescriptor]) -> Result<CompiledSchema, ConfigError> {
        check_names(fields)?;
        check_dependencies(fields)?;
        let compiled = fields
            .iter()
            .map(CompiledField::new)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(fields = compiled.len(), "compiled form schema");
        Ok(CompiledSchema {
            fields: compiled,
            registry: Arc::clone(&self.registry),
        })
    }
}

/// Compile with the built-in predicate registry.
pub fn compile(fields: &[FieldDescriptor]) -> Result<CompiledSchema, ConfigError> {
    SchemaCompiler::new().compile(fields)
}

// ---------------------------------------------------------------------------
// Per-kind pipelines
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum KindChecks {
    Text(All<str>),
    Number(All<f64>),
    Choice(Option<OneOf>),
    List(All<[String]>),
    Boolean,
    Temporal(DateRange),
    Files(All<[FileHandle]>),
}

fn bounds_error(field: &str, detail: impl Into<String>) -> ConfigError {
    ConfigError::InvalidBounds {
        field: field.to_string(),
        detail: detail.into(),
    }
}

fn text_checks(
    field: &FieldDescriptor,
    c: &TextConstraints,
    format: Option<Box<dyn Validator<str>>>,
) -> Result<KindChecks, ConfigError> {
    if let (Some(min), Some(max)) = (c.min_length, c.max_length)
        && min > max
    {
        return Err(bounds_error(
            &field.name,
            format!("minLength {min} exceeds maxLength {max}"),
        ));
    }
    let mut builder = ValidatorBuilder::<str>::new();
    if let Some(format) = format {
        builder = builder.custom(format);
    }
    if let Some(min) = c.min_length {
        builder = builder.min_length(min);
    }
    if let Some(max) = c.max_length {
        builder = builder.max_length(max);
    }
    if let Some(pattern) = &c.pattern {
        let compiled =
            Pattern::new(pattern, &field.label).map_err(|e| ConfigError::InvalidPattern {
                field: field.name.clone(),
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        builder = builder.custom(compiled);
    }
    Ok(KindChecks::Text(builder.build()))
}

fn numeric_checks(field: &FieldDescriptor, c: &NumericConstraints) -> Result<KindChecks, ConfigError> {
    if let (Some(min), Some(max)) = (c.min, c.max)
        && min > max
    {
        return Err(bounds_error(&field.name, format!("min {min} exceeds max {max}")));
    }
    let mut builder = ValidatorBuilder::<f64>::new().range(c.min, c.max);
    if let Some(step) = c.step {
        if !step.is_finite() || step <= 0.0 {
            return Err(bounds_error(&field.name, format!("step {step} must be positive")));
        }
        builder = builder.multiple_of(step);
    }
    Ok(KindChecks::Number(builder.build()))
}

fn multi_checks(field: &FieldDescriptor, c: &MultiChoiceConstraints) -> Result<KindChecks, ConfigError> {
    if let (Some(min), Some(max)) = (c.min_selection, c.max_selection)
        && min > max
    {
        return Err(bounds_error(
            &field.name,
            format!("minSelection {min} exceeds maxSelection {max}"),
        ));
    }
    let values: Vec<String> = c.options.iter().map(|o| o.value.clone()).collect();
    let builder = ValidatorBuilder::<[String]>::new()
        .custom_if(!values.is_empty(), EachOneOf::new(values))
        .custom_if(
            c.min_selection.is_some() || c.max_selection.is_some(),
            Count::selection(c.min_selection, c.max_selection),
        );
    Ok(KindChecks::List(builder.build()))
}

fn tag_checks(c: &TagConstraints) -> KindChecks {
    let mut builder = ValidatorBuilder::<[String]>::new();
    if !c.allow_custom && !c.suggestions.is_empty() {
        builder = builder.custom(EachOneOf::new(c.suggestions.clone()));
    }
    if let Some(max) = c.max_tags {
        builder = builder.custom(Count::tags(max));
    }
    KindChecks::List(builder.build())
}

fn temporal_checks(
    field: &FieldDescriptor,
    kind: TemporalKind,
    c: &DateConstraints,
) -> Result<KindChecks, ConfigError> {
    let bound = |text: &Option<String>| -> Result<Option<TemporalBound>, ConfigError> {
        let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };
        let at = kind
            .parse_bound(text)
            .ok_or_else(|| ConfigError::InvalidDateBound {
                field: field.name.clone(),
                value: text.to_string(),
            })?;
        Ok(Some(TemporalBound {
            text: text.to_string(),
            at,
        }))
    };
    let mut range = DateRange::new(kind);
    range.min = bound(&c.min)?;
    range.max = bound(&c.max)?;
    if let (Some(min), Some(max)) = (&range.min, &range.max)
        && min.at > max.at
    {
        return Err(bounds_error(
            &field.name,
            format!("min {} is after max {}", min.text, max.text),
        ));
    }
    Ok(KindChecks::Temporal(range))
}

fn file_checks(c: &FileConstraints) -> KindChecks {
    let mut builder = ValidatorBuilder::<[FileHandle]>::new().custom(FileCount {
        multiple: c.multiple,
        max: c.max_files,
    });
    if let Some(max_bytes) = c.max_size {
        builder = builder.custom(MaxFileSize {
            max_bytes,
            multiple: c.multiple,
        });
    }
    if let Some(accept) = c.accept.as_deref().filter(|a| !a.trim().is_empty()) {
        builder = builder.custom(Accept::new(accept));
    }
    KindChecks::Files(builder.build())
}

fn type_error(expected: &str) -> ValidationError {
    ValidationError::new(ERROR_CODE_TYPE, format!("Expected {expected}"))
}

impl KindChecks {
    fn for_field(field: &FieldDescriptor) -> Result<Self, ConfigError> {
        let checks = match &field.kind {
            FieldKind::Text(c)
            | FieldKind::Password(c)
            | FieldKind::Textarea(c)
            | FieldKind::RichText(c) => text_checks(field, c, None)?,
            FieldKind::Email(c) => text_checks(field, c, Some(Box::new(Email::new())))?,
            FieldKind::Url(c) => text_checks(field, c, Some(Box::new(Url::new())))?,
            FieldKind::Tel(c) => text_checks(field, c, Some(Box::new(Phone)))?,
            FieldKind::Color => {
                KindChecks::Text(ValidatorBuilder::<str>::new().custom(HexColor).build())
            }
            FieldKind::Number(c) | FieldKind::Range(c) => numeric_checks(field, c)?,
            FieldKind::Select(c) | FieldKind::Radio(c) => KindChecks::Choice(
                (!c.options.is_empty())
                    .then(|| OneOf::new(c.options.iter().map(|o| o.value.clone()).collect())),
            ),
            FieldKind::Multiselect(c) | FieldKind::CheckboxGroup(c) => multi_checks(field, c)?,
            FieldKind::Tags(c) => tag_checks(c),
            FieldKind::Checkbox | FieldKind::Switch => KindChecks::Boolean,
            FieldKind::Date(c) => temporal_checks(field, TemporalKind::Date, c)?,
            FieldKind::DatetimeLocal(c) => temporal_checks(field, TemporalKind::DateTime, c)?,
            FieldKind::Time(c) => temporal_checks(field, TemporalKind::Time, c)?,
            FieldKind::File(c) => file_checks(c),
        };
        Ok(checks)
    }

    /// Coerce a non-blank value and run the kind checks.
    fn check(&self, value: &FieldValue) -> Result<FieldValue, ValidationError> {
        match self {
            Self::Text(validators) => {
                let text = value.as_text().ok_or_else(|| type_error("text"))?;
                validators.validate(text).into_result()?;
                Ok(value.clone())
            }
            Self::Number(validators) => {
                let n = coerce_number(value).ok_or_else(|| type_error("a number"))?;
                validators.validate(&n).into_result()?;
                Ok(FieldValue::Number(n))
            }
            Self::Choice(domain) => {
                let text = match value {
                    FieldValue::Text(s) => s.clone(),
                    FieldValue::Number(n) => n.to_string(),
                    _ => return Err(type_error("text")),
                };
                if let Some(domain) = domain {
                    domain.validate(&text).into_result()?;
                }
                Ok(FieldValue::Text(text))
            }
            Self::List(validators) => {
                let items = value.as_list().ok_or_else(|| type_error("a list"))?;
                validators.validate(items).into_result()?;
                Ok(value.clone())
            }
            Self::Boolean => match value {
                FieldValue::Bool(b) => Ok(FieldValue::Bool(*b)),
                FieldValue::Text(s) if s == "true" => Ok(FieldValue::Bool(true)),
                FieldValue::Text(s) if s == "false" => Ok(FieldValue::Bool(false)),
                _ => Err(type_error("true or false")),
            },
            Self::Temporal(range) => {
                let text = value.as_text().ok_or_else(|| type_error("text"))?;
                range.validate(text).into_result()?;
                Ok(value.clone())
            }
            Self::Files(validators) => {
                let files: Vec<FileHandle> = match value {
                    FieldValue::File(f) => vec![f.clone()],
                    FieldValue::Files(fs) => fs.clone(),
                    _ => return Err(type_error("a file")),
                };
                validators.validate(&files).into_result()?;
                Ok(value.clone())
            }
        }
    }
}

fn coerce_number(value: &FieldValue) -> Option<f64> {
    let n = match value {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// ---------------------------------------------------------------------------
// CompiledField
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct CompiledField {
    name: String,
    required: Option<Required>,
    checks: KindChecks,
    rules: Vec<ValidationRule>,
}

impl CompiledField {
    fn new(field: &FieldDescriptor) -> Result<Self, ConfigError> {
        Ok(Self {
            name: field.name.clone(),
            required: field.required.then(|| Required::new(&field.label)),
            checks: KindChecks::for_field(field)?,
            rules: field.validation.clone(),
        })
    }

    fn check(&self, value: &FieldValue, registry: &PredicateRegistry) -> Result<FieldValue, ValidationError> {
        if value.is_blank() {
            return match &self.required {
                Some(required) => Err(required.error()),
                None => Ok(value.clone()),
            };
        }
        let typed = self.checks.check(value)?;
        for rule in &self.rules {
            if !registry.check(&rule.rule, &typed, rule.value.as_ref()) {
                return Err(ValidationError::new(ERROR_CODE_CUSTOM, rule.message.clone())
                    .with_param("rule", &rule.rule));
            }
        }
        Ok(typed)
    }
}

// ---------------------------------------------------------------------------
// CompiledSchema
// ---------------------------------------------------------------------------

/// The validator for one descriptor list.
///
/// Holds no per-form state; one schema can serve any number of engines.
#[derive(Debug)]
pub struct CompiledSchema {
    fields: Vec<CompiledField>,
    registry: Arc<PredicateRegistry>,
}

impl CompiledSchema {
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Validate every declared field.
    ///
    /// On success returns the coerced values of the declared fields; keys
    /// that are not declared are dropped.
    pub fn validate(&self, values: &Values) -> Result<Values, ErrorMap> {
        self.run(values, |_| true)
    }

    /// Validate only the fields in `visible`. Hidden fields neither report
    /// errors nor appear in the output.
    pub fn validate_visible(&self, values: &Values, visible: &VisibleSet) -> Result<Values, ErrorMap> {
        self.run(values, |name| visible.contains(name))
    }

    /// Validate the fields accepted by `include`.
    pub fn validate_where(
        &self,
        values: &Values,
        include: impl Fn(&str) -> bool,
    ) -> Result<Values, ErrorMap> {
        self.run(values, include)
    }

    /// Validate one field's value in isolation. `None` for unknown names.
    #[must_use]
    pub fn validate_field(&self, name: &str, value: &FieldValue) -> Option<ValidationResult> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.check(value, &self.registry).map(|_| ()).into())
    }

    fn run(&self, values: &Values, include: impl Fn(&str) -> bool) -> Result<Values, ErrorMap> {
        let mut output = Values::new();
        let mut errors = ErrorMap::new();
        for field in self.fields.iter().filter(|f| include(&f.name)) {
            let raw = values.get(&field.name);
            match field.check(raw, &self.registry) {
                Ok(typed) => {
                    if !typed.is_blank() || values.contains(&field.name) {
                        output.set(field.name.clone(), typed);
                    }
                }
                Err(error) => {
                    trace!(field = %field.name, code = error.code, "field failed validation");
                    errors.insert(field.name.clone(), error);
                }
            }
        }
        if errors.is_empty() {
            Ok(output)
        } else {
            debug!(errors = errors.len(), "validation failed");
            Err(errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
