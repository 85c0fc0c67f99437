#![forbid(unsafe_code)]

//! Field descriptors: declarative, data-only descriptions of form fields.
//!
//! A [`FieldDescriptor`] carries the attributes every field shares; its
//! [`FieldKind`] is a closed set of variants, each declaring exactly the
//! constraints valid for that kind. The JSON shape uses a `type`
//! discriminator with camelCase attributes:
//!
//! ```rust
//! use dform_core::descriptor::{FieldDescriptor, FieldKind};
//!
//! let field: FieldDescriptor = serde_json::from_str(
//!     r#"{"name": "age", "label": "Age", "type": "number", "min": 18, "max": 120}"#,
//! ).unwrap();
//! assert!(matches!(field.kind, FieldKind::Number(_)));
//! assert!(field.required);
//! ```
//!
//! Attributes that do not belong to the declared kind are ignored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::value::FieldValue;

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Comparison applied by a [`ConditionalRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

/// Show a field only while another field's value satisfies a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    /// Name of the field whose value is inspected.
    pub field: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: FieldValue,
}

impl ConditionalRule {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::Equals, value)
    }

    #[must_use]
    pub fn not_equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::NotEquals, value)
    }

    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::Contains, value)
    }

    #[must_use]
    pub fn greater_than(field: impl Into<String>, value: f64) -> Self {
        Self::new(field, Operator::GreaterThan, value)
    }

    #[must_use]
    pub fn less_than(field: impl Into<String>, value: f64) -> Self {
        Self::new(field, Operator::LessThan, value)
    }
}

/// A named custom predicate attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Registry name of the predicate.
    pub rule: String,
    /// Message reported when the predicate returns `false`.
    pub message: String,
    /// Optional predicate parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
}

impl ValidationRule {
    #[must_use]
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Attach the predicate parameter.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// One entry of a choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOption")]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub disabled: bool,
}

impl ChoiceOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: false,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

impl From<&str> for ChoiceOption {
    fn from(value: &str) -> Self {
        Self::new(value, value)
    }
}

impl From<String> for ChoiceOption {
    fn from(value: String) -> Self {
        Self::new(value.clone(), value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OptionValue {
    Text(String),
    Number(f64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Plain(String),
    Detailed {
        value: OptionValue,
        label: Option<String>,
        #[serde(default)]
        disabled: bool,
    },
}

impl From<RawOption> for ChoiceOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Plain(s) => Self::from(s),
            RawOption::Detailed {
                value,
                label,
                disabled,
            } => {
                let value = match value {
                    OptionValue::Text(s) => s,
                    OptionValue::Number(n) => n.to_string(),
                };
                Self {
                    label: label.unwrap_or_else(|| value.clone()),
                    value,
                    disabled,
                }
            }
        }
    }
}

fn options_from<I, S>(options: I) -> Vec<ChoiceOption>
where
    I: IntoIterator<Item = S>,
    S: Into<ChoiceOption>,
{
    options.into_iter().map(Into::into).collect()
}

// ---------------------------------------------------------------------------
// Per-kind constraints
// ---------------------------------------------------------------------------

/// Constraints for free-text kinds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextConstraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Regular expression the value must match (unanchored search).
    pub pattern: Option<String>,
}

impl TextConstraints {
    #[must_use]
    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// Constraints for numeric kinds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericConstraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// The value must be a multiple of `step`.
    pub step: Option<f64>,
}

impl NumericConstraints {
    #[must_use]
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }
}

/// Options of a single-choice kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceConstraints {
    pub options: Vec<ChoiceOption>,
}

/// Options and cardinality of a multi-choice kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MultiChoiceConstraints {
    pub options: Vec<ChoiceOption>,
    pub min_selection: Option<usize>,
    pub max_selection: Option<usize>,
}

impl MultiChoiceConstraints {
    #[must_use]
    pub fn with_min_selection(mut self, min: usize) -> Self {
        self.min_selection = Some(min);
        self
    }

    #[must_use]
    pub fn with_max_selection(mut self, max: usize) -> Self {
        self.max_selection = Some(max);
        self
    }
}

/// ISO-formatted bounds of a date/time kind (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConstraints {
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Constraints of a file kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConstraints {
    /// Comma-separated MIME types, `category/*` wildcards or `.ext` suffixes.
    pub accept: Option<String>,
    pub multiple: bool,
    /// Maximum size of each file in bytes.
    pub max_size: Option<u64>,
    pub max_files: Option<usize>,
    /// Generate previews for selected files.
    pub preview: bool,
}

impl FileConstraints {
    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    #[must_use]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    #[must_use]
    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = Some(count);
        self
    }

    #[must_use]
    pub fn with_preview(mut self) -> Self {
        self.preview = true;
        self
    }
}

/// Constraints of a tag-list kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagConstraints {
    pub max_tags: Option<usize>,
    pub suggestions: Vec<String>,
    /// When `false`, only entries of `suggestions` may be added.
    pub allow_custom: bool,
}

impl Default for TagConstraints {
    fn default() -> Self {
        Self {
            max_tags: None,
            suggestions: Vec::new(),
            allow_custom: true,
        }
    }
}

impl TagConstraints {
    #[must_use]
    pub fn with_max_tags(mut self, max: usize) -> Self {
        self.max_tags = Some(max);
        self
    }

    #[must_use]
    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn suggestions_only(mut self) -> Self {
        self.allow_custom = false;
        self
    }
}

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// The kind of a field together with its kind-specific constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Text(TextConstraints),
    Email(TextConstraints),
    Password(TextConstraints),
    Url(TextConstraints),
    Tel(TextConstraints),
    Textarea(TextConstraints),
    RichText(TextConstraints),
    Number(NumericConstraints),
    Range(NumericConstraints),
    Select(ChoiceConstraints),
    Radio(ChoiceConstraints),
    Multiselect(MultiChoiceConstraints),
    CheckboxGroup(MultiChoiceConstraints),
    Checkbox,
    Switch,
    Date(DateConstraints),
    DatetimeLocal(DateConstraints),
    Time(DateConstraints),
    File(FileConstraints),
    Color,
    Tags(TagConstraints),
}

impl FieldKind {
    #[must_use]
    pub fn text() -> Self {
        Self::Text(TextConstraints::default())
    }

    #[must_use]
    pub fn email() -> Self {
        Self::Email(TextConstraints::default())
    }

    #[must_use]
    pub fn password() -> Self {
        Self::Password(TextConstraints::default())
    }

    #[must_use]
    pub fn url() -> Self {
        Self::Url(TextConstraints::default())
    }

    #[must_use]
    pub fn tel() -> Self {
        Self::Tel(TextConstraints::default())
    }

    #[must_use]
    pub fn textarea() -> Self {
        Self::Textarea(TextConstraints::default())
    }

    #[must_use]
    pub fn number() -> Self {
        Self::Number(NumericConstraints::default())
    }

    /// A number field bounded by `min..=max`.
    #[must_use]
    pub fn number_between(min: f64, max: f64) -> Self {
        Self::Number(NumericConstraints::default().with_min(min).with_max(max))
    }

    #[must_use]
    pub fn select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChoiceOption>,
    {
        Self::Select(ChoiceConstraints {
            options: options_from(options),
        })
    }

    #[must_use]
    pub fn radio<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChoiceOption>,
    {
        Self::Radio(ChoiceConstraints {
            options: options_from(options),
        })
    }

    #[must_use]
    pub fn multiselect<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChoiceOption>,
    {
        Self::Multiselect(MultiChoiceConstraints {
            options: options_from(options),
            ..MultiChoiceConstraints::default()
        })
    }

    #[must_use]
    pub fn checkbox_group<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChoiceOption>,
    {
        Self::CheckboxGroup(MultiChoiceConstraints {
            options: options_from(options),
            ..MultiChoiceConstraints::default()
        })
    }

    #[must_use]
    pub fn date() -> Self {
        Self::Date(DateConstraints::default())
    }

    #[must_use]
    pub fn file() -> Self {
        Self::File(FileConstraints::default())
    }

    #[must_use]
    pub fn tags() -> Self {
        Self::Tags(TagConstraints::default())
    }

    /// The `type` discriminator as written in configuration.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Email(_) => "email",
            Self::Password(_) => "password",
            Self::Url(_) => "url",
            Self::Tel(_) => "tel",
            Self::Textarea(_) => "textarea",
            Self::RichText(_) => "rich-text",
            Self::Number(_) => "number",
            Self::Range(_) => "range",
            Self::Select(_) => "select",
            Self::Radio(_) => "radio",
            Self::Multiselect(_) => "multiselect",
            Self::CheckboxGroup(_) => "checkbox-group",
            Self::Checkbox => "checkbox",
            Self::Switch => "switch",
            Self::Date(_) => "date",
            Self::DatetimeLocal(_) => "datetime-local",
            Self::Time(_) => "time",
            Self::File(_) => "file",
            Self::Color => "color",
            Self::Tags(_) => "tags",
        }
    }

    /// Declared options of a choice kind.
    #[must_use]
    pub fn options(&self) -> Option<&[ChoiceOption]> {
        match self {
            Self::Select(c) | Self::Radio(c) => Some(&c.options),
            Self::Multiselect(c) | Self::CheckboxGroup(c) => Some(&c.options),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldDescriptor
// ---------------------------------------------------------------------------

/// One field of a form: common attributes plus its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Unique key within the form.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_when: Option<ConditionalRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Create a required, enabled field.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            required: true,
            disabled: false,
            read_only: false,
            default_value: None,
            placeholder: None,
            help_text: None,
            show_when: None,
            validation: Vec::new(),
            kind,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }

    #[must_use]
    pub fn show_when(mut self, rule: ConditionalRule) -> Self {
        self.show_when = Some(rule);
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    /// Whether the user may edit the field.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        !self.disabled && !self.read_only
    }
}

/// Check names: non-empty and unique across the list.
pub fn check_names(fields: &[FieldDescriptor]) -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            return Err(ConfigError::EmptyName { index });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(ConfigError::DuplicateName {
                name: field.name.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
