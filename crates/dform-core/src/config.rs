#![forbid(unsafe_code)]

//! The form configuration document.
//!
//! ```json
//! {
//!   "fields": [{"name": "age", "label": "Age", "type": "number", "min": 18}],
//!   "defaultValues": {"age": 30},
//!   "steps": [{"title": "About you", "fields": ["age"], "validate": true}]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::descriptor::{FieldDescriptor, check_names};
use crate::error::ConfigError;
use crate::value::Values;
use crate::visibility::check_dependencies;

/// One page of a multi-step form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormStep {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Names of the fields shown on this step.
    pub fields: Vec<String>,
    /// Validate the step's fields before moving forward.
    pub validate: bool,
}

impl FormStep {
    #[must_use]
    pub fn new<I, S>(title: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            description: None,
            fields: fields.into_iter().map(Into::into).collect(),
            validate: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn validated(mut self) -> Self {
        self.validate = true;
        self
    }
}

/// Descriptors plus optional caller defaults and steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    pub fields: Vec<FieldDescriptor>,
    pub default_values: Values,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<FormStep>,
}

impl FormConfig {
    #[must_use]
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: Values) -> Self {
        self.default_values = defaults;
        self
    }

    #[must_use]
    pub fn with_steps(mut self, steps: Vec<FormStep>) -> Self {
        self.steps = steps;
        self
    }

    /// Parse a configuration document and run the structural checks.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Structural checks: names, `showWhen` references, step field names.
    pub fn check(&self) -> Result<(), ConfigError> {
        check_names(&self.fields)?;
        check_dependencies(&self.fields)?;
        for step in &self.steps {
            if let Some(name) = step
                .fields
                .iter()
                .find(|name| !self.fields.iter().any(|f| &f.name == *name))
            {
                return Err(ConfigError::UnknownField { name: name.clone() });
            }
        }
        Ok(())
    }

    /// Look up a descriptor by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldKind;
    use crate::value::FieldValue;

    #[test]
    fn parses_full_document() {
        let config = FormConfig::from_json_str(
            r#"{
                "fields": [
                    {"name": "hasExperience", "label": "Experience?", "type": "radio", "options": ["Yes", "No"]},
                    {"name": "years", "label": "Years", "type": "number",
                     "showWhen": {"field": "hasExperience", "operator": "equals", "value": "Yes"}}
                ],
                "defaultValues": {"hasExperience": "No"},
                "steps": [{"title": "One", "fields": ["hasExperience", "years"], "validate": true}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.default_values.get("hasExperience"), &FieldValue::from("No"));
        assert!(config.steps[0].validate);
        assert!(matches!(config.field("years").unwrap().kind, FieldKind::Number(_)));
    }

    #[test]
    fn parse_error_maps_to_config_error() {
        let err = FormConfig::from_json_str("{\"fields\": 3}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_step_field_rejected() {
        let config = FormConfig::new(vec![FieldDescriptor::new("a", "A", FieldKind::text())])
            .with_steps(vec![FormStep::new("One", ["a", "b"])]);
        assert_eq!(
            config.check(),
            Err(ConfigError::UnknownField { name: "b".into() })
        );
    }

    #[test]
    fn missing_name_rejected() {
        let err =
            FormConfig::from_json_str(r#"{"fields": [{"label": "No name", "type": "text"}]}"#)
                .unwrap_err();
        assert_eq!(err, ConfigError::EmptyName { index: 0 });
    }
}
