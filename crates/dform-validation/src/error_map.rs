#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use crate::validators::ValidationError;

/// Field name → the first error found for that field.
///
/// Rebuilt wholesale on every validation pass; ordered by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorMap(BTreeMap<String, ValidationError>);

impl ErrorMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, error: ValidationError) {
        self.0.insert(field.into(), error);
    }

    pub fn remove(&mut self, field: &str) -> Option<ValidationError> {
        self.0.remove(field)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.0.get(field)
    }

    /// The formatted message for `field`.
    #[must_use]
    pub fn message(&self, field: &str) -> Option<String> {
        self.0.get(field).map(ValidationError::format_message)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Keep only the entries whose field passes `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|field, _| keep(field));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationError)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field → formatted message, the shape a renderer displays.
    #[must_use]
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.format_message()))
            .collect()
    }
}

impl fmt::Display for ErrorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, error)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorMap {}

impl FromIterator<(String, ValidationError)> for ErrorMap {
    fn from_iter<I: IntoIterator<Item = (String, ValidationError)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_display() {
        let mut errors = ErrorMap::new();
        errors.insert(
            "age",
            ValidationError::new("too_small", "Minimum value is {min}").with_param("min", 18),
        );
        errors.insert("name", ValidationError::new("required", "Name is required"));
        assert_eq!(errors.message("age").as_deref(), Some("Minimum value is 18"));
        assert_eq!(
            errors.to_string(),
            "age: Minimum value is 18; name: Name is required"
        );
        errors.retain(|f| f != "age");
        assert_eq!(errors.len(), 1);
        assert!(!errors.contains("age"));
    }
}
