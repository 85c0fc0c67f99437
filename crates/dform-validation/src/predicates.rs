#![forbid(unsafe_code)]

//! Custom predicate registry.
//!
//! Maps rule names used in a descriptor's `validation` list to functions of
//! `(value, parameter)`. Hosts extend the registry before compiling; the
//! compiler never needs to change to learn a new rule. A name with no
//! registered predicate always passes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dform_core::FieldValue;

/// A registered predicate: `(value, optional rule parameter) -> passes`.
pub type Predicate = Arc<dyn Fn(&FieldValue, Option<&FieldValue>) -> bool + Send + Sync>;

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Name → predicate table.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    /// An empty registry: every rule passes.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in text predicates under their kebab-case names and
    /// camelCase aliases.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_text(&["has-uppercase", "hasUppercase"], |s| {
            s.chars().any(|c| c.is_ascii_uppercase())
        });
        registry.register_text(&["has-lowercase", "hasLowercase"], |s| {
            s.chars().any(|c| c.is_ascii_lowercase())
        });
        registry.register_text(&["has-digit", "hasNumber"], |s| {
            s.chars().any(|c| c.is_ascii_digit())
        });
        registry.register_text(&["has-special-char", "hasSpecialChar"], |s| {
            s.chars().any(|c| SPECIAL_CHARS.contains(c))
        });
        registry.register_text(&["alphanumeric-only", "isAlphanumeric"], |s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
        });
        registry.register_text(&["no-whitespace", "noSpaces"], |s| {
            !s.chars().any(char::is_whitespace)
        });
        registry.register_word_count(&["min-words", "minWords"], |words, n| words >= n);
        registry.register_word_count(&["max-words", "maxWords"], |words, n| words <= n);
        registry
    }

    /// Register (or replace) a predicate.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&FieldValue, Option<&FieldValue>) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(predicate));
    }

    /// Builder form of [`PredicateRegistry::register`].
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&FieldValue, Option<&FieldValue>) -> bool + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    fn register_text(&mut self, names: &[&str], check: fn(&str) -> bool) {
        let predicate: Predicate = Arc::new(move |value: &FieldValue, _: Option<&FieldValue>| {
            value.as_text().is_some_and(check)
        });
        for name in names {
            self.predicates.insert((*name).to_string(), Arc::clone(&predicate));
        }
    }

    fn register_word_count(&mut self, names: &[&str], compare: fn(f64, f64) -> bool) {
        let predicate: Predicate = Arc::new(move |value: &FieldValue, param: Option<&FieldValue>| {
            match (value.as_text(), param.and_then(FieldValue::as_number)) {
                (Some(text), Some(n)) => compare(text.split_whitespace().count() as f64, n),
                _ => false,
            }
        });
        for name in names {
            self.predicates.insert((*name).to_string(), Arc::clone(&predicate));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Run the named predicate. Unknown names pass.
    #[must_use]
    pub fn check(&self, name: &str, value: &FieldValue, param: Option<&FieldValue>) -> bool {
        self.predicates
            .get(name)
            .is_none_or(|predicate| predicate(value, param))
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("predicates", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str, value: impl Into<FieldValue>) -> bool {
        PredicateRegistry::with_builtins().check(name, &value.into(), None)
    }

    #[test]
    fn character_classes() {
        assert!(check("has-uppercase", "abC"));
        assert!(!check("hasUppercase", "abc"));
        assert!(check("has-lowercase", "ABc"));
        assert!(check("has-digit", "a1"));
        assert!(check("hasNumber", "a1"));
        assert!(check("has-special-char", "pass!"));
        assert!(!check("hasSpecialChar", "pass_"));
        assert!(check("alphanumeric-only", "abc123"));
        assert!(!check("isAlphanumeric", "abc 123"));
        assert!(check("no-whitespace", "abc"));
        assert!(!check("noSpaces", "a\tb"));
    }

    #[test]
    fn non_text_fails_builtins() {
        assert!(!check("has-digit", 5));
        assert!(!check("no-whitespace", vec!["a"]));
    }

    #[test]
    fn word_counts_need_numeric_param() {
        let registry = PredicateRegistry::with_builtins();
        let text = FieldValue::from("  one two   three ");
        assert!(registry.check("min-words", &text, Some(&FieldValue::from(3))));
        assert!(!registry.check("minWords", &text, Some(&FieldValue::from(4))));
        assert!(registry.check("max-words", &text, Some(&FieldValue::from(3))));
        assert!(!registry.check("maxWords", &text, Some(&FieldValue::from(2))));
        assert!(!registry.check("min-words", &text, Some(&FieldValue::from("3"))));
        assert!(!registry.check("min-words", &text, None));
    }

    #[test]
    fn unknown_rule_passes() {
        assert!(check("no-such-rule", "anything"));
    }

    #[test]
    fn host_predicates_override_and_extend() {
        let registry = PredicateRegistry::with_builtins()
            .with("even", |v, _| v.as_number().is_some_and(|n| n % 2.0 == 0.0))
            .with("has-digit", |_, _| true);
        assert!(registry.check("even", &FieldValue::from(4), None));
        assert!(!registry.check("even", &FieldValue::from(3), None));
        assert!(registry.check("has-digit", &FieldValue::from("none"), None));
    }
}
