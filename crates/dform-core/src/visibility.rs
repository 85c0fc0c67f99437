#![forbid(unsafe_code)]

//! Conditional visibility.
//!
//! Visibility is a pure function of a descriptor and the current values. The
//! engine recomputes the whole [`VisibleSet`] after every change; nothing is
//! cached between edits. Each field's rule is evaluated on its own: a field
//! whose controlling field is hidden still reads that field's current value.

use std::collections::{BTreeSet, HashMap};

use crate::descriptor::{ConditionalRule, FieldDescriptor, Operator};
use crate::error::ConfigError;
use crate::value::{FieldValue, Values};

/// Names of the fields whose rule currently holds.
pub type VisibleSet = BTreeSet<String>;

/// Apply a rule's operator to the current value of its controlling field.
///
/// Type mismatches evaluate to `false`; this never fails.
#[must_use]
pub fn evaluate(rule: &ConditionalRule, values: &Values) -> bool {
    let actual = values.get(&rule.field);
    match rule.operator {
        Operator::Equals => actual == &rule.value,
        Operator::NotEquals => actual != &rule.value,
        Operator::Contains => match (actual, &rule.value) {
            (FieldValue::List(items), FieldValue::Text(wanted)) => items.contains(wanted),
            _ => false,
        },
        Operator::GreaterThan => match (actual, &rule.value) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a > b,
            _ => false,
        },
        Operator::LessThan => match (actual, &rule.value) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a < b,
            _ => false,
        },
    }
}

/// Whether `field` is visible given `values`. No `showWhen` means always visible.
#[must_use]
pub fn is_visible(field: &FieldDescriptor, values: &Values) -> bool {
    field
        .show_when
        .as_ref()
        .is_none_or(|rule| evaluate(rule, values))
}

/// Recompute the visible set over every descriptor.
#[must_use]
pub fn visible_fields(fields: &[FieldDescriptor], values: &Values) -> VisibleSet {
    fields
        .iter()
        .filter(|field| is_visible(field, values))
        .map(|field| field.name.clone())
        .collect()
}

/// Check that every `showWhen` names another declared field and that the
/// rules do not form a cycle.
///
/// Each field has at most one controlling field, so the dependency graph is a
/// functional graph and following the chain from every node is enough to
/// find any cycle.
pub fn check_dependencies(fields: &[FieldDescriptor]) -> Result<(), ConfigError> {
    let parent: HashMap<&str, &str> = fields
        .iter()
        .filter_map(|f| f.show_when.as_ref().map(|r| (f.name.as_str(), r.field.as_str())))
        .collect();

    for field in fields {
        let Some(rule) = &field.show_when else {
            continue;
        };
        if rule.field == field.name {
            return Err(ConfigError::VisibilityCycle {
                path: vec![field.name.clone(), field.name.clone()],
            });
        }
        if !fields.iter().any(|f| f.name == rule.field) {
            return Err(ConfigError::UnknownDependency {
                field: field.name.clone(),
                depends_on: rule.field.clone(),
            });
        }
    }

    for field in fields {
        let mut path: Vec<&str> = vec![field.name.as_str()];
        let mut current = field.name.as_str();
        while let Some(&next) = parent.get(current) {
            if let Some(start) = path.iter().position(|&n| n == next) {
                let mut cycle: Vec<String> = path[start..].iter().map(|s| (*s).to_string()).collect();
                cycle.push(next.to_string());
                return Err(ConfigError::VisibilityCycle { path: cycle });
            }
            path.push(next);
            current = next;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldKind;

    fn years() -> FieldDescriptor {
        FieldDescriptor::new("yearsOfExperience", "Years", FieldKind::number())
            .show_when(ConditionalRule::equals("hasExperience", "Yes"))
    }

    #[test]
    fn no_rule_is_visible() {
        let field = FieldDescriptor::new("a", "A", FieldKind::text());
        assert!(is_visible(&field, &Values::new()));
    }

    #[test]
    fn equals_is_strict() {
        let field = years();
        let yes: Values = [("hasExperience", "Yes")].into_iter().collect();
        let no: Values = [("hasExperience", "No")].into_iter().collect();
        assert!(is_visible(&field, &yes));
        assert!(!is_visible(&field, &no));
        assert!(!is_visible(&field, &Values::new()));

        let rule = ConditionalRule::equals("n", 5);
        let text: Values = [("n", "5")].into_iter().collect();
        assert!(!evaluate(&rule, &text));
    }

    #[test]
    fn not_equals() {
        let rule = ConditionalRule::not_equals("mode", "off");
        assert!(evaluate(&rule, &Values::new()));
        let off: Values = [("mode", "off")].into_iter().collect();
        assert!(!evaluate(&rule, &off));
    }

    #[test]
    fn contains_requires_list() {
        let rule = ConditionalRule::contains("langs", "rust");
        let list: Values = [("langs", vec!["go", "rust"])].into_iter().collect();
        let text: Values = [("langs", "rust")].into_iter().collect();
        assert!(evaluate(&rule, &list));
        assert!(!evaluate(&rule, &text));
    }

    #[test]
    fn comparisons_require_numbers() {
        let gt = ConditionalRule::greater_than("age", 17.0);
        let lt = ConditionalRule::less_than("age", 17.0);
        let adult: Values = [("age", 18)].into_iter().collect();
        let as_text: Values = [("age", "18")].into_iter().collect();
        assert!(evaluate(&gt, &adult));
        assert!(!evaluate(&lt, &adult));
        assert!(!evaluate(&gt, &as_text));
        assert!(!evaluate(&lt, &as_text));
    }

    #[test]
    fn visible_fields_recomputes_all() {
        let fields = vec![
            FieldDescriptor::new("hasExperience", "Has", FieldKind::radio(["Yes", "No"])),
            years(),
        ];
        let no: Values = [("hasExperience", "No")].into_iter().collect();
        let set = visible_fields(&fields, &no);
        assert!(set.contains("hasExperience"));
        assert!(!set.contains("yearsOfExperience"));
    }

    #[test]
    fn unknown_dependency_rejected() {
        let fields = vec![years()];
        assert_eq!(
            check_dependencies(&fields),
            Err(ConfigError::UnknownDependency {
                field: "yearsOfExperience".into(),
                depends_on: "hasExperience".into(),
            })
        );
    }

    #[test]
    fn self_dependency_rejected() {
        let fields = vec![FieldDescriptor::new("a", "A", FieldKind::text())
            .show_when(ConditionalRule::equals("a", "x"))];
        assert_eq!(
            check_dependencies(&fields),
            Err(ConfigError::VisibilityCycle {
                path: vec!["a".into(), "a".into()],
            })
        );
    }

    #[test]
    fn longer_cycle_reported_with_path() {
        let fields = vec![
            FieldDescriptor::new("a", "A", FieldKind::text())
                .show_when(ConditionalRule::equals("b", "x")),
            FieldDescriptor::new("b", "B", FieldKind::text())
                .show_when(ConditionalRule::equals("c", "x")),
            FieldDescriptor::new("c", "C", FieldKind::text())
                .show_when(ConditionalRule::equals("a", "x")),
        ];
        assert_eq!(
            check_dependencies(&fields),
            Err(ConfigError::VisibilityCycle {
                path: vec!["a".into(), "b".into(), "c".into(), "a".into()],
            })
        );
    }

    #[test]
    fn chains_without_cycles_pass() {
        let fields = vec![
            FieldDescriptor::new("a", "A", FieldKind::text()),
            FieldDescriptor::new("b", "B", FieldKind::text())
                .show_when(ConditionalRule::equals("a", "x")),
            FieldDescriptor::new("c", "C", FieldKind::text())
                .show_when(ConditionalRule::equals("b", "y")),
        ];
        assert_eq!(check_dependencies(&fields), Ok(()));
    }
}
