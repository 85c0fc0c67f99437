//! Property-based invariants for compilation, visibility and the tag list.
//!
//! 1. Compilation is deterministic: two schemas from one descriptor list
//!    produce identical error maps.
//! 2. A blank required field always yields an error naming its label.
//! 3. A field hidden by `showWhen` never contributes an error.
//! 4. Re-adding a present tag leaves the list unchanged.
//! 5. With `maxTags = 2` the list never exceeds two entries.
//! 6. Numeric bounds are inclusive.

use dform::prelude::*;
use dform::{TagList, compile};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Empty),
        any::<bool>().prop_map(FieldValue::Bool),
        (-1_000.0f64..1_000.0).prop_map(FieldValue::Number),
        "[ a-zA-Z0-9@.!#:/_-]{0,24}".prop_map(FieldValue::Text),
        prop::collection::vec("[a-z]{1,6}", 0..4).prop_map(FieldValue::List),
    ]
}

fn kind() -> impl Strategy<Value = FieldKind> {
    prop_oneof![
        Just(FieldKind::text()),
        Just(FieldKind::email()),
        Just(FieldKind::url()),
        Just(FieldKind::tel()),
        Just(FieldKind::number()),
        Just(FieldKind::number_between(18.0, 120.0)),
        Just(FieldKind::select(["USA", "UK"])),
        Just(FieldKind::multiselect(["a", "b", "c"])),
        Just(FieldKind::date()),
        Just(FieldKind::tags()),
    ]
}

/// Kinds whose blank value is `Empty`.
fn blankable_kind() -> impl Strategy<Value = FieldKind> {
    prop_oneof![
        Just(FieldKind::text()),
        Just(FieldKind::email()),
        Just(FieldKind::number()),
        Just(FieldKind::select(["x", "y"])),
        Just(FieldKind::multiselect(["x", "y"])),
        Just(FieldKind::date()),
        Just(FieldKind::file()),
        Just(FieldKind::tags()),
    ]
}

fn descriptors() -> impl Strategy<Value = Vec<FieldDescriptor>> {
    prop::collection::vec((kind(), any::<bool>()), 1..6).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (kind, required))| {
                let field = FieldDescriptor::new(format!("f{i}"), format!("Field {i}"), kind);
                if required { field } else { field.optional() }
            })
            .collect()
    })
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn compile_is_deterministic(
        fields in descriptors(),
        raw in prop::collection::vec(field_value(), 6),
    ) {
        let values: Values = fields
            .iter()
            .zip(raw)
            .map(|(f, v)| (f.name.clone(), v))
            .collect();
        let a = compile(&fields).unwrap();
        let b = compile(&fields).unwrap();
        prop_assert_eq!(a.validate(&values), b.validate(&values));
    }

    #[test]
    fn blank_required_field_names_its_label(
        kind in blankable_kind(),
        label in "[A-Z][a-z]{2,10}",
        blank in prop_oneof![
            Just(FieldValue::Empty),
            Just(FieldValue::Text(String::new())),
            Just(FieldValue::List(Vec::new())),
        ],
    ) {
        let mut form = FormEngine::mount(
            vec![FieldDescriptor::new("field", label.clone(), kind)],
            Values::new(),
        )
        .unwrap();
        form.set_value("field", blank).unwrap();
        let rejected = pollster::block_on(form.submit(|_| async { Ok::<(), String>(()) }));
        let message = rejected
            .err()
            .and_then(|r| r.errors().and_then(|e| e.message("field")))
            .unwrap_or_default();
        prop_assert!(message.contains(&label), "message {:?} lacks label {:?}", message, label);
        prop_assert_eq!(form.lifecycle(), Lifecycle::Failed);
    }

    #[test]
    fn hidden_fields_never_report_errors(
        gate in field_value(),
        hidden_value in field_value(),
        kind in kind(),
    ) {
        let fields = vec![
            FieldDescriptor::new("gate", "Gate", FieldKind::text()).optional(),
            FieldDescriptor::new("guarded", "Guarded", kind)
                .show_when(ConditionalRule::equals("gate", "open")),
        ];
        let mut form = FormEngine::mount(fields, Values::new()).unwrap();
        form.set_value("guarded", hidden_value).unwrap();
        form.set_value("gate", gate.clone()).unwrap();
        form.validate();
        if gate != FieldValue::from("open") {
            prop_assert!(!form.is_visible("guarded"));
            prop_assert!(!form.errors().contains("guarded"));
        }
    }

    #[test]
    fn re_adding_tag_is_noop(tags in prop::collection::vec("[a-z]{1,5}", 1..6), pick in any::<prop::sample::Index>()) {
        let mut list = TagList::new();
        for tag in &tags {
            list.add_tag(tag);
        }
        let before = list.tags().to_vec();
        let existing = before[pick.index(before.len())].clone();
        prop_assert_eq!(list.add_tag(&existing), TagOutcome::Duplicate);
        prop_assert_eq!(list.tags(), before.as_slice());
    }

    #[test]
    fn max_tags_is_a_hard_bound(tags in prop::collection::vec("[a-z]{1,5}", 0..10)) {
        let mut list = TagList::new().with_max_tags(2);
        for tag in &tags {
            list.add_tag(tag);
            prop_assert!(list.tags().len() <= 2);
        }
        let distinct: std::collections::BTreeSet<_> = tags.iter().collect();
        prop_assert_eq!(list.tags().len(), distinct.len().min(2));
    }

    #[test]
    fn numeric_bounds_are_inclusive(n in 0i64..200) {
        let schema = compile(&[FieldDescriptor::new(
            "age",
            "Age",
            FieldKind::number_between(18.0, 120.0),
        )])
        .unwrap();
        let values: Values = [("age", n)].into_iter().collect();
        prop_assert_eq!(schema.validate(&values).is_ok(), (18..=120).contains(&n));
    }
}

#[test]
fn range_edges() {
    let schema = compile(&[FieldDescriptor::new(
        "age",
        "Age",
        FieldKind::number_between(18.0, 120.0),
    )])
    .unwrap();
    let check = |n: i32| {
        let values: Values = [("age", n)].into_iter().collect();
        schema.validate(&values).err().and_then(|e| e.message("age"))
    };
    assert_eq!(check(17).as_deref(), Some("Minimum value is 18"));
    assert_eq!(check(121).as_deref(), Some("Maximum value is 120"));
    assert_eq!(check(18), None);
    assert_eq!(check(120), None);
}
