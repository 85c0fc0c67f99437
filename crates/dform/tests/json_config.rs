//! Forms loaded from JSON configuration documents.

use dform::prelude::*;
use dform::{ConfigError, MemorySource};

const SIGNUP: &str = r##"{
    "fields": [
        { "name": "email", "label": "Email", "type": "email" },
        { "name": "password", "label": "Password", "type": "password", "minLength": 8,
          "validation": [ { "rule": "hasUppercase", "message": "Add an uppercase letter" } ] },
        { "name": "plan", "label": "Plan", "type": "select",
          "options": [ "free", { "value": "pro", "label": "Pro plan" } ] },
        { "name": "seats", "label": "Seats", "type": "number", "min": 1, "step": 1,
          "showWhen": { "field": "plan", "operator": "equals", "value": "pro" } },
        { "name": "interests", "label": "Interests", "type": "checkbox-group",
          "options": [ "rust", "go", "zig" ], "maxSelection": 2, "required": false },
        { "name": "avatar", "label": "Avatar", "type": "file", "accept": "image/*",
          "maxSize": 1048576, "preview": true, "required": false },
        { "name": "color", "label": "Favourite colour", "type": "color", "defaultValue": "#ff8800" },
        { "name": "terms", "label": "Terms", "type": "checkbox" }
    ],
    "defaultValues": { "plan": "free" },
    "steps": [
        { "title": "Account", "fields": [ "email", "password" ], "validate": true },
        { "title": "Plan", "fields": [ "plan", "seats", "interests" ] },
        { "title": "Profile", "fields": [ "avatar", "color", "terms" ] }
    ]
}"##;

fn signup() -> (FormEngine, StepNavigator) {
    let config = FormConfig::from_json_str(SIGNUP).unwrap();
    let form = FormEngine::from_config(&config).unwrap();
    (form, StepNavigator::from_config(&config))
}

#[test]
fn defaults_and_visibility_from_json() {
    let (form, nav) = signup();
    assert_eq!(form.value("plan"), &FieldValue::from("free"));
    assert_eq!(form.value("color"), &FieldValue::from("#ff8800"));
    assert!(!form.is_visible("seats"));
    assert_eq!(nav.len(), 3);
}

#[test]
fn walk_through_steps_and_submit() {
    let (mut form, mut nav) = signup();

    let StepMove::Blocked(errors) = nav.next(&mut form) else {
        panic!("account step should block");
    };
    assert_eq!(errors.len(), 2);

    form.set_value("email", "ada@example.com").unwrap();
    form.set_value("password", "lowercase1").unwrap();
    assert!(matches!(nav.next(&mut form), StepMove::Blocked(_)));
    assert_eq!(form.error("password").as_deref(), Some("Add an uppercase letter"));

    form.set_value("password", "Uppercase1").unwrap();
    assert_eq!(nav.next(&mut form), StepMove::Moved(1));

    form.set_value("plan", "pro").unwrap();
    form.set_value("seats", "2.5").unwrap();
    form.set_value("interests", vec!["rust", "go", "zig"]).unwrap();
    assert_eq!(nav.next(&mut form), StepMove::Moved(2));

    assert!(!form.validate());
    assert_eq!(form.error("seats").as_deref(), Some("Must be a multiple of 1"));
    assert_eq!(
        form.error("interests").as_deref(),
        Some("Select at most 2 option(s)")
    );
    assert_eq!(form.error("terms").as_deref(), Some("Terms is required"));

    form.set_value("seats", 3).unwrap();
    form.set_value("interests", vec!["rust"]).unwrap();
    form.set_value("terms", "true").unwrap();

    let mut submitted = None;
    let outcome = pollster::block_on(form.submit(|values| {
        submitted = Some(values.to_json());
        async { Ok::<(), String>(()) }
    }))
    .unwrap();
    assert!(outcome.is_success());
    let submitted = submitted.unwrap();
    assert_eq!(submitted["seats"], serde_json::json!(3.0));
    assert_eq!(submitted["terms"], serde_json::json!(true));
    assert_eq!(submitted["plan"], serde_json::json!("pro"));
}

#[test]
fn avatar_preview_from_json_descriptor() {
    let (mut form, _) = signup();
    let job = form
        .select_files("avatar", vec![FileHandle::new("me.png", "image/png", 2)])
        .unwrap()
        .unwrap();
    let report = pollster::block_on(job.run(&MemorySource::new().with_file("me.png", b"hi".to_vec())));
    assert_eq!(report.written, 1);
    assert_eq!(form.previews("avatar")[0].url(), Some("data:image/png;base64,aGk="));

    form.select_files("avatar", vec![FileHandle::new("doc.pdf", "application/pdf", 2)])
        .unwrap();
    form.validate();
    assert_eq!(
        form.error("avatar").as_deref(),
        Some("Invalid file type. Accepted: image/*")
    );
}

#[test]
fn invalid_documents_are_config_errors() {
    let cycle = r#"{ "fields": [
        { "name": "a", "label": "A", "type": "text", "showWhen": { "field": "b", "value": "x" } },
        { "name": "b", "label": "B", "type": "text", "showWhen": { "field": "a", "value": "y" } }
    ] }"#;
    let config = FormConfig::from_json_str(cycle);
    assert!(matches!(config, Err(ConfigError::VisibilityCycle { .. })));

    let bad_pattern = r#"{ "fields": [
        { "name": "zip", "label": "Zip", "type": "text", "pattern": "([0-9" }
    ] }"#;
    let config = FormConfig::from_json_str(bad_pattern).unwrap();
    assert!(matches!(
        FormEngine::from_config(&config),
        Err(ConfigError::InvalidPattern { .. })
    ));

    let unknown_kind = r#"{ "fields": [ { "name": "x", "label": "X", "type": "hologram" } ] }"#;
    assert!(matches!(
        FormConfig::from_json_str(unknown_kind),
        Err(ConfigError::Parse(_))
    ));
}
