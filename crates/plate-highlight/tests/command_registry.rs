use std::sync::{Arc, Mutex};

use plate_highlight::{
    Command, CommandError, CommandRegistry, Document, Editor, ExecuteOptions, HIGHLIGHT_ATTRIBUTE,
    HighlightCommand, HighlightConfig, HighlightPlugin, Node, NodeSchema, Position,
    REMOVE_HIGHLIGHT_COMMAND, Range, RegistryError, Selection,
};

fn setup(doc: Document, selection: Selection) -> (Editor, CommandRegistry) {
    let mut schema = NodeSchema::core();
    let mut registry = CommandRegistry::new();
    HighlightPlugin::default()
        .register(&mut schema, &mut registry)
        .unwrap();
    (Editor::new(doc, selection, Arc::new(schema)), registry)
}

fn value_of(registry: &CommandRegistry, id: &str) -> Option<serde_json::Value> {
    registry.get(id).and_then(|c| c.value().cloned())
}

#[test]
fn registry_exposes_default_options() {
    let (_, registry) = setup(
        Document::new(vec![Node::paragraph("")]),
        Selection::collapsed(Position::new(vec![0], 0)),
    );
    assert_eq!(
        registry.ids(),
        vec![
            "highlight.blue_marker",
            "highlight.green_marker",
            "highlight.green_pen",
            "highlight.pink_marker",
            "highlight.red_pen",
            "highlight.remove",
            "highlight.yellow_marker",
        ]
    );
}

#[test]
fn execute_then_refresh_all_tracks_active_option() {
    let (mut editor, mut registry) = setup(
        Document::new(vec![Node::paragraph("Hello world")]),
        Selection::single(Range::in_block(vec![0], 0, 5)),
    );

    registry.refresh_all(&editor);
    assert_eq!(value_of(&registry, "highlight.yellow_marker"), None);
    assert!(registry.get("highlight.yellow_marker").unwrap().is_enabled());

    registry
        .execute("highlight.yellow_marker", &mut editor, ExecuteOptions::default())
        .unwrap();
    registry.refresh_all(&editor);

    assert_eq!(
        value_of(&registry, "highlight.yellow_marker"),
        Some(serde_json::json!("yellow_marker"))
    );
    assert_eq!(value_of(&registry, "highlight.red_pen"), None);
    assert_eq!(
        value_of(&registry, "highlight.remove"),
        Some(serde_json::json!("yellow_marker"))
    );

    registry
        .execute("highlight.red_pen", &mut editor, ExecuteOptions::default())
        .unwrap();
    registry.refresh_all(&editor);
    assert_eq!(value_of(&registry, "highlight.yellow_marker"), None);
    assert_eq!(
        value_of(&registry, "highlight.red_pen"),
        Some(serde_json::json!("red_pen"))
    );
}

#[test]
fn change_listener_drives_refresh() {
    let (mut editor, mut registry) = setup(
        Document::new(vec![Node::paragraph("Hello")]),
        Selection::single(Range::in_block(vec![0], 0, 5)),
    );

    let versions = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&versions);
    editor.subscribe(move |event| sink.lock().unwrap().push(event.version));

    let id = "highlight.green_marker";
    registry
        .execute(id, &mut editor, ExecuteOptions::default())
        .unwrap();
    assert_eq!(*versions.lock().unwrap(), vec![1]);

    registry.refresh_all(&editor);
    assert_eq!(
        value_of(&registry, id),
        Some(serde_json::json!("green_marker"))
    );

    assert!(editor.undo());
    assert_eq!(*versions.lock().unwrap(), vec![1, 2]);
    registry.refresh_all(&editor);
    assert_eq!(value_of(&registry, id), None);
}

#[test]
fn caret_in_code_block_disables_every_option() {
    let (editor, mut registry) = setup(
        Document::new(vec![
            Node::paragraph("text"),
            Node::element("code_block", vec![Node::text("code")]),
        ]),
        Selection::collapsed(Position::new(vec![1], 2)),
    );

    registry.refresh_all(&editor);
    for id in registry.ids() {
        assert!(!registry.get(id).unwrap().is_enabled(), "{id} should be disabled");
    }
}

#[test]
fn unknown_command_is_an_error() {
    let (mut editor, registry) = setup(
        Document::new(vec![Node::paragraph("x")]),
        Selection::collapsed(Position::new(vec![0], 0)),
    );
    let err = registry
        .execute("highlight.purple", &mut editor, ExecuteOptions::default())
        .unwrap_err();
    assert_eq!(err, CommandError::Unknown("highlight.purple".to_string()));
}

#[test]
fn custom_config_registers_its_options() {
    let config = HighlightConfig::from_json_str(
        &serde_json::json!({
            "options": [
                { "model": "orange", "title": "Orange", "color": "#ff9900", "kind": "marker" }
            ]
        })
        .to_string(),
    )
    .unwrap();

    let mut schema = NodeSchema::core();
    let mut registry = CommandRegistry::new();
    HighlightPlugin::new(config)
        .register(&mut schema, &mut registry)
        .unwrap();
    assert_eq!(registry.ids(), vec!["highlight.orange", "highlight.remove"]);
}

#[test]
fn command_id_follows_option_model() {
    let command = HighlightCommand::new("yellow_marker");
    assert_eq!(command.id(), "highlight.yellow_marker");
    assert_eq!(command.attribute_value(), "yellow_marker");
    assert!(!command.is_active());
    assert!(!command.is_enabled());
}

#[test]
fn register_wires_schema_and_rejects_duplicates() {
    let mut schema = NodeSchema::core();
    let mut registry = CommandRegistry::new();
    HighlightPlugin::default()
        .register(&mut schema, &mut registry)
        .unwrap();

    assert_eq!(registry.len(), 7);
    assert!(registry.get(REMOVE_HIGHLIGHT_COMMAND).is_some());
    assert!(
        schema
            .spec("heading")
            .unwrap()
            .text_attributes
            .contains(&HIGHLIGHT_ATTRIBUTE.to_string())
    );
    assert!(schema.spec("code_block").unwrap().text_attributes.is_empty());

    let err = HighlightPlugin::default()
        .register(&mut schema, &mut registry)
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateCommand("highlight.yellow_marker".into())
    );
}
