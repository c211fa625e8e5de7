use super::*;

const FILMS_TOML: &str = r#"
name = "Cinema"

[scope]
column = "user"
value = "u-1"

[[pages]]
name = "Films"
table_id = "films"
mode = "card"

[[pages.attributes]]
id = "title"
label = "Title"
required = true

[[pages.attributes]]
id = "actors(name)"
label = "Actors"
type = "JOIN"

[[pages.attributes]]
id = "rating"
label = "Rating"
type = "ENUM"
enum_options = ["G", "PG"]
"#;

#[test]
fn toml_config_loads_pages_and_scope() {
    let config = DashboardConfig::from_toml_str(FILMS_TOML).unwrap();

    assert_eq!(config.name, "Cinema");
    assert_eq!(
        config.scope,
        Some(ScopeConfig {
            column: "user".to_string(),
            value: "u-1".to_string(),
        })
    );

    let page = config.page("films").unwrap();
    assert_eq!(page.mode, DisplayMode::Card);
    assert_eq!(page.attributes.len(), 3);
    assert_eq!(page.attributes[1].kind, AttributeType::Join);
    assert_eq!(page.attributes[2].enum_options, vec!["G", "PG"]);
}

#[test]
fn json_views_use_original_field_names() {
    let text = r#"{
        "views": [{
            "label": "Todo",
            "view_id": "todo",
            "table_id": "todos",
            "mode": "list",
            "readonly": false,
            "attributes": [
                {"id": "task", "label": "Task", "required": true, "type": "LONGTEXT"},
                {"id": "status", "type": "ENUM", "enumOptions": ["open", "done"]}
            ]
        }]
    }"#;
    let config = DashboardConfig::from_json_str(text).unwrap();

    let page = config.page("todo").unwrap();
    assert_eq!(page.name, "Todo");
    assert_eq!(page.attributes[0].kind, AttributeType::LongText);
    assert_eq!(page.attributes[1].display_label(), "status");
}

#[test]
fn unknown_attribute_type_falls_back_to_text() {
    let text = r#"{"pages": [{"name": "P", "table_id": "t",
        "attributes": [{"id": "a", "type": "COLOR"}]}]}"#;
    let config = DashboardConfig::from_json_str(text).unwrap();

    assert_eq!(config.pages[0].attributes[0].kind, AttributeType::Text);
}

#[test]
fn page_id_defaults_to_table_id() {
    let config = DashboardConfig::from_toml_str(FILMS_TOML).unwrap();

    assert_eq!(config.pages[0].page_id(), "films");
    assert_eq!(config.pages[0].mode.window_size(), 10);
}

#[test]
fn duplicate_page_ids_are_rejected() {
    let text = r#"{"pages": [
        {"name": "A", "table_id": "t", "attributes": [{"id": "a"}]},
        {"name": "B", "table_id": "t", "attributes": [{"id": "b"}]}
    ]}"#;
    let err = DashboardConfig::from_json_str(text).unwrap_err();

    assert!(matches!(err, ConfigError::DuplicatePageId { .. }));
}

#[test]
fn enum_without_options_is_rejected() {
    let text = r#"{"pages": [{"name": "A", "table_id": "t",
        "attributes": [{"id": "a", "type": "ENUM"}]}]}"#;
    let err = DashboardConfig::from_json_str(text).unwrap_err();

    assert!(matches!(err, ConfigError::EmptyEnumOptions { .. }));
}

#[test]
fn page_without_attributes_is_rejected() {
    let text = r#"{"pages": [{"name": "A", "table_id": "t"}]}"#;
    let err = DashboardConfig::from_json_str(text).unwrap_err();

    assert!(matches!(err, ConfigError::EmptyAttributes { .. }));
}

#[test]
fn load_rejects_unknown_extension() {
    let path = std::env::temp_dir().join("relboard-config-test.yaml");
    std::fs::write(&path, "pages: []").unwrap();

    let err = DashboardConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));

    std::fs::remove_file(&path).unwrap();
}
