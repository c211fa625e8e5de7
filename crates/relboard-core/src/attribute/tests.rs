use super::*;
use relboard_config::{AttributeConfig, AttributeType};

fn config(id: &str, kind: AttributeType) -> AttributeConfig {
    AttributeConfig {
        id: id.to_string(),
        label: String::new(),
        required: false,
        readonly: false,
        hidden: false,
        kind,
        enum_options: vec!["a".to_string()],
    }
}

#[test]
fn plain_column_has_no_relations() {
    let id = AttributeId::parse("title").unwrap();

    assert!(!id.is_nested());
    assert_eq!(id.column_name(), "title");
    assert_eq!(id.owning_table("films"), "films");
}

#[test]
fn nested_identifier_parses_outermost_first() {
    let id = AttributeId::parse("actors(agency(name))").unwrap();

    assert_eq!(id.relations(), ["actors", "agency"]);
    assert_eq!(id.column_name(), "name");
    assert_eq!(id.innermost_table(), Some("agency"));
    assert_eq!(id.outermost_relation(), Some("actors"));
    assert_eq!(id.depth(), 2);
}

#[test]
fn display_reproduces_canonical_text() {
    for text in ["title", "actors(name)", "actors(agency(name))"] {
        assert_eq!(AttributeId::parse(text).unwrap().to_string(), text);
    }
}

#[test]
fn whitespace_around_segments_is_ignored() {
    let id = AttributeId::parse(" actors ( name ) ").unwrap();

    assert_eq!(id.to_string(), "actors(name)");
}

#[test]
fn malformed_identifiers_are_rejected() {
    assert_eq!(AttributeId::parse(""), Err(AttributeIdError::Empty));
    assert!(matches!(
        AttributeId::parse("actors(name"),
        Err(AttributeIdError::Unbalanced { .. })
    ));
    assert!(matches!(
        AttributeId::parse("actors(name))"),
        Err(AttributeIdError::Unbalanced { .. })
    ));
    assert!(matches!(
        AttributeId::parse("actors(name)x"),
        Err(AttributeIdError::TrailingText { .. })
    ));
    assert!(matches!(
        AttributeId::parse("(name)"),
        Err(AttributeIdError::InvalidSegment { .. })
    ));
    assert!(matches!(
        AttributeId::parse("actors()"),
        Err(AttributeIdError::InvalidSegment { .. })
    ));
    assert!(matches!(
        AttributeId::parse("actors(id,name)"),
        Err(AttributeIdError::InvalidSegment { .. })
    ));
}

#[test]
fn three_hops_exceed_the_join_depth() {
    let err = AttributeId::parse("a(b(c(d)))").unwrap_err();

    assert_eq!(
        err,
        AttributeIdError::TooDeep {
            id: "a(b(c(d)))".to_string(),
            depth: 3,
            max: crate::MAX_JOIN_DEPTH,
        }
    );
}

#[test]
fn strip_outer_reroots_at_the_first_relation() {
    let id = AttributeId::parse("actors(agency(name))").unwrap();

    assert_eq!(id.strip_outer().unwrap().to_string(), "agency(name)");
    assert_eq!(AttributeId::column("title").strip_outer(), None);
}

#[test]
fn identifiers_serialize_as_text() {
    let id = AttributeId::parse("actors(name)").unwrap();
    let json = serde_json::to_string(&id).unwrap();

    assert_eq!(json, r#""actors(name)""#);
    assert_eq!(serde_json::from_str::<AttributeId>(&json).unwrap(), id);
}

#[test]
fn nested_descriptor_is_always_a_join() {
    let descriptor = AttributeDescriptor::try_from(&config("actors(name)", AttributeType::Text))
        .unwrap();

    assert!(descriptor.is_join());
    assert_eq!(descriptor.label, "actors(name)");
}

#[test]
fn join_type_on_plain_column_is_rejected() {
    let err = AttributeDescriptor::try_from(&config("director", AttributeType::Join)).unwrap_err();

    assert!(matches!(err, AttributeIdError::NotAJoinPath { .. }));
}

#[test]
fn enum_descriptor_keeps_its_options() {
    let descriptor = AttributeDescriptor::try_from(&config("status", AttributeType::Enum)).unwrap();

    assert_eq!(
        descriptor.kind,
        AttributeKind::Enum {
            options: vec!["a".to_string()]
        }
    );
}
