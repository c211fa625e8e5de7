//! Shared fixtures for unit tests: a small cinema schema in backend metadata form.

use crate::{
    attribute::{AttributeDescriptor, AttributeId, AttributeKind},
    page::Page,
    schema::SchemaCatalog,
    service::{MemoryDataService, Row},
};
use relboard_config::DisplayMode;
use serde_json::{Value as JsonValue, json};

const PK: &str = "Note:\nThis is a Primary Key.<pk/>";

fn fk(table: &str) -> String {
    format!("Note:\nThis is a Foreign Key to `{table}.id`.<fk table='{table}' column='id'/>")
}

/// films ─▶ directors, films ◀─ reviews, films ◀─ film_actors ─▶ actors ─▶ agencies.
pub(crate) fn cinema_metadata() -> JsonValue {
    json!({
        "swagger": "2.0",
        "definitions": {
            "films": {"properties": {
                "id": {"type": "integer", "format": "bigint", "description": PK},
                "title": {"type": "string", "format": "text"},
                "director_id": {"type": "integer", "format": "bigint", "description": fk("directors")},
                "settings": {"type": "string", "format": "jsonb"},
                "rating": {"type": "string", "format": "text"},
                "user": {"type": "string", "format": "uuid"}
            }},
            "directors": {"properties": {
                "id": {"type": "integer", "format": "bigint", "description": PK},
                "name": {"type": "string", "format": "text"}
            }},
            "actors": {"properties": {
                "id": {"type": "integer", "format": "bigint", "description": PK},
                "name": {"type": "string", "format": "text"},
                "agency_id": {"type": "integer", "format": "bigint", "description": fk("agencies")}
            }},
            "agencies": {"properties": {
                "id": {"type": "integer", "format": "bigint", "description": PK},
                "name": {"type": "string", "format": "text"}
            }},
            "film_actors": {"properties": {
                "id": {"type": "integer", "format": "bigint", "description": PK},
                "film_id": {"type": "integer", "format": "bigint", "description": fk("films")},
                "actor_id": {"type": "integer", "format": "bigint", "description": fk("actors")}
            }},
            "reviews": {"properties": {
                "id": {"type": "integer", "format": "bigint", "description": PK},
                "body": {"type": "string", "format": "text"},
                "film_id": {"type": "integer", "format": "bigint", "description": fk("films")}
            }},
            "tags": {"properties": {
                "label": {"type": "string", "format": "text"}
            }}
        }
    })
}

pub(crate) fn cinema_catalog() -> SchemaCatalog {
    SchemaCatalog::from_metadata(&cinema_metadata()).unwrap()
}

/// Backend row from a JSON object literal.
pub(crate) fn row(json: JsonValue) -> Row {
    match json {
        JsonValue::Object(map) => map,
        other => panic!("row fixture must be an object, got {other}"),
    }
}

/// Memory backend over the cinema schema with a few films already stored.
pub(crate) fn cinema_service() -> MemoryDataService {
    let service = MemoryDataService::new(cinema_metadata()).unwrap();

    service.seed(
        "directors",
        [
            row(json!({"id": 1, "name": "Ridley Scott"})),
            row(json!({"id": 2, "name": "Michael Mann"})),
        ],
    );
    service.seed(
        "agencies",
        [
            row(json!({"id": 1, "name": "CAA"})),
            row(json!({"id": 2, "name": "WME"})),
        ],
    );
    service.seed(
        "actors",
        [
            row(json!({"id": 1, "name": "Sigourney Weaver", "agency_id": 1})),
            row(json!({"id": 2, "name": "Tom Skerritt", "agency_id": 2})),
            row(json!({"id": 3, "name": "Al Pacino", "agency_id": 1})),
        ],
    );
    service.seed(
        "films",
        [
            row(json!({"id": 1, "title": "Alien", "director_id": 1, "settings": {"theme": "dark"}, "rating": "R", "user": "u-1"})),
            row(json!({"id": 2, "title": "Heat", "director_id": 2, "settings": null, "rating": "R", "user": "u-1"})),
            row(json!({"id": 3, "title": "Gladiator", "director_id": 1, "settings": null, "rating": "R", "user": "u-2"})),
        ],
    );
    service.seed(
        "film_actors",
        [
            row(json!({"id": 1, "film_id": 1, "actor_id": 1})),
            row(json!({"id": 2, "film_id": 1, "actor_id": 2})),
            row(json!({"id": 3, "film_id": 2, "actor_id": 3})),
        ],
    );
    service.seed(
        "reviews",
        [
            row(json!({"id": 1, "body": "Terrifying", "film_id": 1})),
            row(json!({"id": 2, "body": "Tense", "film_id": 2})),
        ],
    );

    service
}

pub(crate) fn id(text: &str) -> AttributeId {
    AttributeId::parse(text).unwrap()
}

pub(crate) fn attribute(text: &str, label: &str, kind: AttributeKind) -> AttributeDescriptor {
    let id = id(text);
    let kind = if id.is_nested() { AttributeKind::Join } else { kind };

    AttributeDescriptor {
        id,
        label: label.to_string(),
        required: false,
        readonly: false,
        hidden: false,
        kind,
    }
}

pub(crate) fn page(table_id: &str, attributes: Vec<AttributeDescriptor>) -> Page {
    Page {
        page_id: table_id.to_string(),
        name: table_id.to_string(),
        table_id: table_id.to_string(),
        mode: DisplayMode::List,
        readonly: false,
        attributes,
        triggers: Vec::new(),
    }
}

/// `films` with a title, its actors and its director.
pub(crate) fn films_page() -> Page {
    page(
        "films",
        vec![
            attribute("title", "Title", AttributeKind::Text),
            attribute("actors(name)", "Actors", AttributeKind::Join),
            attribute("directors(name)", "Director", AttributeKind::Join),
        ],
    )
}
