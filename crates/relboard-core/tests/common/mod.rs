//! Fixtures shared by the scenario tests: a film catalog with a cast join
//! table. Pages are declared as configuration, the way a deployment would.

#![allow(dead_code)]

use relboard_config::PageConfig;
use relboard_core::{
    attribute::AttributeId,
    page::Page,
    service::{MemoryDataService, Row},
};
use serde_json::{Value as JsonValue, json};

fn pk() -> JsonValue {
    json!({"type": "integer", "format": "bigint", "description": "Note:\nThis is a Primary Key.<pk/>"})
}

fn fk(table: &str) -> JsonValue {
    json!({
        "type": "integer",
        "format": "bigint",
        "description": format!("<fk table='{table}' column='id'/>")
    })
}

fn text() -> JsonValue {
    json!({"type": "string", "format": "text"})
}

pub fn metadata() -> JsonValue {
    json!({
        "definitions": {
            "films": {"properties": {
                "id": pk(),
                "title": text(),
                "studio_id": fk("studios"),
                "notes": {"type": "string", "format": "jsonb"},
                "user": text()
            }},
            "studios": {"properties": {"id": pk(), "name": text()}},
            "actors": {"properties": {"id": pk(), "name": text()}},
            "casts": {"properties": {
                "id": pk(),
                "film_id": fk("films"),
                "actor_id": fk("actors")
            }}
        }
    })
}

/// Backend rows from a JSON array of objects.
pub fn rows(json: JsonValue) -> Vec<Row> {
    json.as_array()
        .into_iter()
        .flatten()
        .filter_map(|row| row.as_object().cloned())
        .collect()
}

pub fn service() -> MemoryDataService {
    let service = MemoryDataService::new(metadata()).unwrap();
    service.seed(
        "studios",
        rows(json!([
            {"id": 1, "name": "Brandywine"},
            {"id": 2, "name": "Forward Pass"}
        ])),
    );
    service.seed(
        "actors",
        rows(json!([
            {"id": 1, "name": "A"},
            {"id": 2, "name": "B"},
            {"id": 3, "name": "C"}
        ])),
    );
    service.seed(
        "films",
        rows(json!([
            {"id": 10, "title": "X", "studio_id": 1, "notes": {"cut": "final"}, "user": "u-1"},
            {"id": 11, "title": "Y", "studio_id": 2, "notes": null, "user": "u-1"}
        ])),
    );
    service.seed(
        "casts",
        rows(json!([
            {"id": 1, "film_id": 10, "actor_id": 1},
            {"id": 2, "film_id": 10, "actor_id": 2},
            {"id": 3, "film_id": 11, "actor_id": 1}
        ])),
    );

    service
}

pub fn id(text: &str) -> AttributeId {
    AttributeId::parse(text).unwrap()
}

/// The `films` page declaring `attributes`, given as configuration JSON.
pub fn films_page(attributes: JsonValue) -> Page {
    let config: PageConfig = serde_json::from_value(json!({
        "name": "Films",
        "table_id": "films",
        "attributes": attributes
    }))
    .unwrap();

    Page::try_from(&config).unwrap()
}
