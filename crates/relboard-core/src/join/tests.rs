use super::*;
use crate::{
    attribute::AttributeKind,
    service::{ServiceOp, TransportError},
    test_support::{attribute, cinema_catalog, cinema_service, films_page, id, page},
    value::Value,
};

#[test]
fn targets_are_grouped_by_outermost_relation() {
    let page = page(
        "films",
        vec![
            attribute("title", "Title", AttributeKind::Text),
            attribute("actors(name)", "Actors", AttributeKind::Join),
            attribute("directors(name)", "Director", AttributeKind::Join),
            attribute("actors(agencies(name))", "Agencies", AttributeKind::Join),
            attribute("actors(name)", "Again", AttributeKind::Join),
        ],
    );

    assert_eq!(
        join_targets(&page),
        vec![
            ("actors".to_string(), vec![id("name"), id("agencies(name)")]),
            ("directors".to_string(), vec![id("name")]),
        ]
    );
}

#[test]
fn self_references_are_ignored() {
    let page = page("films", vec![attribute("films(title)", "Sequel", AttributeKind::Join)]);

    assert!(join_targets(&page).is_empty());
}

#[tokio::test]
async fn options_carry_cardinality_and_keys() {
    let service = cinema_service();
    let catalog = cinema_catalog();

    let load = JoinDataLoader::new(&service, &catalog)
        .load_options(&films_page())
        .await
        .unwrap();

    assert!(load.is_complete());
    let actors = &load.options["actors"];
    assert_eq!(actors.cardinality, Cardinality::Multi);
    assert_eq!(actors.candidates.len(), 3);
    assert_eq!(actors.candidates[0].column("name"), Some(&Value::from("Sigourney Weaver")));
    assert_eq!(actors.candidates[0].column("id"), Some(&Value::Int(1)));

    let directors = &load.options["directors"];
    assert_eq!(directors.cardinality, Cardinality::Single);
    assert_eq!(directors.candidates.len(), 2);
}

#[tokio::test]
async fn one_failed_target_keeps_the_others() {
    let service = cinema_service();
    let catalog = cinema_catalog();
    service.fail("actors", ServiceOp::Select);

    let load = JoinDataLoader::new(&service, &catalog)
        .load_options(&films_page())
        .await
        .unwrap();

    assert!(!load.is_complete());
    assert!(load.options.contains_key("directors"));
    assert!(!load.options.contains_key("actors"));
    assert_eq!(
        load.error(),
        Some(TransportError::new("actors: select on 'actors' failed"))
    );
    // both fetches were issued
    assert_eq!(service.calls().len(), 2);
}

#[tokio::test]
async fn nested_option_paths_fetch_their_own_keys() {
    let service = cinema_service();
    let catalog = cinema_catalog();
    let page = page(
        "films",
        vec![attribute("actors(agencies(name))", "Agency", AttributeKind::Join)],
    );

    JoinDataLoader::new(&service, &catalog)
        .load_options(&page)
        .await
        .unwrap();

    assert_eq!(service.calls()[0].detail, "select=agencies(id,name),id");
}

#[tokio::test]
async fn missing_key_on_target_fails_before_any_request() {
    let service = cinema_service();
    let catalog = cinema_catalog();
    let page = page("films", vec![attribute("tags(label)", "Tags", AttributeKind::Join)]);

    let err = JoinDataLoader::new(&service, &catalog)
        .load_options(&page)
        .await
        .unwrap_err();

    assert!(matches!(err, SchemaInferenceError::MissingPrimaryKey { .. }));
    assert!(service.calls().is_empty());
}
