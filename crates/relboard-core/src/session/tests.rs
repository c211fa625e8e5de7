use super::*;
use crate::{
    cache::MemoryPageRepository,
    item::Item,
    mutation::MutationStage,
    query::{Conjunction, Filter, Sort},
    service::{MemoryDataService, ServiceOp},
    test_support::{cinema_service, id, row},
    value::Value,
};
use serde_json::json;

const CINEMA_TOML: &str = r#"
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

[[pages.attributes]]
id = "directors(name)"
label = "Director"

[[pages]]
name = "Profile"
page_id = "profile"
table_id = "directors"
mode = "single"

[[pages.attributes]]
id = "name"
label = "Name"
"#;

type TestDashboard = Dashboard<MemoryDataService, MemoryPageRepository>;

fn unloaded() -> TestDashboard {
    let config = DashboardConfig::from_toml_str(CINEMA_TOML).unwrap();

    Dashboard::new(&config, cinema_service(), MemoryPageRepository::new()).unwrap()
}

async fn dashboard() -> TestDashboard {
    let mut dashboard = unloaded();
    dashboard.load_schema().await.unwrap();
    dashboard.load_page("films").await.unwrap();
    dashboard.service().clear_calls();

    dashboard
}

fn titles(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.column("title").and_then(Value::as_text))
        .map(ToString::to_string)
        .collect()
}

//
// Dashboard
//

#[tokio::test]
async fn schema_failure_leaves_catalog_unset() {
    let mut dashboard = unloaded();
    dashboard.service().fail_metadata();

    let err = dashboard.load_schema().await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::Transport);
    assert!(dashboard.catalog().is_none());
    assert_eq!(
        dashboard.warning().map(|warning| warning.class),
        Some(ErrorClass::Transport)
    );
    assert!(matches!(
        dashboard.load_page("films").await,
        Err(Error::SchemaInference(
            SchemaInferenceError::CatalogUnavailable
        ))
    ));

    let mut session = dashboard.session("films").unwrap();
    session.get_items().await;
    assert_eq!(
        session.warning().map(|warning| warning.class),
        Some(ErrorClass::SchemaInference)
    );
}

#[tokio::test]
async fn load_page_caches_scoped_rows_count_and_options() {
    let dashboard = dashboard().await;

    let snapshot = dashboard.repository().get("films").unwrap();
    assert_eq!(titles(&snapshot.rows), vec!["Alien", "Heat"]);
    assert_eq!(snapshot.total_count, 2);
    assert_eq!(
        snapshot.join_options.keys().collect::<Vec<_>>(),
        vec!["actors", "directors"]
    );

    let alien = &snapshot.rows[0];
    assert_eq!(
        alien.get(&id("actors(name)")),
        Some(&Value::from(vec!["Sigourney Weaver", "Tom Skerritt"]))
    );
    assert_eq!(alien.get(&id("directors(id)")), Some(&Value::Int(1)));
}

#[tokio::test]
async fn unknown_pages_are_reported() {
    let dashboard = dashboard().await;

    assert!(matches!(
        dashboard.session("reviews"),
        Err(Error::UnknownPage { .. })
    ));
}

#[tokio::test]
async fn option_failure_still_caches_rows() {
    let dashboard = dashboard().await;
    dashboard.service().fail("actors", ServiceOp::Select);

    let err = dashboard.load_page("films").await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::Transport);
    let snapshot = dashboard.repository().get("films").unwrap();
    assert_eq!(snapshot.rows.len(), 2);
    assert!(!snapshot.join_options.contains_key("actors"));
    assert!(snapshot.join_options.contains_key("directors"));
}

#[tokio::test]
async fn reload_all_settles_every_page() {
    let dashboard = dashboard().await;
    dashboard.service().fail("directors", ServiceOp::Select);

    assert!(dashboard.reload_all().await.is_err());

    // the films page still reloaded, only its director options failed
    assert_eq!(dashboard.repository().get("films").unwrap().rows.len(), 2);
    assert!(dashboard.repository().get("profile").is_none());
}

//
// Session reads
//

#[tokio::test]
async fn sessions_hand_out_copies() {
    let dashboard = dashboard().await;
    let mut session = dashboard.session("films").unwrap();

    session.items_mut()[0].insert(id("title"), "Edited");

    assert!(session.have_unsaved_changes());
    let fresh = dashboard.session("films").unwrap();
    assert_eq!(titles(fresh.items()), vec!["Alien", "Heat"]);
    assert!(!fresh.have_unsaved_changes());
}

#[tokio::test]
async fn empty_single_page_gets_one_blank_item() {
    let dashboard = dashboard().await;

    let session = dashboard.session("profile").unwrap();

    assert_eq!(session.items(), &[Item::new()]);
    assert_eq!(session.max_pagination(), 1);
}

#[tokio::test]
async fn get_item_replaces_items_with_one_row() {
    let dashboard = dashboard().await;
    let mut session = dashboard.session("films").unwrap();

    session.get_item(2_i64).await;
    assert_eq!(titles(session.items()), vec!["Heat"]);
    assert!(session.warning().is_none());

    session.get_item(99_i64).await;
    assert_eq!(titles(session.items()), vec!["Heat"]);
    assert_eq!(
        session.warning().map(|warning| warning.class),
        Some(ErrorClass::Input)
    );

    session.clear_warning();
    assert!(session.warning().is_none());
}

#[tokio::test]
async fn filtering_recounts_and_resets_to_first_page() {
    let dashboard = dashboard().await;
    let mut session = dashboard.session("films").unwrap();

    session
        .filter_items(
            vec![Filter::eq("title", "Heat"), Filter::eq("title", "Gladiator")],
            Conjunction::Or,
            vec![Sort::desc("title")],
        )
        .await;

    assert_eq!(titles(session.items()), vec!["Heat"]);
    assert_eq!(session.items_count(), 1);
    assert_eq!(session.page_number(), 1);
    assert_eq!(
        dashboard.service().calls()[0].detail,
        "select=title,actors(id,name),directors(id,name),id\
         &user=eq.u-1&or=(title.eq.Heat,title.eq.Gladiator)&order=title.desc"
    );
}

#[tokio::test]
async fn paging_reuses_the_known_count() {
    let dashboard = dashboard().await;
    let mut session = dashboard.session("films").unwrap();
    dashboard.service().seed(
        "films",
        [row(json!({"id": 4, "title": "Thief", "director_id": 2, "user": "u-1"}))],
    );

    session.set_page(2).await;
    assert!(session.items().is_empty());
    assert_eq!(session.page_number(), 2);

    session.set_page(1).await;
    assert_eq!(titles(session.items()), vec!["Alien", "Heat", "Thief"]);
    assert_eq!(session.items_count(), 2);
}

#[tokio::test]
async fn paging_far_past_the_end_is_empty() {
    let dashboard = dashboard().await;
    let mut session = dashboard.session("films").unwrap();

    session.set_page(u64::MAX).await;

    assert!(session.items().is_empty());
    assert!(session.warning().is_none());
    assert_eq!(session.items_count(), 2);
}

//
// Session writes
//

#[tokio::test]
async fn upsert_reloads_and_clears_unsaved_changes() {
    let dashboard = dashboard().await;
    let mut session = dashboard.session("films").unwrap();
    session.mark_changed();

    let mut item = Item::new();
    item.insert(id("title"), "Aliens");
    item.insert(id("actors(id)"), vec![1_i64]);
    item.insert(id("directors(id)"), 1_i64);

    let report = session.upsert_item(&item).await.unwrap();

    assert_eq!(report.key, Value::Int(4));
    assert_eq!(report.stages.last(), Some(&MutationStage::Reloading));
    assert_eq!(session.stage(), MutationStage::Idle);
    assert!(!session.have_unsaved_changes());
    assert_eq!(titles(session.items()), vec!["Alien", "Heat", "Aliens"]);
    assert_eq!(session.items_count(), 3);

    let stored = dashboard.service().rows("films");
    assert_eq!(stored[3].get("user"), Some(&json!("u-1")));
    assert_eq!(dashboard.repository().get("films").unwrap().total_count, 3);
}

#[tokio::test]
async fn failed_validation_becomes_a_warning() {
    let dashboard = dashboard().await;
    let mut session = dashboard.session("films").unwrap();

    let mut item = Item::new();
    item.insert(id("actors(id)"), vec![1_i64]);

    assert!(session.upsert_item(&item).await.is_none());
    assert_eq!(session.stage(), MutationStage::Failed);
    assert_eq!(
        session.warning(),
        Some(&Warning {
            class: ErrorClass::Validation,
            message: "Title needs to be filled".to_string(),
        })
    );
    assert!(dashboard.service().calls().is_empty());
}

#[tokio::test]
async fn partial_writes_are_surfaced() {
    let dashboard = dashboard().await;
    dashboard.service().fail("film_actors", ServiceOp::Insert);
    let mut session = dashboard.session("films").unwrap();

    let mut item = session.items()[0].clone();
    item.insert(id("actors(id)"), vec![3_i64]);

    assert!(session.upsert_item(&item).await.is_none());
    assert_eq!(
        session.warning().map(|warning| warning.class),
        Some(ErrorClass::PartialWrite)
    );
    assert_eq!(session.stage(), MutationStage::Failed);
}

#[tokio::test]
async fn delete_items_issues_one_disjunction() {
    let dashboard = dashboard().await;
    let mut session = dashboard.session("films").unwrap();

    session.delete_items(&[Value::Int(1), Value::Int(2)]).await;

    let calls = dashboard.service().calls();
    let deletes: Vec<_> = calls
        .iter()
        .filter(|call| call.op == ServiceOp::Delete)
        .collect();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].detail, "or=(id.eq.1,id.eq.2)");

    assert!(session.items().is_empty());
    assert_eq!(session.items_count(), 0);
    assert_eq!(dashboard.service().rows("films").len(), 1);
}
