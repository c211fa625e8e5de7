use crate::{
    Error,
    item::Item,
    mutation::{RelationWrite, WritePlan, validate_required},
    page::Page,
    query::MatchFilter,
    schema::SchemaCatalog,
    service::{Row, TabularDataService, TransportError},
    value::Value,
};
use futures::future::join_all;
use relboard_config::ScopeConfig;
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error as ThisError;
use tracing::{debug, warn};

///
/// MutationStage
///
/// `Idle → Validating → WritingMain → WritingRelations → Reloading → Idle`,
/// or `Failed` from any stage. There is no retry.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MutationStage {
    Idle,
    Validating,
    WritingMain,
    WritingRelations,
    Reloading,
    Failed,
}

impl fmt::Display for MutationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::WritingMain => "writing_main",
            Self::WritingRelations => "writing_relations",
            Self::Reloading => "reloading",
            Self::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

///
/// RelationWriteOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationWriteOutcome {
    pub table: String,
    pub result: Result<(), TransportError>,
}

///
/// PartialWriteError
///
/// The main row and some relation writes were committed, others were not.
/// Nothing is rolled back.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("{}", partial_message(outcomes))]
pub struct PartialWriteError {
    pub key: Value,
    pub outcomes: Vec<RelationWriteOutcome>,
}

impl PartialWriteError {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &TransportError)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.result {
            Ok(()) => None,
            Err(err) => Some((outcome.table.as_str(), err)),
        })
    }
}

fn partial_message(outcomes: &[RelationWriteOutcome]) -> String {
    let failed: Vec<String> = outcomes
        .iter()
        .filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .err()
                .map(|err| format!("{}: {err}", outcome.table))
        })
        .collect();

    format!(
        "{} of {} relation writes failed: {}",
        failed.len(),
        outcomes.len(),
        failed.join("; ")
    )
}

///
/// MutationReport
///

#[derive(Clone, Debug, PartialEq)]
pub struct MutationReport {
    pub key: Value,
    pub stages: Vec<MutationStage>,
    pub relations: Vec<RelationWriteOutcome>,
}

///
/// MutationError
///
/// A failed edit and the stage it failed in.
///

#[derive(Debug, ThisError)]
#[error("{source}")]
pub struct MutationError {
    pub stage: MutationStage,
    pub source: Error,
}

impl MutationError {
    fn at(stage: MutationStage, source: impl Into<Error>) -> Self {
        let source = source.into();
        warn!(%stage, error = %source, "mutation failed");

        Self { stage, source }
    }
}

///
/// MutationCoordinator
///
/// Executes one item edit as a step sequence: validation, the main-table
/// upsert, then every relation write concurrently. Reloading is left to the
/// caller, which owns the page cache.
///

pub struct MutationCoordinator<'a, S: ?Sized> {
    service: &'a S,
    catalog: &'a SchemaCatalog,
    scope: Option<&'a ScopeConfig>,
}

impl<'a, S> MutationCoordinator<'a, S>
where
    S: TabularDataService + ?Sized,
{
    #[must_use]
    pub const fn new(service: &'a S, catalog: &'a SchemaCatalog) -> Self {
        Self {
            service,
            catalog,
            scope: None,
        }
    }

    /// Stamp the scope column on every main-table write.
    #[must_use]
    pub const fn with_scope(mut self, scope: Option<&'a ScopeConfig>) -> Self {
        self.scope = scope;
        self
    }

    pub async fn upsert(
        &self,
        page: &Page,
        item: &Item,
    ) -> Result<MutationReport, MutationError> {
        let mut stages = Vec::with_capacity(4);

        // Phase 1: validation; no request is sent on failure.
        enter(&mut stages, MutationStage::Validating);
        let mut item = item.clone();
        validate_required(page, &mut item, self.catalog)
            .map_err(|err| MutationError::at(MutationStage::Validating, err))?;

        // Phase 2: the main row, adopting a generated key.
        enter(&mut stages, MutationStage::WritingMain);
        let plan = WritePlan::build(page, &item, self.catalog, self.scope)
            .map_err(|err| MutationError::at(MutationStage::WritingMain, err))?;
        let key = self
            .write_main(&plan)
            .await
            .map_err(|err| MutationError::at(MutationStage::WritingMain, err))?;

        // Phase 3: relation writes, settled together.
        enter(&mut stages, MutationStage::WritingRelations);
        let results = join_all(
            plan.relations
                .iter()
                .map(|write| self.write_relation(write, &key)),
        )
        .await;
        let relations: Vec<RelationWriteOutcome> = plan
            .relations
            .iter()
            .zip(results)
            .map(|(write, result)| RelationWriteOutcome {
                table: write.table().to_string(),
                result,
            })
            .collect();

        if relations.iter().any(|outcome| outcome.result.is_err()) {
            let err = PartialWriteError {
                key,
                outcomes: relations,
            };
            return Err(MutationError::at(MutationStage::WritingRelations, err));
        }

        Ok(MutationReport {
            key,
            stages,
            relations,
        })
    }

    async fn write_main(&self, plan: &WritePlan) -> Result<Value, TransportError> {
        let main = &plan.main;
        let stored = self
            .service
            .upsert(&main.table, vec![main.row.clone()])
            .await?;

        if let Some(key) = &main.key {
            return Ok(key.clone());
        }

        let key = stored
            .first()
            .and_then(|row| row.get(&main.key_column))
            .map(Value::from_json)
            .filter(|key| !key.is_null())
            .ok_or_else(|| {
                TransportError::new(format!(
                    "backend returned no '{}' for the new '{}' row",
                    main.key_column, main.table
                ))
            })?;
        debug!(table = %main.table, %key, "adopted generated key");

        Ok(key)
    }

    async fn write_relation(
        &self,
        write: &RelationWrite,
        key: &Value,
    ) -> Result<(), TransportError> {
        match write {
            RelationWrite::Reassign {
                table,
                fk_column,
                key_column,
                selected,
            } => {
                let cleared = single(fk_column, JsonValue::Null);
                self.service
                    .update(table, cleared, &MatchFilter::eq(fk_column.as_str(), key.clone()))
                    .await?;
                if selected.is_empty() {
                    return Ok(());
                }

                let assigned = single(fk_column, key.to_json());
                self.service
                    .update(table, assigned, &MatchFilter::any_eq(key_column, selected))
                    .await
            }
            RelationWrite::Replace {
                join_table,
                main_column,
                foreign_column,
                selected,
            } => {
                self.service
                    .delete(join_table, &MatchFilter::eq(main_column.as_str(), key.clone()))
                    .await?;
                if selected.is_empty() {
                    return Ok(());
                }

                let links = selected
                    .iter()
                    .map(|foreign| {
                        let mut link = single(main_column, key.to_json());
                        link.insert(foreign_column.clone(), foreign.to_json());
                        link
                    })
                    .collect();
                self.service.insert(join_table, links).await.map(drop)
            }
        }
    }
}

fn enter(stages: &mut Vec<MutationStage>, stage: MutationStage) {
    debug!(%stage, "mutation stage");
    stages.push(stage);
}

fn single(column: &str, value: JsonValue) -> Row {
    let mut row = Row::new();
    row.insert(column.to_string(), value);

    row
}
