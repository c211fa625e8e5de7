//! Module: join
//! Responsibility: discover the relation targets a page references and fetch
//! their candidate rows for pickers.
//! Does not own: writing relation selections back.
//! Boundary: option fetches fan out concurrently and settle together.

#[cfg(test)]
mod tests;

use crate::{
    attribute::{AttributeDescriptor, AttributeId},
    item::Item,
    page::Page,
    query::{Filter, QueryAttributeSet, QueryExpression, SelectRequest},
    row::RowMapper,
    schema::{Cardinality, SchemaCatalog, SchemaInferenceError},
    service::{TabularDataService, TransportError},
};
use futures::future::join_all;
use relboard_config::ScopeConfig;
use std::collections::BTreeMap;
use tracing::{debug, warn};

///
/// JoinOptionSet
///
/// Candidate rows of one relation target, mapped like page rows.
///

#[derive(Clone, Debug, PartialEq)]
pub struct JoinOptionSet {
    pub table_id: String,
    pub cardinality: Cardinality,
    pub candidates: Vec<Item>,
}

///
/// JoinOptionsLoad
///
/// Outcome of one option load. Fetches are best effort: successful targets
/// are kept even when siblings failed.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct JoinOptionsLoad {
    pub options: BTreeMap<String, JoinOptionSet>,
    pub failures: Vec<(String, TransportError)>,
}

impl JoinOptionsLoad {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every failed fetch folded into one transport error.
    #[must_use]
    pub fn error(&self) -> Option<TransportError> {
        if self.failures.is_empty() {
            return None;
        }

        let parts: Vec<String> = self
            .failures
            .iter()
            .map(|(table, err)| format!("{table}: {err}"))
            .collect();

        Some(TransportError::new(parts.join("; ")))
    }
}

///
/// JoinDataLoader
///

pub struct JoinDataLoader<'a, S: ?Sized> {
    service: &'a S,
    catalog: &'a SchemaCatalog,
    scope: Option<&'a ScopeConfig>,
}

impl<'a, S> JoinDataLoader<'a, S>
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

    /// Restrict candidates to the scope, on targets that carry its column.
    #[must_use]
    pub const fn with_scope(mut self, scope: Option<&'a ScopeConfig>) -> Self {
        self.scope = scope;
        self
    }

    /// Fetch candidate rows for every relation target of `page`.
    ///
    /// Schema problems fail the whole load before any request is sent;
    /// transport failures are collected per target.
    pub async fn load_options(
        &self,
        page: &Page,
    ) -> Result<JoinOptionsLoad, SchemaInferenceError> {
        let mut plans = Vec::new();
        for (table, ids) in join_targets(page) {
            plans.push(self.plan(table, ids)?);
        }

        let responses =
            join_all(plans.iter().map(|plan| self.service.select(&plan.request))).await;

        let mut load = JoinOptionsLoad::default();
        for (plan, response) in plans.into_iter().zip(responses) {
            match response {
                Ok(response) => {
                    let candidates = RowMapper::new(self.catalog, &plan.table)
                        .rows_to_items(&response.rows, &plan.ids);
                    let cardinality = self.catalog.cardinality(&page.table_id, &plan.table);
                    debug!(
                        table = %plan.table,
                        rows = candidates.len(),
                        ?cardinality,
                        "join options loaded"
                    );

                    load.options.insert(
                        plan.table.clone(),
                        JoinOptionSet {
                            table_id: plan.table,
                            cardinality,
                            candidates,
                        },
                    );
                }
                Err(err) => {
                    warn!(table = %plan.table, error = %err, "join option fetch failed");
                    load.failures.push((plan.table, err));
                }
            }
        }

        Ok(load)
    }

    fn plan(
        &self,
        table: String,
        ids: Vec<AttributeId>,
    ) -> Result<OptionPlan, SchemaInferenceError> {
        let descriptors: Vec<AttributeDescriptor> = ids
            .into_iter()
            .map(AttributeDescriptor::synthetic_key)
            .collect();
        let set = QueryAttributeSet::resolve_attributes(&table, &descriptors, self.catalog)?;
        let ids: Vec<AttributeId> = set.ids().cloned().collect();

        let select = QueryExpression::build(&ids, self.catalog)?;
        let mut request = SelectRequest::new(table.clone(), select);
        if let Some(scope) = self
            .scope
            .filter(|scope| self.catalog.column(&table, &scope.column).is_some())
        {
            request = request.require(Filter::eq(scope.column.clone(), scope.value.clone()));
        }

        Ok(OptionPlan { table, ids, request })
    }
}

struct OptionPlan {
    table: String,
    ids: Vec<AttributeId>,
    request: SelectRequest,
}

/// Relation targets of a page in first-reference order, each with the
/// referenced paths re-rooted at the target table.
#[must_use]
pub fn join_targets(page: &Page) -> Vec<(String, Vec<AttributeId>)> {
    let mut targets: Vec<(String, Vec<AttributeId>)> = Vec::new();

    for attribute in &page.attributes {
        let id = &attribute.id;
        let (Some(table), Some(inner)) = (id.outermost_relation(), id.strip_outer()) else {
            continue;
        };
        if table == page.table_id {
            continue;
        }

        match targets.iter_mut().find(|(target, _)| target == table) {
            Some((_, ids)) if ids.contains(&inner) => {}
            Some((_, ids)) => ids.push(inner),
            None => targets.push((table.to_string(), vec![inner])),
        }
    }

    targets
}
