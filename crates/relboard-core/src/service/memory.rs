use crate::{
    query::{Conjunction, Filter, FilterOp, FilterSet, MatchFilter, SelectNode, SelectRequest},
    schema::{SchemaCatalog, SchemaInferenceError},
    service::{Row, SelectResponse, TabularDataService, TransportError},
    value::Value,
};
use async_trait::async_trait;
use regex::RegexBuilder;
use serde_json::Value as JsonValue;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::debug;

///
/// ServiceOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ServiceOp {
    Metadata,
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
}

impl fmt::Display for ServiceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Metadata => "metadata",
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Upsert => "upsert",
        };
        write!(f, "{label}")
    }
}

///
/// ServiceCall
///
/// One recorded request. `detail` is the rendered query string for reads,
/// the match predicate for update/delete and the row JSON for writes.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceCall {
    pub op: ServiceOp,
    pub table: String,
    pub detail: String,
}

impl ServiceCall {
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self.op,
            ServiceOp::Insert | ServiceOp::Update | ServiceOp::Delete | ServiceOp::Upsert
        )
    }
}

///
/// MemoryDataService
///
/// In-memory tabular backend driven by the same metadata document a real
/// backend would serve. Embedded relations in select expressions are
/// resolved through the catalog, so responses have the nested shape the
/// row mapper expects.
///

pub struct MemoryDataService {
    metadata: JsonValue,
    catalog: SchemaCatalog,
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    tables: BTreeMap<String, Vec<Row>>,
    calls: Vec<ServiceCall>,
    failures: BTreeSet<(String, ServiceOp)>,
    metadata_fails: bool,
}

impl MemoryDataService {
    pub fn new(metadata: JsonValue) -> Result<Self, SchemaInferenceError> {
        let catalog = SchemaCatalog::from_metadata(&metadata)?;
        let tables = catalog
            .tables()
            .map(|table| (table.id.clone(), Vec::new()))
            .collect();

        Ok(Self {
            metadata,
            catalog,
            state: Mutex::new(MemoryState {
                tables,
                ..MemoryState::default()
            }),
        })
    }

    /// Load rows without recording a call. Missing keys are generated.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        let mut state = self.state();
        for row in rows {
            if let Err(err) = state.store(&self.catalog, table, row, true) {
                debug!(table, error = %err, "seed row rejected");
            }
        }
    }

    /// Current contents of `table`, in storage order.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make every later `op` against `table` fail.
    pub fn fail(&self, table: &str, op: ServiceOp) {
        self.state().failures.insert((table.to_string(), op));
    }

    pub fn fail_metadata(&self) {
        self.state().metadata_fails = true;
    }

    /// Drop all injected failures.
    pub fn recover(&self) {
        let mut state = self.state();
        state.failures.clear();
        state.metadata_fails = false;
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Record the call, then apply failure injection.
    fn begin(
        &self,
        op: ServiceOp,
        table: &str,
        detail: String,
    ) -> Result<MutexGuard<'_, MemoryState>, TransportError> {
        let mut state = self.state();
        debug!(%op, table, %detail, "memory service call");
        state.calls.push(ServiceCall {
            op,
            table: table.to_string(),
            detail,
        });

        if state.failures.contains(&(table.to_string(), op)) {
            return Err(TransportError::new(format!("{op} on '{table}' failed")));
        }

        Ok(state)
    }

    fn write_rows(
        &self,
        op: ServiceOp,
        table: &str,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, TransportError> {
        let detail = serde_json::to_string(&rows).unwrap_or_default();
        let mut state = self.begin(op, table, detail)?;

        rows.into_iter()
            .map(|row| state.store(&self.catalog, table, row, op == ServiceOp::Upsert))
            .collect()
    }
}

#[async_trait]
impl TabularDataService for MemoryDataService {
    async fn fetch_metadata(&self) -> Result<JsonValue, TransportError> {
        let state = self.begin(ServiceOp::Metadata, "", String::new())?;
        if state.metadata_fails {
            return Err(TransportError::new("metadata endpoint unavailable"));
        }

        Ok(self.metadata.clone())
    }

    async fn select(&self, request: &SelectRequest) -> Result<SelectResponse, TransportError> {
        let detail = request
            .to_query_pairs()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let state = self.begin(ServiceOp::Select, &request.table, detail)?;

        state.select(&self.catalog, request)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, TransportError> {
        self.write_rows(ServiceOp::Insert, table, rows)
    }

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filter: &MatchFilter,
    ) -> Result<(), TransportError> {
        let mut state = self.begin(ServiceOp::Update, table, filter.to_string())?;
        let rows = state.table_mut(table)?;
        for row in rows.iter_mut().filter(|row| match_filter(filter, row)) {
            for (column, value) in &patch {
                row.insert(column.clone(), value.clone());
            }
        }

        Ok(())
    }

    async fn delete(&self, table: &str, filter: &MatchFilter) -> Result<(), TransportError> {
        let mut state = self.begin(ServiceOp::Delete, table, filter.to_string())?;
        state.table_mut(table)?.retain(|row| !match_filter(filter, row));

        Ok(())
    }

    async fn upsert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, TransportError> {
        self.write_rows(ServiceOp::Upsert, table, rows)
    }
}

impl MemoryState {
    fn table(&self, table: &str) -> Result<&[Row], TransportError> {
        self.tables
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| unknown_table(table))
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut Vec<Row>, TransportError> {
        self.tables.get_mut(table).ok_or_else(|| unknown_table(table))
    }

    fn rows_of(&self, table: &str) -> &[Row] {
        self.tables
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn select(
        &self,
        catalog: &SchemaCatalog,
        request: &SelectRequest,
    ) -> Result<SelectResponse, TransportError> {
        let mut matched: Vec<&Row> = self
            .table(&request.table)?
            .iter()
            .filter(|row| request.required.iter().all(|filter| matches(filter, row)))
            .filter(|row| match_set(&request.filters, row))
            .collect();

        matched.sort_by(|a, b| {
            request
                .sorts
                .iter()
                .map(|sort| {
                    let order = compare_cells(a.get(&sort.column), b.get(&sort.column));
                    if sort.ascending { order } else { order.reverse() }
                })
                .find(|order| order.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let count = request
            .count
            .then(|| u64::try_from(matched.len()).unwrap_or(u64::MAX));

        if let Some(range) = request.range {
            let start = usize::try_from(range.start).unwrap_or(usize::MAX);
            let len = usize::try_from(range.end.saturating_sub(range.start))
                .map_or(usize::MAX, |n| n.saturating_add(1));
            matched = matched.into_iter().skip(start).take(len).collect();
        }

        let rows = matched
            .into_iter()
            .map(|row| {
                if request.select.is_empty() {
                    row.clone()
                } else {
                    self.embed(catalog, &request.table, row, request.select.nodes())
                }
            })
            .collect();

        Ok(SelectResponse { rows, count })
    }

    // Project `row` of `table` through the select tree.
    fn embed(
        &self,
        catalog: &SchemaCatalog,
        table: &str,
        row: &Row,
        nodes: &[SelectNode],
    ) -> Row {
        let mut out = Row::new();
        for node in nodes {
            let value = match node.children() {
                None => row.get(node.name()).cloned().unwrap_or(JsonValue::Null),
                Some(children) => self.embed_relation(catalog, table, row, node.name(), children),
            };
            out.insert(node.name().to_string(), value);
        }

        out
    }

    fn embed_relation(
        &self,
        catalog: &SchemaCatalog,
        table: &str,
        row: &Row,
        relation: &str,
        children: &[SelectNode],
    ) -> JsonValue {
        let related = self.rows_of(relation);
        let nest =
            |target: &Row| JsonValue::Object(self.embed(catalog, relation, target, children));

        // many-to-one: this row holds the key
        if let Some(fk) = catalog
            .table(table)
            .and_then(|source| source.foreign_keys_to(relation).next())
        {
            return related
                .iter()
                .find(|target| same_cell(row.get(&fk.column), target.get(&fk.target_column)))
                .map_or(JsonValue::Null, nest);
        }

        // one-to-many: the related rows point back
        if let Some(fk) = catalog
            .table(relation)
            .and_then(|target| target.foreign_keys_to(table).next())
        {
            return JsonValue::Array(
                related
                    .iter()
                    .filter(|target| same_cell(target.get(&fk.column), row.get(&fk.target_column)))
                    .map(nest)
                    .collect(),
            );
        }

        // many-to-many through the inferred join table
        let Ok(join) = catalog.join_table(table, relation) else {
            return JsonValue::Null;
        };
        let (Some(to_source), Some(to_target)) = (
            join.foreign_keys_to(table).next(),
            join.foreign_keys_to(relation).next(),
        ) else {
            return JsonValue::Array(Vec::new());
        };
        let links = self.rows_of(&join.id);

        JsonValue::Array(
            related
                .iter()
                .filter(|target| {
                    links.iter().any(|link| {
                        same_cell(link.get(&to_source.column), row.get(&to_source.target_column))
                            && same_cell(
                                link.get(&to_target.column),
                                target.get(&to_target.target_column),
                            )
                    })
                })
                .map(nest)
                .collect(),
        )
    }

    // Insert, or merge into the row with the same key when `merge` is set.
    fn store(
        &mut self,
        catalog: &SchemaCatalog,
        table: &str,
        mut row: Row,
        merge: bool,
    ) -> Result<Row, TransportError> {
        let key = catalog.primary_key(table).ok();
        let rows = self.table_mut(table)?;

        if let Some(key) = key {
            let present = row.get(key).is_some_and(|value| !value.is_null());
            let existing = rows
                .iter()
                .position(|stored| present && same_cell(stored.get(key), row.get(key)));

            match existing {
                Some(index) if merge => {
                    let stored = &mut rows[index];
                    for (column, value) in row {
                        stored.insert(column, value);
                    }
                    return Ok(stored.clone());
                }
                Some(_) => {
                    return Err(TransportError::new(format!(
                        "duplicate key value violates unique constraint on '{table}.{key}'"
                    )));
                }
                None if !present => {
                    let next = rows
                        .iter()
                        .filter_map(|stored| stored.get(key).and_then(JsonValue::as_i64))
                        .max()
                        .unwrap_or(0)
                        + 1;
                    row.insert(key.to_string(), JsonValue::from(next));
                }
                None => {}
            }
        }

        rows.push(row.clone());

        Ok(row)
    }
}

fn unknown_table(table: &str) -> TransportError {
    TransportError::new(format!("relation \"{table}\" does not exist"))
}

fn cell(row: &Row, column: &str) -> Value {
    row.get(column).map(Value::from_json).unwrap_or_default()
}

// Key equality as the backend compares literals; null never matches.
fn same_cell(left: Option<&JsonValue>, right: Option<&JsonValue>) -> bool {
    match (left, right) {
        (Some(left), Some(right)) if !left.is_null() && !right.is_null() => {
            Value::from_json(left).to_text() == Value::from_json(right).to_text()
        }
        _ => false,
    }
}

fn compare_cells(left: Option<&JsonValue>, right: Option<&JsonValue>) -> Ordering {
    match (left.and_then(JsonValue::as_f64), right.and_then(JsonValue::as_f64)) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        _ => {
            let literal = |json: Option<&JsonValue>| {
                json.map(Value::from_json).unwrap_or_default().to_text()
            };
            literal(left).cmp(&literal(right))
        }
    }
}

fn match_set(set: &FilterSet, row: &Row) -> bool {
    match set.conjunction {
        _ if set.is_empty() => true,
        Conjunction::And => set.filters.iter().all(|filter| matches(filter, row)),
        Conjunction::Or => set.filters.iter().any(|filter| matches(filter, row)),
    }
}

fn match_filter(filter: &MatchFilter, row: &Row) -> bool {
    filter.filters().iter().any(|filter| matches(filter, row))
}

fn matches(filter: &Filter, row: &Row) -> bool {
    let value = cell(row, &filter.column);
    let literal = filter.value.to_text();

    match filter.op {
        FilterOp::Eq => !value.is_null() && value.to_text() == literal,
        FilterOp::Neq => !value.is_null() && value.to_text() != literal,
        FilterOp::Gt => ordered(&value, &filter.value).is_some_and(Ordering::is_gt),
        FilterOp::Gte => ordered(&value, &filter.value).is_some_and(Ordering::is_ge),
        FilterOp::Lt => ordered(&value, &filter.value).is_some_and(Ordering::is_lt),
        FilterOp::Lte => ordered(&value, &filter.value).is_some_and(Ordering::is_le),
        FilterOp::Like => like(&value, &literal, false),
        FilterOp::Ilike => like(&value, &literal, true),
        FilterOp::Is => match literal.as_str() {
            "null" => value.is_null(),
            "true" => value == Value::Bool(true),
            "false" => value == Value::Bool(false),
            _ => false,
        },
        FilterOp::In => filter
            .value
            .scalars()
            .iter()
            .any(|candidate| !value.is_null() && value.to_text() == candidate.to_text()),
    }
}

fn ordered(value: &Value, bound: &Value) -> Option<Ordering> {
    match (value, bound) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Int(left), Value::Int(right)) => Some(left.cmp(right)),
        (Value::Float(left), Value::Float(right)) => left.partial_cmp(right),
        (left, right) => Some(left.to_text().cmp(&right.to_text())),
    }
}

// `*` and `%` are wildcards.
fn like(value: &Value, pattern: &str, case_insensitive: bool) -> bool {
    if value.is_null() {
        return false;
    }

    let body = pattern
        .split(['*', '%'])
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    RegexBuilder::new(&format!("^{body}$"))
        .case_insensitive(case_insensitive)
        .build()
        .is_ok_and(|regex| regex.is_match(&value.to_text()))
}
