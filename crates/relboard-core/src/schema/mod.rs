//! Module: schema
//! Responsibility: the navigable table model reverse-engineered from backend metadata.
//! Does not own: query construction or any network access beyond the single metadata fetch.
//! Boundary: annotation parsing stays behind `AnnotationConvention`; consumers only see tables.
//!
//! Invariants:
//! - The catalog is immutable once built.
//! - Missing keys and ambiguous join tables are reported, never guessed.

mod annotation;
mod table;


pub use annotation::{AnnotationConvention, ForeignKeyTarget, TagConvention};
pub use table::{ColumnSchema, ForeignKey, TableSchema};

use crate::{error::Error, service::TabularDataService};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;
use tracing::info;

///
/// SchemaInferenceError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaInferenceError {
    #[error("schema catalog is not loaded")]
    CatalogUnavailable,

    #[error("metadata document is malformed: {message}")]
    MalformedMetadata { message: String },

    #[error("table '{table}' is not in the schema catalog")]
    UnknownTable { table: String },

    #[error("table '{table}' has no primary key annotation")]
    MissingPrimaryKey { table: String },

    #[error("no join table links '{left}' and '{right}'")]
    NoJoinTable { left: String, right: String },

    #[error("join between '{left}' and '{right}' is ambiguous: {candidates:?}")]
    AmbiguousJoinTable {
        left: String,
        right: String,
        candidates: Vec<String>,
    },

    #[error("'{source_table}' references '{target}' through several columns: {columns:?}")]
    AmbiguousForeignKey {
        source_table: String,
        target: String,
        columns: Vec<String>,
    },
}

///
/// Cardinality
///
/// `Single`: the page table holds the foreign key (many-to-one).
/// `Multi`: anything else, resolved through the other table or a join table.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    Single,
    Multi,
}

///
/// SchemaCatalog
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaCatalog {
    /// Fetch the metadata document once and build the catalog from it.
    pub async fn load<S>(service: &S) -> Result<Self, Error>
    where
        S: TabularDataService + ?Sized,
    {
        let metadata = service.fetch_metadata().await?;
        let catalog = Self::from_metadata(&metadata)?;
        info!(tables = catalog.len(), "schema catalog loaded");

        Ok(catalog)
    }

    /// Build from a metadata document using the `<pk/>` / `<fk …/>` tags.
    pub fn from_metadata(metadata: &JsonValue) -> Result<Self, SchemaInferenceError> {
        Self::from_metadata_with(metadata, &TagConvention)
    }

    /// Build from a metadata document with an explicit annotation convention.
    ///
    /// Accepts the full OpenAPI object or its bare `definitions` map.
    pub fn from_metadata_with(
        metadata: &JsonValue,
        convention: &dyn AnnotationConvention,
    ) -> Result<Self, SchemaInferenceError> {
        let definitions = metadata
            .get("definitions")
            .unwrap_or(metadata)
            .as_object()
            .ok_or_else(|| SchemaInferenceError::MalformedMetadata {
                message: "expected an object of table definitions".to_string(),
            })?;

        let tables = definitions
            .iter()
            .map(|(table_id, definition)| parse_table(table_id, definition, convention))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_tables(tables))
    }

    #[must_use]
    pub fn from_tables(tables: impl IntoIterator<Item = TableSchema>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|table| (table.id.clone(), table))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    #[must_use]
    pub fn table(&self, table_id: &str) -> Option<&TableSchema> {
        self.tables.get(table_id)
    }

    pub fn require_table(&self, table_id: &str) -> Result<&TableSchema, SchemaInferenceError> {
        self.table(table_id)
            .ok_or_else(|| SchemaInferenceError::UnknownTable {
                table: table_id.to_string(),
            })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    /// Primary key column of `table_id`.
    ///
    /// There is no `"id"` fallback: an unannotated table is an error.
    pub fn primary_key(&self, table_id: &str) -> Result<&str, SchemaInferenceError> {
        self.require_table(table_id)?
            .primary_key
            .as_deref()
            .ok_or_else(|| SchemaInferenceError::MissingPrimaryKey {
                table: table_id.to_string(),
            })
    }

    /// Every column in `source` whose foreign key points at `target`.
    #[must_use]
    pub fn foreign_key_columns(&self, source: &str, target: &str) -> Vec<&str> {
        self.table(source)
            .map(|table| {
                table
                    .foreign_keys_to(target)
                    .map(|fk| fk.column.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The single column in `source` referencing `target`, if any.
    pub fn single_foreign_key_column(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Option<&str>, SchemaInferenceError> {
        let columns = self.foreign_key_columns(source, target);

        match columns.as_slice() {
            [] => Ok(None),
            [column] => Ok(Some(*column)),
            _ => Err(SchemaInferenceError::AmbiguousForeignKey {
                source_table: source.to_string(),
                target: target.to_string(),
                columns: columns.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    #[must_use]
    pub fn outgoing_joins(&self, table_id: &str) -> &[ForeignKey] {
        self.table(table_id)
            .map(|table| table.foreign_keys.as_slice())
            .unwrap_or_default()
    }

    /// Tables referencing `table_id`, followed by the other tables those reference.
    #[must_use]
    pub fn incoming_tables(&self, table_id: &str) -> Vec<&str> {
        let mut incoming: Vec<&str> = Vec::new();

        for table in self.tables().filter(|table| table.references(table_id)) {
            if !incoming.contains(&table.id.as_str()) {
                incoming.push(&table.id);
            }
            for fk in &table.foreign_keys {
                if fk.target_table != table_id && !incoming.contains(&fk.target_table.as_str()) {
                    incoming.push(&fk.target_table);
                }
            }
        }

        incoming
    }

    /// The one table whose foreign keys point at both `left` and `right`.
    pub fn join_table(&self, left: &str, right: &str) -> Result<&TableSchema, SchemaInferenceError> {
        let candidates: Vec<&TableSchema> = self
            .tables()
            .filter(|table| table.id != left && table.id != right)
            .filter(|table| table.references(left) && table.references(right))
            .collect();

        match candidates.as_slice() {
            [table] => Ok(*table),
            [] => Err(SchemaInferenceError::NoJoinTable {
                left: left.to_string(),
                right: right.to_string(),
            }),
            _ => Err(SchemaInferenceError::AmbiguousJoinTable {
                left: left.to_string(),
                right: right.to_string(),
                candidates: candidates.iter().map(|table| table.id.clone()).collect(),
            }),
        }
    }

    /// Classify the relation from `source` to `target`.
    #[must_use]
    pub fn cardinality(&self, source: &str, target: &str) -> Cardinality {
        if self.foreign_key_columns(source, target).is_empty() {
            Cardinality::Multi
        } else {
            Cardinality::Single
        }
    }

    #[must_use]
    pub fn column(&self, table_id: &str, column: &str) -> Option<&ColumnSchema> {
        self.table(table_id)?.column(column)
    }

    #[must_use]
    pub fn is_document_column(&self, table_id: &str, column: &str) -> bool {
        self.column(table_id, column)
            .is_some_and(ColumnSchema::is_document)
    }
}

// Parse one table definition: `{ "properties": { column: { type, format, description } } }`.
fn parse_table(
    table_id: &str,
    definition: &JsonValue,
    convention: &dyn AnnotationConvention,
) -> Result<TableSchema, SchemaInferenceError> {
    let properties = match definition.get("properties") {
        None => return Ok(empty_table(table_id)),
        Some(JsonValue::Object(properties)) => properties,
        Some(_) => {
            return Err(SchemaInferenceError::MalformedMetadata {
                message: format!("properties of '{table_id}' is not an object"),
            });
        }
    };

    let mut table = empty_table(table_id);
    for (name, column) in properties {
        let text = |key: &str| {
            column
                .get(key)
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let description = text("description");

        if table.primary_key.is_none() && convention.is_primary_key(&description) {
            table.primary_key = Some(name.clone());
        }
        if let Some(target) = convention.foreign_key(&description) {
            table.foreign_keys.push(ForeignKey {
                column: name.clone(),
                target_table: target.table,
                target_column: target.column,
            });
        }

        table.columns.push(ColumnSchema {
            name: name.clone(),
            data_type: text("type"),
            format: text("format"),
        });
    }

    Ok(table)
}

fn empty_table(table_id: &str) -> TableSchema {
    TableSchema {
        id: table_id.to_string(),
        columns: Vec::new(),
        primary_key: None,
        foreign_keys: Vec::new(),
    }
}
