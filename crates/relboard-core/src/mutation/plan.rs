use crate::{
    Error,
    attribute::AttributeId,
    item::Item,
    page::Page,
    query::key_path,
    schema::{SchemaCatalog, SchemaInferenceError},
    service::Row,
    value::Value,
};
use relboard_config::ScopeConfig;
use serde_json::Value as JsonValue;
use tracing::debug;

///
/// MainWrite
///
/// The upsert of the page table's row. `key` is `None` for inserts.
///

#[derive(Clone, Debug, PartialEq)]
pub struct MainWrite {
    pub table: String,
    pub row: Row,
    pub key_column: String,
    pub key: Option<Value>,
}

///
/// RelationWrite
///
/// A relation rewrite that needs the main row's key.
///

#[derive(Clone, Debug, PartialEq)]
pub enum RelationWrite {
    /// The related table points back at the main table: clear the
    /// reference on rows holding this key, then set it on the selected rows.
    /// Unselected rows are orphaned, never deleted.
    Reassign {
        table: String,
        fk_column: String,
        key_column: String,
        selected: Vec<Value>,
    },

    /// Many-to-many through a join table: delete every link for this key,
    /// then insert one link per selected row.
    Replace {
        join_table: String,
        main_column: String,
        foreign_column: String,
        selected: Vec<Value>,
    },
}

impl RelationWrite {
    /// Table this write touches.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::Reassign { table, .. } => table,
            Self::Replace { join_table, .. } => join_table,
        }
    }
}

///
/// WritePlan
///
/// One item edit split by owning table: the main write first, then every
/// relation write, which may run concurrently.
///

#[derive(Clone, Debug, PartialEq)]
pub struct WritePlan {
    pub main: MainWrite,
    pub relations: Vec<RelationWrite>,
}

impl WritePlan {
    /// Partition the writable attributes of `page` found in `item`.
    ///
    /// Attributes the item does not carry are left untouched, so a partial
    /// item never clears a relation it did not load.
    pub fn build(
        page: &Page,
        item: &Item,
        catalog: &SchemaCatalog,
        scope: Option<&ScopeConfig>,
    ) -> Result<Self, Error> {
        let table = page.table_id.as_str();
        let key_column = catalog.primary_key(table)?.to_string();
        let key = item
            .column(&key_column)
            .filter(|key| !key.is_unset())
            .cloned();

        let mut row = Row::new();
        let mut relations = Vec::new();
        let mut visited: Vec<&str> = Vec::new();

        for attribute in page.attributes.iter().filter(|attr| attr.is_writable()) {
            let id = &attribute.id;
            match id.relations() {
                [] => {
                    let Some(value) = item.get(id) else {
                        continue;
                    };
                    if id.column_name() == key_column {
                        continue;
                    }

                    let json = if catalog.is_document_column(table, id.column_name()) {
                        value.parse_document(&attribute.label)?
                    } else {
                        value.to_json()
                    };
                    row.insert(id.column_name().to_string(), json);
                }
                [relation] => {
                    if visited.contains(&relation.as_str()) {
                        continue;
                    }
                    visited.push(relation);

                    let Some(selected) = selected_keys(id, item, catalog)? else {
                        debug!(attribute = %id, "relation not present in item; left untouched");
                        continue;
                    };

                    match catalog.single_foreign_key_column(table, relation)? {
                        Some(fk_column) => {
                            let json = selected.first().map_or(JsonValue::Null, Value::to_json);
                            row.insert(fk_column.to_string(), json);
                        }
                        None => relations.push(relation_write(table, relation, selected, catalog)?),
                    }
                }
                _ => {
                    debug!(attribute = %id, "multi-hop attribute is read-only; skipped");
                }
            }
        }

        if let Some(scope) = scope {
            row.insert(scope.column.clone(), JsonValue::String(scope.value.clone()));
        }
        if let Some(key) = &key {
            row.insert(key_column.clone(), key.to_json());
        }

        Ok(Self {
            main: MainWrite {
                table: table.to_string(),
                row,
                key_column,
                key,
            },
            relations,
        })
    }
}

// Keys of the related rows selected in the item, read from the relation's
// key path only. `None` when the item carries no key path for it.
fn selected_keys(
    id: &AttributeId,
    item: &Item,
    catalog: &SchemaCatalog,
) -> Result<Option<Vec<Value>>, SchemaInferenceError> {
    let key_id = key_path(id, catalog)?;

    Ok(item.get(&key_id).map(Value::scalars))
}

fn relation_write(
    table: &str,
    relation: &str,
    selected: Vec<Value>,
    catalog: &SchemaCatalog,
) -> Result<RelationWrite, SchemaInferenceError> {
    if let Some(fk_column) = catalog.single_foreign_key_column(relation, table)? {
        return Ok(RelationWrite::Reassign {
            table: relation.to_string(),
            fk_column: fk_column.to_string(),
            key_column: catalog.primary_key(relation)?.to_string(),
            selected,
        });
    }

    let join = catalog.join_table(table, relation)?;
    let no_join = || SchemaInferenceError::NoJoinTable {
        left: table.to_string(),
        right: relation.to_string(),
    };
    let main_column = catalog
        .single_foreign_key_column(&join.id, table)?
        .ok_or_else(no_join)?;
    let foreign_column = catalog
        .single_foreign_key_column(&join.id, relation)?
        .ok_or_else(no_join)?;

    Ok(RelationWrite::Replace {
        join_table: join.id.clone(),
        main_column: main_column.to_string(),
        foreign_column: foreign_column.to_string(),
        selected,
    })
}
