//! Module: row
//! Responsibility: flatten nested, array-shaped backend rows into items.
//! Does not own: deciding which attributes are read.
//! Boundary: the only place backend row JSON becomes item values.


use crate::{
    attribute::AttributeId, item::Item, schema::SchemaCatalog, service::Row, value::Value,
};
use serde_json::Value as JsonValue;

///
/// RowMapper
///
/// Maps rows of one root table. Mapping is pure: the same row and
/// identifiers always produce the same item.
///

#[derive(Clone, Copy, Debug)]
pub struct RowMapper<'a> {
    catalog: &'a SchemaCatalog,
    table_id: &'a str,
}

impl<'a> RowMapper<'a> {
    #[must_use]
    pub const fn new(catalog: &'a SchemaCatalog, table_id: &'a str) -> Self {
        Self { catalog, table_id }
    }

    /// Project every identifier out of `row`.
    ///
    /// The root table's primary key is copied over when no identifier
    /// selected it.
    pub fn row_to_item<'i>(
        &self,
        row: &Row,
        ids: impl IntoIterator<Item = &'i AttributeId>,
    ) -> Item {
        let mut item = Item::new();
        for id in ids {
            item.insert(id.clone(), self.project(row, id));
        }

        if let Ok(key) = self.catalog.primary_key(self.table_id) {
            let key_id = AttributeId::column(key);
            if !item.contains_key(&key_id) {
                let value = row.get(key).map(Value::from_json).unwrap_or_default();
                item.insert(key_id, value);
            }
        }

        item
    }

    #[must_use]
    pub fn rows_to_items(&self, rows: &[Row], ids: &[AttributeId]) -> Vec<Item> {
        rows.iter().map(|row| self.row_to_item(row, ids)).collect()
    }

    /// Value of one identifier within `row`.
    #[must_use]
    pub fn project(&self, row: &Row, id: &AttributeId) -> Value {
        let document = self
            .catalog
            .is_document_column(id.owning_table(self.table_id), id.column_name());
        let leaf = Leaf {
            column: id.column_name(),
            document,
        };

        match id.relations().split_first() {
            None => row.get(leaf.column).map_or(Value::Null, |json| leaf.convert(json)),
            Some((relation, rest)) => row
                .get(relation)
                .map_or(Value::Null, |json| leaf.descend(json, rest)),
        }
    }
}

///
/// Leaf
///

struct Leaf<'a> {
    column: &'a str,
    document: bool,
}

impl Leaf<'_> {
    // `json` is the value of the relation just entered; `relations` are the
    // hops still ahead of the leaf column.
    fn descend(&self, json: &JsonValue, relations: &[String]) -> Value {
        match json {
            JsonValue::Array(elements) => Value::List(
                elements
                    .iter()
                    .map(|element| self.descend(element, relations))
                    .collect(),
            ),
            JsonValue::Object(object) => match relations.split_first() {
                None => object.get(self.column).map_or(Value::Null, |json| self.convert(json)),
                Some((relation, rest)) => object
                    .get(relation)
                    .map_or(Value::Null, |json| self.descend(json, rest)),
            },
            _ => Value::Null,
        }
    }

    fn convert(&self, json: &JsonValue) -> Value {
        if self.document {
            Value::document_text(json)
        } else {
            Value::from_json(json)
        }
    }
}
