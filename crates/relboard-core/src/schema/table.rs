use serde::{Deserialize, Serialize};

/// Storage formats rendered to and parsed from text at the item boundary.
const DOCUMENT_FORMATS: [&str; 2] = ["json", "jsonb"];

///
/// ColumnSchema
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub format: String,
}

impl ColumnSchema {
    #[must_use]
    pub fn is_document(&self) -> bool {
        DOCUMENT_FORMATS.contains(&self.format.as_str())
    }
}

///
/// ForeignKey
///
/// One outgoing reference: `column` of the owning table points at
/// `target_column` of `target_table`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ForeignKey {
    pub column: String,
    pub target_table: String,
    pub target_column: String,
}

///
/// TableSchema
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableSchema {
    pub id: String,
    pub columns: Vec<ColumnSchema>,
    pub primary_key: Option<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Columns of this table referencing `target`.
    pub fn foreign_keys_to<'a, 'b>(
        &'a self,
        target: &'b str,
    ) -> impl Iterator<Item = &'a ForeignKey> + use<'a, 'b> {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.target_table == target)
    }

    #[must_use]
    pub fn references(&self, target: &str) -> bool {
        self.foreign_keys_to(target).next().is_some()
    }
}
