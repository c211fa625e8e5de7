use crate::{
    attribute::{AttributeDescriptor, AttributeId},
    page::Page,
    schema::{SchemaCatalog, SchemaInferenceError},
};
use derive_more::Deref;

///
/// QueryAttributeSet
///
/// A page's declared attributes plus every key column needed to address the
/// rows they come from: the table's own primary key and, for each join path,
/// the primary key of its innermost table. Identifiers are unique.
///

#[derive(Clone, Debug, Deref, Eq, PartialEq)]
pub struct QueryAttributeSet {
    table_id: String,
    #[deref]
    attributes: Vec<AttributeDescriptor>,
}

impl QueryAttributeSet {
    /// Resolve the query attributes of a page.
    pub fn resolve(page: &Page, catalog: &SchemaCatalog) -> Result<Self, SchemaInferenceError> {
        Self::resolve_attributes(&page.table_id, &page.attributes, catalog)
    }

    /// Resolve an attribute list rooted at `table_id`.
    pub fn resolve_attributes(
        table_id: &str,
        attributes: &[AttributeDescriptor],
        catalog: &SchemaCatalog,
    ) -> Result<Self, SchemaInferenceError> {
        let mut set = Self {
            table_id: table_id.to_string(),
            attributes: Vec::with_capacity(attributes.len() + 2),
        };
        for attribute in attributes {
            set.push(attribute.clone());
        }

        // Phase 1: the table's own key.
        let primary_key = catalog.primary_key(table_id)?;
        set.push(AttributeDescriptor::synthetic_key(AttributeId::column(primary_key)));

        // Phase 2: the innermost key of every join path.
        let nested: Vec<AttributeId> = set
            .attributes
            .iter()
            .filter(|attr| attr.id.is_nested())
            .map(|attr| attr.id.clone())
            .collect();
        for id in nested {
            let key_id = key_path(&id, catalog)?;
            set.push(AttributeDescriptor::synthetic_key(key_id));
        }

        Ok(set)
    }

    #[must_use]
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    #[must_use]
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn ids(&self) -> impl Iterator<Item = &AttributeId> {
        self.attributes.iter().map(|attr| &attr.id)
    }

    #[must_use]
    pub fn contains(&self, id: &AttributeId) -> bool {
        self.attributes.iter().any(|attr| &attr.id == id)
    }

    // First occurrence wins.
    fn push(&mut self, attribute: AttributeDescriptor) {
        if !self.contains(&attribute.id) {
            self.attributes.push(attribute);
        }
    }
}

/// Path to the primary key of the innermost table a join path reads from.
///
/// `actors(agency(name))` becomes `actors(agency(<agency pk>))`; plain
/// columns are returned unchanged.
pub fn key_path(
    id: &AttributeId,
    catalog: &SchemaCatalog,
) -> Result<AttributeId, SchemaInferenceError> {
    match id.innermost_table() {
        Some(table) => Ok(id.with_column(catalog.primary_key(table)?)),
        None => Ok(id.clone()),
    }
}
