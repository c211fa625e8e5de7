use crate::{
    attribute::{AttributeDescriptor, AttributeKind},
    item::Item,
    page::Page,
    query::key_path,
    schema::SchemaCatalog,
    value::Value,
};
use thiserror::Error as ThisError;

///
/// ValidationError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValidationError {
    #[error("{}", missing_message(labels))]
    MissingRequired { labels: Vec<String> },

    #[error("page '{page}' is read-only")]
    ReadOnlyPage { page: String },
}

fn missing_message(labels: &[String]) -> String {
    let verb = if labels.len() == 1 { "needs" } else { "need" };

    format!("{} {verb} to be filled", labels.join(", "))
}

/// Fill defaults for required attributes and report the ones still unset.
///
/// Booleans default to `false` and enums to their first option. A join
/// attribute is checked through its key path, so it counts as filled once a
/// related row is selected.
pub fn validate_required(
    page: &Page,
    item: &mut Item,
    catalog: &SchemaCatalog,
) -> Result<(), ValidationError> {
    if page.readonly {
        return Err(ValidationError::ReadOnlyPage {
            page: page.page_id.clone(),
        });
    }

    let mut labels = Vec::new();
    for attribute in page.attributes.iter().filter(|attr| attr.required) {
        if !fill(attribute, item, catalog) {
            labels.push(attribute.label.clone());
        }
    }

    if labels.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingRequired { labels })
    }
}

// Returns whether the attribute ends up filled.
fn fill(attribute: &AttributeDescriptor, item: &mut Item, catalog: &SchemaCatalog) -> bool {
    match &attribute.kind {
        AttributeKind::Join => key_path(&attribute.id, catalog)
            .is_ok_and(|key_id| !item.value_or_null(&key_id).scalars().is_empty()),
        _ if !item.value_or_null(&attribute.id).is_unset() => true,
        AttributeKind::Bool => {
            item.insert(attribute.id.clone(), false);
            true
        }
        AttributeKind::Enum { options } => match options.first() {
            Some(first) => {
                item.insert(attribute.id.clone(), Value::from(first.as_str()));
                true
            }
            None => false,
        },
        AttributeKind::Text | AttributeKind::LongText | AttributeKind::Date => false,
    }
}
