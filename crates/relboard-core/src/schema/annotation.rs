use regex::Regex;
use std::sync::LazyLock;

static PRIMARY_KEY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<pk\s*/>").expect("valid primary key tag pattern"));

static FOREIGN_KEY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<fk\s+table='(?P<table>[^']*)'\s+column='(?P<column>[^']*)'\s*/>")
        .expect("valid foreign key tag pattern")
});

///
/// ForeignKeyTarget
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ForeignKeyTarget {
    pub table: String,
    pub column: String,
}

///
/// AnnotationConvention
///
/// Reads key markers out of a column's free-text description.
/// Swapping the convention never touches the catalog's consumers.
///

pub trait AnnotationConvention: Send + Sync {
    fn is_primary_key(&self, description: &str) -> bool;

    fn foreign_key(&self, description: &str) -> Option<ForeignKeyTarget>;
}

///
/// TagConvention
///
/// `<pk/>` marks a primary key; `<fk table='T' column='C'/>` a foreign key.
/// This is the form PostgREST copies from column comments into its metadata.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct TagConvention;

impl AnnotationConvention for TagConvention {
    fn is_primary_key(&self, description: &str) -> bool {
        PRIMARY_KEY_TAG.is_match(description)
    }

    fn foreign_key(&self, description: &str) -> Option<ForeignKeyTarget> {
        let captures = FOREIGN_KEY_TAG.captures(description)?;

        Some(ForeignKeyTarget {
            table: captures["table"].to_string(),
            column: captures["column"].to_string(),
        })
    }
}
