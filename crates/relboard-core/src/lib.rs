//! Core runtime for relboard: the schema catalog, query construction, row
//! mapping, join option loading, multi-table mutations and the page session
//! surface consumed by dashboard frontends.
//!
//! Nothing here knows the schema at compile time. Table shapes are read from
//! the backend's metadata document and every page is described by
//! configuration.
#![warn(unreachable_pub)]

pub mod attribute;
pub mod cache;
pub mod error;
pub mod item;
pub mod join;
pub mod mutation;
pub mod page;
pub mod pagination;
pub mod query;
pub mod row;
pub mod schema;
pub mod service;
pub mod session;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

// re-exports
pub use error::{Error, ErrorClass};

///
/// CONSTANTS
///

/// Maximum number of relation hops an attribute identifier may traverse.
pub const MAX_JOIN_DEPTH: usize = 2;

///
/// Prelude
///
/// Domain vocabulary only; executors and services are imported explicitly.
///

pub mod prelude {
    pub use crate::{
        attribute::{AttributeDescriptor, AttributeId, AttributeKind},
        item::Item,
        page::Page,
        query::{Conjunction, Filter, FilterOp, Sort},
        schema::{Cardinality, SchemaCatalog, TableSchema},
        value::Value,
    };
}
