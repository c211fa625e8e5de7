//! Module: service
//! Responsibility: the boundary to the hosted relational backend.
//! Does not own: HTTP transport, authentication or retries.
//! Boundary: every network-bound operation of the engine is a method here.

mod memory;


use crate::query::{MatchFilter, SelectRequest};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error as ThisError;

// re-exports
pub use memory::{MemoryDataService, ServiceCall, ServiceOp};

/// One backend row, keyed by column name.
pub type Row = Map<String, JsonValue>;

///
/// TransportError
///
/// A failed backend call; carries the backend's own error text.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// SelectResponse
///
/// `count` is the size of the whole filtered result set, present only when
/// the request asked for it.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectResponse {
    pub rows: Vec<Row>,
    pub count: Option<u64>,
}

///
/// TabularDataService
///

#[async_trait]
pub trait TabularDataService: Send + Sync {
    /// Fetch the metadata document describing every exposed table.
    async fn fetch_metadata(&self) -> Result<JsonValue, TransportError>;

    async fn select(&self, request: &SelectRequest) -> Result<SelectResponse, TransportError>;

    /// Insert rows and return them as stored, generated keys included.
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, TransportError>;

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filter: &MatchFilter,
    ) -> Result<(), TransportError>;

    async fn delete(&self, table: &str, filter: &MatchFilter) -> Result<(), TransportError>;

    /// Insert-or-update keyed by primary key; returns the stored rows.
    async fn upsert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, TransportError>;
}
