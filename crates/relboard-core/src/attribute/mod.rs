//! Module: attribute
//! Responsibility: parsed attribute identifiers and per-page attribute descriptors.
//! Does not own: schema lookups (key columns, relation direction).
//! Boundary: identifiers are parsed once here; downstream code never re-parses text.

mod descriptor;
mod id;

#[cfg(test)]
mod tests;

pub use descriptor::{AttributeDescriptor, AttributeKind};
pub use id::{AttributeId, AttributeIdError};
