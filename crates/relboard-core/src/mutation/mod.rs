//! Module: mutation
//! Responsibility: write one edited item across the tables it spans.
//! Does not own: reloading page data after a write.
//! Boundary: the main row is written before any relation row; relation
//! writes are not rolled back when a sibling fails.

mod coordinator;
mod plan;
mod validate;


// re-exports
pub use coordinator::{
    MutationCoordinator, MutationError, MutationReport, MutationStage, PartialWriteError,
    RelationWriteOutcome,
};
pub use plan::{MainWrite, RelationWrite, WritePlan};
pub use validate::{ValidationError, validate_required};
