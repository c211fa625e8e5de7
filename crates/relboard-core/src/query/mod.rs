//! Module: query
//! Responsibility: turn page attributes into one select expression and
//! describe reads, filters and match predicates in the backend's wire grammar.
//! Does not own: executing requests or mapping their rows.
//! Boundary: every string sent to the tabular data service is rendered here.

mod expr;
mod filter;
mod request;
mod resolve;


// re-exports
pub use expr::{QueryExpression, SelectNode};
pub use filter::{
    Conjunction, Filter, FilterOp, FilterOpParseError, FilterSet, MatchFilter, RowRange, Sort,
};
pub use request::SelectRequest;
pub use resolve::{QueryAttributeSet, key_path};
