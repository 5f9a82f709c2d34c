//! Filter-and-aggregate engine.
//!
//! - Constraint: typed filter rules built from configuration
//! - Filter: narrows the record set (threshold, prefix, memberships)
//! - Aggregate: groups, sums and formats the filtered rows
//! - Format: thousands-separated number rendering
//! - Pipeline: filter then aggregate

pub mod aggregate;
pub mod constraint;
pub mod filter;
pub mod format;
pub mod pipeline;

pub use aggregate::*;
pub use constraint::*;
pub use filter::*;
pub use format::*;
pub use pipeline::*;
