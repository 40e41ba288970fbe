//! Interface definitions for the pipeline's collaborators.
//!
//! The traits here let the pipeline run against OpenSearch and the order
//! service in production and against in-memory doubles in tests.

mod order_index;
mod order_lookup;

pub use order_index::OrderIndex;
pub use order_lookup::OrderLookup;
