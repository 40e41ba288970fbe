//! HTTP implementation of the order lookup.

mod http_client;

pub use http_client::{HttpOrderLookup, DEFAULT_LOOKUP_TIMEOUT};
