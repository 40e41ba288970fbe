//! # Order Sync Shared
//!
//! Plain data types shared by the order sync crates: the change notification
//! emitted by the order service, the fully resolved order document that is
//! indexed, and the backend-agnostic filter request used by the search
//! endpoints.

mod change_event;
mod filter;
mod order;
mod search;

pub use change_event::{ChangeEvent, ChangeKind};
pub use filter::{ExactFilter, FilterOperator, GenericFilterRequest, MatchClause, SortDirection, SortKey};
pub use order::{Address, AddressDefaults, LineItem, OrderDocument};
pub use search::SearchResponse;
