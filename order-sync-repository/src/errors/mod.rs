//! Error types for the order sync repository.

mod lookup_error;
mod search_index_error;
mod translate_error;

pub use lookup_error::LookupError;
pub use search_index_error::SearchIndexError;
pub use translate_error::TranslateError;
