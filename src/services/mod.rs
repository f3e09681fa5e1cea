pub mod filter_service;
pub mod search_service;

pub use filter_service::{AdvancedFilter, ExecutionMode, FetchOutcome, FetchTicket, FilterEdit, LocalSource};
pub use search_service::{InMemorySearchBackend, SearchBackend, SearchError};
