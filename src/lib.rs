#![allow(clippy::collapsible_if)]

pub mod config;
pub mod core;
pub mod logging;
pub mod services;

// Re-export commonly used types
pub use crate::config::{Config, FilterSettings};
pub use crate::core::{
    ApiFilterRequest, ApiFilterResponse, FilterCondition, FilterError, FilterGroup, FilterState,
    GroupId, Logic, Operator, PaginationConfig, Record,
};
pub use crate::services::{AdvancedFilter, ExecutionMode, FilterEdit, SearchBackend, SearchError};
