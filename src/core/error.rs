use crate::core::types::GroupId;
use thiserror::Error;

/// Errors raised while building or validating a filter query
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("a query must contain at least one group")]
    EmptyQuery,

    #[error("group {0} has no conditions")]
    EmptyGroup(GroupId),

    #[error("group id {0} is used more than once")]
    DuplicateGroupId(GroupId),

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("page numbers start at 1")]
    InvalidPage,

    #[error("failed to parse query: {0}")]
    Serialization(#[from] serde_json::Error),
}
