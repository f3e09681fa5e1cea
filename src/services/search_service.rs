//! Remote search collaborator.
//!
//! The engine never interprets field names or operators in remote mode; it
//! hands the whole condition tree to a [`SearchBackend`] and shows whatever
//! page comes back.

use crate::core::evaluator::evaluate_query;
use crate::core::models::{ApiFilterRequest, ApiFilterResponse, PaginationConfig};
use crate::core::record::{Record, record_value};
use crate::core::types::SortOrder;
use async_trait::async_trait;
use std::cmp::Ordering;
use thiserror::Error;
use tracing::debug;

/// Failure reported by a search backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search backend unavailable: {0}")]
    Unavailable(String),

    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    #[error("search backend error: {0}")]
    Backend(String),
}

/// Paginated search service that evaluates condition trees server-side
#[async_trait]
pub trait SearchBackend<T>: Send + Sync {
    /// Run one query and return the requested page
    async fn search(&self, request: &ApiFilterRequest) -> Result<ApiFilterResponse<T>, SearchError>;
}

/// Search backend over an in-memory collection.
///
/// Applies the same evaluation rules as local mode, then sorts and slices the
/// matches into the requested page.
#[derive(Debug, Clone)]
pub struct InMemorySearchBackend<T> {
    items: Vec<T>,
}

impl<T> InMemorySearchBackend<T>
where
    T: Record + Clone + Send + Sync,
{
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Run a request synchronously
    pub fn execute(&self, request: &ApiFilterRequest) -> Result<ApiFilterResponse<T>, SearchError> {
        if request.page_size == 0 {
            return Err(SearchError::InvalidRequest(
                "pageSize must be greater than zero".to_string(),
            ));
        }
        if request.page == 0 {
            return Err(SearchError::InvalidRequest("page numbers start at 1".to_string()));
        }

        let mut matches: Vec<&T> = self
            .items
            .iter()
            .filter(|item| evaluate_query(&request.condition_groups, *item, &record_value))
            .collect();

        if let Some(field) = request.sort_by.as_deref() {
            let order = request.sort_order.unwrap_or_default();
            matches.sort_by(|a, b| compare_field(*a, *b, field, order));
        }

        let total = matches.len();
        let pagination = PaginationConfig {
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages: PaginationConfig::pages_for(total, request.page_size),
        };
        let data: Vec<T> = matches
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.page_size)
            .cloned()
            .collect();

        debug!(
            "In-memory search matched {} of {} rows, returning page {} ({} rows)",
            total,
            self.items.len(),
            pagination.page,
            data.len()
        );

        Ok(ApiFilterResponse {
            data,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            total_pages: pagination.total_pages,
        })
    }
}

#[async_trait]
impl<T> SearchBackend<T> for InMemorySearchBackend<T>
where
    T: Record + Clone + Send + Sync,
{
    async fn search(&self, request: &ApiFilterRequest) -> Result<ApiFilterResponse<T>, SearchError> {
        self.execute(request)
    }
}

fn compare_field<T: Record>(a: &T, b: &T, field: &str, order: SortOrder) -> Ordering {
    let left = a.field_value(field).to_lowercase();
    let right = b.field_value(field).to_lowercase();
    match order {
        SortOrder::Asc => left.cmp(&right),
        SortOrder::Desc => right.cmp(&left),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{FilterCondition, FilterGroup};
    use crate::core::types::{GroupId, Logic, Operator};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn staff() -> Vec<Value> {
        vec![
            json!({"name": "Carol", "department": "Finance"}),
            json!({"name": "alice", "department": "Engineering"}),
            json!({"name": "Bob", "department": "Engineering"}),
            json!({"name": "Dave", "department": "Support"}),
            json!({"name": "Eve", "department": "Engineering"}),
        ]
    }

    fn names(response: &ApiFilterResponse<Value>) -> Vec<String> {
        response.data.iter().map(|v| v.field_value("name")).collect()
    }

    fn engineering() -> Vec<FilterGroup> {
        vec![FilterGroup::new(
            GroupId::from("g"),
            Logic::And,
            vec![FilterCondition::new("department", Operator::Equals, "engineering", Logic::And)],
        )]
    }

    #[test]
    fn test_unfiltered_first_page() {
        let backend = InMemorySearchBackend::new(staff());
        let response = backend.execute(&ApiFilterRequest::new(vec![], 1, 2)).unwrap();

        assert_eq!(response.total, 5);
        assert_eq!(response.total_pages, 3);
        assert_eq!(names(&response), vec!["Carol", "alice"]);
    }

    #[test]
    fn test_filtered_sorted_page() {
        let backend = InMemorySearchBackend::new(staff());
        let request = ApiFilterRequest::new(engineering(), 1, 10)
            .with_sort(Some(crate::core::models::SortSpec::new("name", SortOrder::Asc)));
        let response = backend.execute(&request).unwrap();

        assert_eq!(response.total, 3);
        assert_eq!(response.total_pages, 1);
        assert_eq!(names(&response), vec!["alice", "Bob", "Eve"]);
    }

    #[test]
    fn test_descending_last_page() {
        let backend = InMemorySearchBackend::new(staff());
        let request = ApiFilterRequest::new(engineering(), 2, 2)
            .with_sort(Some(crate::core::models::SortSpec::new("name", SortOrder::Desc)));
        let response = backend.execute(&request).unwrap();

        assert_eq!(names(&response), vec!["alice"]);
        assert_eq!(response.page, 2);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let backend = InMemorySearchBackend::new(staff());
        let response = backend.execute(&ApiFilterRequest::new(vec![], 9, 2)).unwrap();
        assert!(response.data.is_empty());
        assert_eq!(response.total, 5);
    }

    #[test]
    fn test_invalid_paging_is_rejected() {
        let backend = InMemorySearchBackend::new(staff());
        assert!(matches!(
            backend.execute(&ApiFilterRequest::new(vec![], 1, 0)),
            Err(SearchError::InvalidRequest(_))
        ));
        assert!(matches!(
            backend.execute(&ApiFilterRequest::new(vec![], 0, 10)),
            Err(SearchError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_async_search() {
        let backend = InMemorySearchBackend::new(staff());
        let response = backend
            .search(&ApiFilterRequest::new(engineering(), 1, 10))
            .await
            .unwrap();
        assert_eq!(response.total, 3);
    }
}
