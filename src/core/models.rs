use crate::core::types::{GroupId, Logic, Operator, SortOrder};
use serde::{Deserialize, Serialize};

/// A single field/operator/value predicate.
///
/// `logic` says how this condition joins the result of the conditions before
/// it in the same group. The first condition's `logic` is kept but ignored.
/// A condition read without a `logic` tag joins with OR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct FilterCondition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
    #[serde(default = "Logic::untagged")]
    pub logic: Logic,
}

impl FilterCondition {
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
        logic: Logic,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            logic,
        }
    }

    /// An editable placeholder row with no value
    pub fn empty(field: impl Into<String>, operator: Operator) -> Self {
        Self::new(field, operator, String::new(), Logic::And)
    }

    /// A condition only takes part in evaluation when its value is non-blank
    pub fn is_active(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

/// An ordered list of conditions plus the logic joining it to earlier groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    pub id: GroupId,
    #[serde(default = "Logic::untagged")]
    pub group_logic: Logic,
    pub conditions: Vec<FilterCondition>,
}

impl FilterGroup {
    pub fn new(id: GroupId, group_logic: Logic, conditions: Vec<FilterCondition>) -> Self {
        Self {
            id,
            group_logic,
            conditions,
        }
    }

    pub fn active_conditions(&self) -> impl Iterator<Item = &FilterCondition> {
        self.conditions.iter().filter(|c| c.is_active())
    }

    pub fn has_active_conditions(&self) -> bool {
        self.conditions.iter().any(FilterCondition::is_active)
    }
}

/// Number of conditions across all groups with a non-blank value
pub fn applied_condition_count(groups: &[FilterGroup]) -> usize {
    groups.iter().map(|g| g.active_conditions().count()).sum()
}

/// Server-side pagination state (remote mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationConfig {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl PaginationConfig {
    /// First page, nothing loaded yet
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size,
            total: 0,
            total_pages: 0,
        }
    }

    /// Number of pages needed to show `total` rows
    pub fn pages_for(total: usize, page_size: usize) -> usize {
        if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        }
    }

    /// Zero-based offset of the first row on the current page
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) * self.page_size
    }
}

/// Query sent to the remote search collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApiFilterRequest {
    #[serde(default)]
    pub condition_groups: Vec<FilterGroup>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    crate::config::DEFAULT_PAGE_SIZE
}

impl ApiFilterRequest {
    pub fn new(condition_groups: Vec<FilterGroup>, page: usize, page_size: usize) -> Self {
        Self {
            condition_groups,
            page,
            page_size,
            sort_by: None,
            sort_order: None,
        }
    }

    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        match sort {
            Some(SortSpec { field, order }) => {
                self.sort_by = Some(field);
                self.sort_order = Some(order);
            }
            None => {
                self.sort_by = None;
                self.sort_order = None;
            }
        }
        self
    }

    pub fn applied_condition_count(&self) -> usize {
        applied_condition_count(&self.condition_groups)
    }
}

/// Field and direction to sort remote results by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// One page of results from the remote search collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFilterResponse<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T> ApiFilterResponse<T> {
    /// No rows, first page
    pub fn empty(page_size: usize) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: 1,
            page_size,
            total_pages: 0,
        }
    }

    pub fn pagination(&self) -> PaginationConfig {
        PaginationConfig {
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}
