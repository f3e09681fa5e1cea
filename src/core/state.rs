//! Editable condition tree.
//!
//! `FilterState` owns the groups and is the only thing that mutates them. It
//! always keeps at least one group, and every group keeps at least one
//! condition, so the UI always has a row to edit.

use crate::core::error::FilterError;
use crate::core::ids::{GroupIdGenerator, UuidGroupIds};
use crate::core::models::{FilterCondition, FilterGroup, applied_condition_count};
use crate::core::types::{ConditionKey, GroupId, Logic, Operator, OperatorOption, SearchField};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const MAX_ID_ATTEMPTS: usize = 64;

pub struct FilterState {
    groups: Vec<FilterGroup>,
    fields: Vec<SearchField>,
    operators: Vec<OperatorOption>,
    ids: Arc<dyn GroupIdGenerator>,
}

impl fmt::Debug for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterState")
            .field("groups", &self.groups)
            .field("fields", &self.fields.len())
            .field("operators", &self.operators.len())
            .finish()
    }
}

impl FilterState {
    /// Create the seed tree: one group holding one empty condition
    pub fn new(fields: Vec<SearchField>, operators: Vec<OperatorOption>) -> Self {
        Self::with_id_generator(fields, operators, Arc::new(UuidGroupIds))
    }

    pub fn with_id_generator(
        fields: Vec<SearchField>,
        operators: Vec<OperatorOption>,
        ids: Arc<dyn GroupIdGenerator>,
    ) -> Self {
        let mut state = Self {
            groups: Vec::new(),
            fields,
            operators,
            ids,
        };
        let seed = state.seed_group();
        state.groups.push(seed);
        state
    }

    pub fn groups(&self) -> &[FilterGroup] {
        &self.groups
    }

    pub fn group(&self, id: &GroupId) -> Option<&FilterGroup> {
        self.groups.iter().find(|g| &g.id == id)
    }

    pub fn fields(&self) -> &[SearchField] {
        &self.fields
    }

    pub fn operators(&self) -> &[OperatorOption] {
        &self.operators
    }

    /// Conditions with a non-blank value, across all groups
    pub fn applied_condition_count(&self) -> usize {
        applied_condition_count(&self.groups)
    }

    /// Append a new seeded group and return its id
    pub fn add_group(&mut self) -> GroupId {
        let group = self.seed_group();
        let id = group.id.clone();
        self.groups.push(group);
        id
    }

    /// Remove a group. The last remaining group cannot be removed.
    pub fn remove_group(&mut self, id: &GroupId) -> bool {
        if self.groups.len() <= 1 {
            debug!("Refusing to remove the last filter group {}", id);
            return false;
        }
        let before = self.groups.len();
        self.groups.retain(|g| &g.id != id);
        self.groups.len() != before
    }

    /// Append an empty condition to a group
    pub fn add_condition(&mut self, id: &GroupId) -> bool {
        let condition = self.seed_condition();
        match self.group_mut(id) {
            Some(group) => {
                group.conditions.push(condition);
                true
            }
            None => false,
        }
    }

    /// Remove a condition. A group's last condition cannot be removed.
    pub fn remove_condition(&mut self, id: &GroupId, index: usize) -> bool {
        let Some(group) = self.group_mut(id) else {
            return false;
        };
        if group.conditions.len() <= 1 {
            debug!("Refusing to remove the last condition of group {}", id);
            return false;
        }
        if index >= group.conditions.len() {
            debug!("Condition {} out of range in group {}", index, id);
            return false;
        }
        group.conditions.remove(index);
        true
    }

    /// Set the field, operator or value of one condition.
    ///
    /// Operator codes are parsed here; unknown codes leave the tree untouched.
    pub fn update_condition(
        &mut self,
        id: &GroupId,
        index: usize,
        key: ConditionKey,
        value: &str,
    ) -> Result<bool, FilterError> {
        let Some(condition) = self.condition_mut(id, index) else {
            return Ok(false);
        };
        match key {
            ConditionKey::Field => condition.field = value.to_string(),
            ConditionKey::Operator => condition.operator = Operator::parse(value)?,
            ConditionKey::Value => condition.value = value.to_string(),
        }
        Ok(true)
    }

    /// Set how a condition joins the conditions before it
    pub fn update_condition_logic(&mut self, id: &GroupId, index: usize, logic: Logic) -> bool {
        match self.condition_mut(id, index) {
            Some(condition) => {
                condition.logic = logic;
                true
            }
            None => false,
        }
    }

    /// Set how a group joins the groups before it
    pub fn update_group_logic(&mut self, id: &GroupId, logic: Logic) -> bool {
        match self.group_mut(id) {
            Some(group) => {
                group.group_logic = logic;
                true
            }
            None => false,
        }
    }

    /// Reset to the seed tree. The new group gets a fresh id.
    pub fn clear_all(&mut self) {
        self.groups = vec![self.seed_group()];
    }

    /// Replace the whole tree, e.g. with a query loaded from a file.
    ///
    /// The tree is rejected when it has no groups, an empty group, or a
    /// repeated group id.
    pub fn replace_groups(&mut self, groups: Vec<FilterGroup>) -> Result<(), FilterError> {
        validate_groups(&groups)?;
        self.groups = groups;
        Ok(())
    }

    /// Replace the tree with a JSON array of groups
    pub fn load_json(&mut self, json: &str) -> Result<(), FilterError> {
        let groups: Vec<FilterGroup> = serde_json::from_str(json)?;
        self.replace_groups(groups)
    }

    /// The tree as a JSON array of groups, the shape `load_json` reads
    pub fn to_json(&self) -> Result<String, FilterError> {
        Ok(serde_json::to_string_pretty(&self.groups)?)
    }

    fn seed_condition(&self) -> FilterCondition {
        let field = self
            .fields
            .first()
            .map(|f| f.value.clone())
            .unwrap_or_default();
        let operator = self.operators.first().map(|o| o.value).unwrap_or_default();
        FilterCondition::empty(field, operator)
    }

    fn seed_group(&self) -> FilterGroup {
        FilterGroup::new(self.fresh_id(), Logic::And, vec![self.seed_condition()])
    }

    // Loaded trees may already hold ids the generator would hand out.
    fn fresh_id(&self) -> GroupId {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            if self.group(&id).is_none() {
                return id;
            }
        }
        warn!(
            "Group id generator produced {} ids already in use, falling back to UUIDs",
            MAX_ID_ATTEMPTS
        );
        loop {
            let id = UuidGroupIds.next_id();
            if self.group(&id).is_none() {
                return id;
            }
        }
    }

    fn group_mut(&mut self, id: &GroupId) -> Option<&mut FilterGroup> {
        let group = self.groups.iter_mut().find(|g| &g.id == id);
        if group.is_none() {
            debug!("No filter group with id {}", id);
        }
        group
    }

    fn condition_mut(&mut self, id: &GroupId, index: usize) -> Option<&mut FilterCondition> {
        let condition = self.group_mut(id)?.conditions.get_mut(index);
        if condition.is_none() {
            debug!("Condition {} out of range in group {}", index, id);
        }
        condition
    }
}

/// Check the structural invariants of a condition tree
pub fn validate_groups(groups: &[FilterGroup]) -> Result<(), FilterError> {
    if groups.is_empty() {
        return Err(FilterError::EmptyQuery);
    }
    let mut seen = HashSet::new();
    for group in groups {
        if group.conditions.is_empty() {
            return Err(FilterError::EmptyGroup(group.id.clone()));
        }
        if !seen.insert(&group.id) {
            return Err(FilterError::DuplicateGroupId(group.id.clone()));
        }
    }
    Ok(())
}
