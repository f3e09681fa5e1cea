//! Boolean evaluation of condition groups against a single record.
//!
//! Conditions inside a group, and groups inside a query, are combined with
//! [`sequential_fold`]: a strict left-to-right fold with no operator
//! precedence. `A OR B AND C` is `(A OR B) AND C`. This is not standard
//! boolean precedence and must not be "fixed"; saved queries depend on it.

use crate::core::models::{FilterCondition, FilterGroup};
use crate::core::types::{Logic, Operator};

/// Compare one condition value against one target value.
///
/// The condition value is trimmed and lower-cased, the target is lower-cased
/// but not trimmed.
pub fn evaluate(operator: Operator, condition_value: &str, target_value: &str) -> bool {
    let needle = condition_value.trim().to_lowercase();
    let target = target_value.to_lowercase();

    match operator {
        Operator::Contains => target.contains(&needle),
        Operator::NotContains => !target.contains(&needle),
        Operator::Equals => target == needle,
        Operator::NotEquals => target != needle,
        Operator::StartsWith => target.starts_with(&needle),
        Operator::EndsWith => target.ends_with(&needle),
    }
}

/// Left-to-right fold of `(logic, result)` pairs.
///
/// The first result seeds the accumulator and its logic is ignored; every
/// later result is joined with that entry's own logic. Returns `None` for an
/// empty input.
pub fn sequential_fold<I>(results: I) -> Option<bool>
where
    I: IntoIterator<Item = (Logic, bool)>,
{
    let mut iter = results.into_iter();
    let (_, seed) = iter.next()?;
    Some(iter.fold(seed, |acc, (logic, next)| logic.combine(acc, next)))
}

/// Evaluate a single condition against a record
pub fn evaluate_condition<T, F>(condition: &FilterCondition, record: &T, field_value: &F) -> bool
where
    T: ?Sized,
    F: Fn(&T, &str) -> String + ?Sized,
{
    let target = field_value(record, &condition.field);
    evaluate(condition.operator, &condition.value, &target)
}

/// Evaluate one group. A group without active conditions is vacuously true.
pub fn evaluate_group<T, F>(group: &FilterGroup, record: &T, field_value: &F) -> bool
where
    T: ?Sized,
    F: Fn(&T, &str) -> String + ?Sized,
{
    // Evaluated eagerly; every active condition is checked.
    let results: Vec<(Logic, bool)> = group
        .active_conditions()
        .map(|c| (c.logic, evaluate_condition(c, record, field_value)))
        .collect();

    sequential_fold(results).unwrap_or(true)
}

/// Evaluate the whole query against a record.
///
/// When no group has an active condition the record passes unfiltered.
/// Otherwise every group is evaluated (blank groups count as `true`) and the
/// results are folded with each group's `group_logic`.
pub fn evaluate_query<T, F>(groups: &[FilterGroup], record: &T, field_value: &F) -> bool
where
    T: ?Sized,
    F: Fn(&T, &str) -> String + ?Sized,
{
    if !groups.iter().any(FilterGroup::has_active_conditions) {
        return true;
    }

    let results: Vec<(Logic, bool)> = groups
        .iter()
        .map(|g| (g.group_logic, evaluate_group(g, record, field_value)))
        .collect();

    sequential_fold(results).unwrap_or(true)
}
