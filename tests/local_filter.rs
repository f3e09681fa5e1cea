//! End-to-end checks of local (in-memory) filtering

use std::collections::BTreeMap;
use std::sync::Arc;

use advfilter::config::{Config, FilterSettings};
use advfilter::core::ids::SequentialGroupIds;
use advfilter::core::models::{FilterCondition, FilterGroup};
use advfilter::core::types::{ConditionKey, GroupId, Logic, Operator, SearchField};
use advfilter::core::FilterState;
use advfilter::services::{AdvancedFilter, ExecutionMode, FilterEdit, LocalSource};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[derive(Debug, Clone)]
struct Employee {
    name: &'static str,
    employee_no: &'static str,
    department: &'static str,
    position: &'static str,
}

fn roster() -> Vec<Employee> {
    vec![
        Employee { name: "Alice Wong", employee_no: "E001", department: "Engineering", position: "Engineer" },
        Employee { name: "Bob Stone", employee_no: "E002", department: "Finance", position: "Analyst" },
        Employee { name: "Carla Diaz", employee_no: "E003", department: "Engineering", position: "Manager" },
        Employee { name: "Dan Olsen", employee_no: "F104", department: "Operations", position: "Engineer" },
    ]
}

fn employee_field(e: &Employee, field: &str) -> String {
    match field {
        "name" => e.name,
        "employeeNo" => e.employee_no,
        "department" => e.department,
        "position" => e.position,
        _ => "",
    }
    .to_string()
}

fn state() -> FilterState {
    FilterState::with_id_generator(
        vec![
            SearchField::input("name", "Name"),
            SearchField::input("department", "Department"),
        ],
        Operator::catalog(),
        Arc::new(SequentialGroupIds::new()),
    )
}

fn engine() -> AdvancedFilter<Employee> {
    let source = LocalSource::with_getter(roster(), employee_field);
    let mut filter = AdvancedFilter::new(state(), ExecutionMode::Local(source), &FilterSettings::default());
    filter.edit(FilterEdit::SetPanelOpen(true)).unwrap();
    filter
}

fn names(filter: &AdvancedFilter<Employee>) -> Vec<&'static str> {
    filter.filtered_data().iter().map(|e| e.name).collect()
}

#[test]
fn test_single_condition_contains() {
    let mut filter = engine();
    let g = filter.groups()[0].id.clone();
    filter
        .edit(FilterEdit::UpdateCondition {
            group: g,
            index: 0,
            key: ConditionKey::Value,
            value: "o".to_string(),
        })
        .unwrap();

    assert_eq!(names(&filter), vec!["Alice Wong", "Bob Stone", "Dan Olsen"]);
    assert_eq!(filter.applied_condition_count(), 1);
}

#[test]
fn test_loaded_query_folds_left_to_right() {
    // position = engineer AND employeeNo starts with E OR department = finance
    // Left-to-right: (Engineer AND E*) OR Finance -> Alice, Bob
    let groups = vec![FilterGroup::new(
        GroupId::from("g1"),
        Logic::And,
        vec![
            FilterCondition::new("position", Operator::Equals, "engineer", Logic::And),
            FilterCondition::new("employeeNo", Operator::StartsWith, "e", Logic::And),
            FilterCondition::new("department", Operator::Equals, "finance", Logic::Or),
        ],
    )];

    let mut filter = engine();
    filter.edit(FilterEdit::ReplaceGroups(groups)).unwrap();
    assert_eq!(names(&filter), vec!["Alice Wong", "Bob Stone"]);
}

#[test]
fn test_blank_group_counts_as_true() {
    let groups = vec![
        FilterGroup::new(
            GroupId::from("g1"),
            Logic::And,
            vec![FilterCondition::new("department", Operator::Equals, "engineering", Logic::And)],
        ),
        FilterGroup::new(
            GroupId::from("g2"),
            Logic::Or,
            vec![FilterCondition::new("name", Operator::Contains, "  ", Logic::And)],
        ),
        FilterGroup::new(
            GroupId::from("g3"),
            Logic::And,
            vec![FilterCondition::new("position", Operator::NotEquals, "manager", Logic::And)],
        ),
    ];

    let mut filter = engine();
    filter.edit(FilterEdit::ReplaceGroups(groups)).unwrap();
    // (engineering OR <blank>) AND not manager
    assert_eq!(names(&filter), vec!["Alice Wong", "Bob Stone", "Dan Olsen"]);
    assert_eq!(filter.applied_condition_count(), 2);
}

#[test]
fn test_invalid_tree_is_rejected_and_kept() {
    let mut filter = engine();
    let before = filter.groups().to_vec();

    let duplicate = vec![
        FilterGroup::new(GroupId::from("x"), Logic::And, vec![FilterCondition::empty("name", Operator::Contains)]),
        FilterGroup::new(GroupId::from("x"), Logic::Or, vec![FilterCondition::empty("name", Operator::Contains)]),
    ];
    assert!(filter.edit(FilterEdit::ReplaceGroups(duplicate)).is_err());
    assert!(filter.edit(FilterEdit::ReplaceGroups(Vec::new())).is_err());
    assert_eq!(filter.groups(), before.as_slice());
}

#[test]
fn test_query_file_json_drives_filtering() {
    let query = r#"[
        {"id": "a", "groupLogic": "AND", "conditions": [
            {"field": "department", "operator": "equals", "value": "Engineering", "logic": "AND"}
        ]},
        {"id": "b", "groupLogic": "OR", "conditions": [
            {"field": "employeeNo", "operator": "ends_with", "value": "104", "logic": "AND"}
        ]}
    ]"#;
    let groups: Vec<FilterGroup> = serde_json::from_str(query).unwrap();

    let mut filter = engine();
    filter.edit(FilterEdit::ReplaceGroups(groups)).unwrap();
    assert_eq!(names(&filter), vec!["Alice Wong", "Carla Diaz", "Dan Olsen"]);
}

#[test]
fn test_map_records_with_configured_catalog() {
    let cfg = Config::embedded().unwrap();
    let rows: Vec<BTreeMap<String, String>> = vec![
        BTreeMap::from([("name".to_string(), "Eve".to_string()), ("status".to_string(), "active".to_string())]),
        BTreeMap::from([("name".to_string(), "Finn".to_string()), ("status".to_string(), "resigned".to_string())]),
    ];
    let mut filter = AdvancedFilter::new(
        cfg.new_filter_state(),
        ExecutionMode::Local(LocalSource::from_records(rows)),
        &cfg.filter,
    );
    let g = filter.groups()[0].id.clone();
    filter.edit(FilterEdit::SetPanelOpen(true)).unwrap();
    for (key, value) in [
        (ConditionKey::Field, "status"),
        (ConditionKey::Operator, "not_equals"),
        (ConditionKey::Value, "resigned"),
    ] {
        filter
            .edit(FilterEdit::UpdateCondition {
                group: g.clone(),
                index: 0,
                key,
                value: value.to_string(),
            })
            .unwrap();
    }

    let data = filter.filtered_data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].get("name").map(String::as_str), Some("Eve"));
}

#[test]
fn test_set_items_refilters() {
    let mut filter: AdvancedFilter<Value> = AdvancedFilter::new(
        state(),
        ExecutionMode::Local(LocalSource::from_records(vec![json!({"name": "Zed"})])),
        &FilterSettings::default(),
    );
    let g = filter.groups()[0].id.clone();
    filter.edit(FilterEdit::SetPanelOpen(true)).unwrap();
    filter
        .edit(FilterEdit::UpdateCondition {
            group: g,
            index: 0,
            key: ConditionKey::Value,
            value: "ann".to_string(),
        })
        .unwrap();
    assert!(filter.filtered_data().is_empty());

    assert!(filter.set_items(vec![json!({"name": "Hannah"}), json!({"name": "Joe"})]));
    assert_eq!(filter.filtered_data(), vec![&json!({"name": "Hannah"})]);
}
