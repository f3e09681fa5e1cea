//! Field lookup for records evaluated in memory.
//!
//! The evaluator only ever sees strings: numbers, booleans and dates are
//! compared through their textual form.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// A record whose fields can be read by name
pub trait Record {
    /// Textual value of `field`, empty when the field is missing or null
    fn field_value(&self, field: &str) -> String;
}

/// Field getter for any [`Record`], usable where a `Fn(&T, &str) -> String` is expected
pub fn record_value<T: Record + ?Sized>(record: &T, field: &str) -> String {
    record.field_value(field)
}

impl Record for Value {
    fn field_value(&self, field: &str) -> String {
        match self.get(field) {
            Some(value) => value_to_string(value),
            None => String::new(),
        }
    }
}

impl Record for BTreeMap<String, String> {
    fn field_value(&self, field: &str) -> String {
        self.get(field).cloned().unwrap_or_default()
    }
}

impl Record for HashMap<String, String> {
    fn field_value(&self, field: &str) -> String {
        self.get(field).cloned().unwrap_or_default()
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
