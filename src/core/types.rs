use crate::core::error::FilterError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// How a condition (or group) combines with the accumulated result before it.
///
/// On the wire `AND` (any case) means [`Logic::And`]; every other value,
/// including `null`, means [`Logic::Or`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    /// Combine the running result with the next one
    pub fn combine(self, acc: bool, next: bool) -> bool {
        match self {
            Logic::And => acc && next,
            Logic::Or => acc || next,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Logic::And => Logic::Or,
            Logic::Or => Logic::And,
        }
    }

    /// Lenient wire reading: only `AND` selects conjunction
    pub fn from_wire(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("AND") {
            Logic::And
        } else {
            Logic::Or
        }
    }

    /// Value taken when a condition or group carries no logic tag
    pub fn untagged() -> Self {
        Logic::Or
    }
}

impl<'de> Deserialize<'de> for Logic {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LogicVisitor)
    }
}

struct LogicVisitor;

impl<'de> Visitor<'de> for LogicVisitor {
    type Value = Logic;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a logic tag such as \"AND\" or \"OR\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Logic, E> {
        Ok(Logic::from_wire(v))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Logic, E> {
        Ok(Logic::Or)
    }

    fn visit_i64<E: de::Error>(self, _v: i64) -> Result<Logic, E> {
        Ok(Logic::Or)
    }

    fn visit_u64<E: de::Error>(self, _v: u64) -> Result<Logic, E> {
        Ok(Logic::Or)
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<Logic, E> {
        Ok(Logic::Or)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Logic, E> {
        Ok(Logic::Or)
    }

    fn visit_none<E: de::Error>(self) -> Result<Logic, E> {
        Ok(Logic::Or)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Logic, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// Supported comparison operators.
///
/// The set is closed: codes outside it are rejected when parsed or
/// deserialized instead of silently matching every record.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operator {
    #[default]
    Contains,
    NotContains,
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
}

impl Operator {
    /// Parse an operator code, e.g. `not_contains`
    pub fn parse(code: &str) -> Result<Self, FilterError> {
        Self::from_str(code.trim()).map_err(|_| FilterError::UnknownOperator(code.to_string()))
    }

    /// Default label shown in operator pickers
    pub fn label(&self) -> &'static str {
        match self {
            Operator::Contains => "Contains",
            Operator::NotContains => "Does not contain",
            Operator::Equals => "Equals",
            Operator::NotEquals => "Does not equal",
            Operator::StartsWith => "Starts with",
            Operator::EndsWith => "Ends with",
        }
    }

    /// Full catalog of operators with their default labels
    pub fn catalog() -> Vec<OperatorOption> {
        Operator::iter()
            .map(|op| OperatorOption {
                value: op,
                label: op.label().to_string(),
            })
            .collect()
    }
}

/// Operator catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct OperatorOption {
    pub value: Operator,
    pub label: String,
}

/// How a field's value is captured in the UI
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldType {
    #[default]
    Input,
    Select,
    Mixed,
}

/// A selectable value for `select`/`mixed` fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

/// Field catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct SearchField {
    pub value: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, alias = "allowcustominput", skip_serializing_if = "Option::is_none")]
    pub allow_custom_input: Option<bool>,
}

impl SearchField {
    /// Free-text field
    pub fn input(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            field_type: FieldType::Input,
            options: None,
            placeholder: None,
            allow_custom_input: None,
        }
    }

    /// Field restricted to a list of options
    pub fn select(
        value: impl Into<String>,
        label: impl Into<String>,
        options: Vec<FieldOption>,
    ) -> Self {
        Self {
            field_type: FieldType::Select,
            options: Some(options),
            ..Self::input(value, label)
        }
    }

    /// Whether the user may type a value not present in `options`
    pub fn accepts_custom_input(&self) -> bool {
        match self.field_type {
            FieldType::Input => true,
            FieldType::Select => false,
            FieldType::Mixed => self.allow_custom_input.unwrap_or(true),
        }
    }
}

/// Sort direction for remote requests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Unique identifier for a filter group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Which part of a condition an update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConditionKey {
    Field,
    Operator,
    Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_codes() {
        assert_eq!(Operator::parse("contains").unwrap(), Operator::Contains);
        assert_eq!(Operator::parse(" ends_with ").unwrap(), Operator::EndsWith);
        assert_eq!(Operator::NotEquals.to_string(), "not_equals");
        assert_eq!(Operator::StartsWith.as_ref(), "starts_with");
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = Operator::parse("greater_than").unwrap_err();
        assert!(matches!(err, FilterError::UnknownOperator(ref code) if code == "greater_than"));

        let json = serde_json::from_str::<Operator>("\"regex\"");
        assert!(json.is_err());
    }

    #[test]
    fn test_operator_catalog_lists_every_operator() {
        let catalog = Operator::catalog();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog[0].value, Operator::Contains);
        assert_eq!(catalog[1].label, "Does not contain");
    }

    #[test]
    fn test_logic_wire_format() {
        assert_eq!(serde_json::to_string(&Logic::And).unwrap(), "\"AND\"");
        assert_eq!(serde_json::from_str::<Logic>("\"OR\"").unwrap(), Logic::Or);
        assert_eq!(Logic::from_str("or").unwrap(), Logic::Or);
        assert_eq!(Logic::And.toggled(), Logic::Or);
    }

    #[test]
    fn test_logic_reading_is_lenient() {
        assert_eq!(serde_json::from_str::<Logic>("\"and\"").unwrap(), Logic::And);
        assert_eq!(serde_json::from_str::<Logic>("\" And \"").unwrap(), Logic::And);
        assert_eq!(serde_json::from_str::<Logic>("\"or\"").unwrap(), Logic::Or);
        assert_eq!(serde_json::from_str::<Logic>("\"xor\"").unwrap(), Logic::Or);
        assert_eq!(serde_json::from_str::<Logic>("null").unwrap(), Logic::Or);
        assert_eq!(serde_json::from_str::<Logic>("1").unwrap(), Logic::Or);
        assert_eq!(serde_yaml::from_str::<Logic>("and").unwrap(), Logic::And);
    }

    #[test]
    fn test_search_field_deserialization() {
        let json = r#"{"value":"status","label":"Status","type":"mixed",
            "options":[{"value":"active","label":"Active"}],"allowCustomInput":false}"#;
        let field: SearchField = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_type, FieldType::Mixed);
        assert!(!field.accepts_custom_input());
        assert_eq!(field.options.as_ref().map(Vec::len), Some(1));

        assert!(SearchField::input("name", "Name").accepts_custom_input());
    }
}
