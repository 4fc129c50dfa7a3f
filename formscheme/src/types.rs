//! Core value model and per-field configuration.
//!
//! [`Value`] is the validated, storage-ready representation of a field,
//! distinct from the transient display string the user edits. Config and
//! granularity types serialize with kebab-case via serde.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The validated model-side representation of a field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value. For nullable field kinds this is valid data.
    Null,
    /// A string field value, trimmed at conversion.
    Text(String),
    /// A well-formed calendar date.
    Date(NaiveDate),
    /// Display input that failed date parsing. Retained so the well-formedness
    /// validator can report it instead of the input silently disappearing.
    InvalidDate(String),
    /// A selected option key.
    Key(String),
    /// A nested composite, children in scheme order.
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render as JSON for model snapshots. Dates become ISO-8601 strings;
    /// text is trimmed here, at assembly time, so validators upstream still
    /// see the raw input.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.trim().to_string()),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Value::InvalidDate(raw) => serde_json::Value::String(raw.clone()),
            Value::Key(k) => serde_json::Value::String(k.clone()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Which calendar unit a date picker opens on.
///
/// Picker hint only — the engine carries it through config but never
/// interprets it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DateGranularity {
    Year,
    Month,
    #[default]
    Day,
}

/// Per-descriptor option bag.
///
/// Mutable only while its scheme is under construction; immutable once the
/// scheme is finished. Validators read it but never write it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    /// Calendar unit a date picker should open on.
    pub start_granularity: DateGranularity,
    /// Whether dates after the current year are acceptable.
    pub allow_future: bool,
    /// Whether dates before the current year are acceptable.
    pub allow_past: bool,
    /// Option key substituted when a select field has no input yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_key: Option<String>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            start_granularity: DateGranularity::Day,
            allow_future: true,
            allow_past: true,
            default_key: None,
        }
    }
}
