//! Validator chains and the domain presets for date, text, and select fields.
//!
//! A validator is a pure predicate over a candidate model value and its
//! field's config. Validators are ordered within a descriptor; evaluation
//! runs every validator and collects all messages, so the UI can render the
//! full list while the first message stays deterministic.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Local};
use indexmap::IndexMap;

use crate::types::{FieldConfig, Value};

/// Late-bound option set for select fields: option key to display label.
///
/// Invoked on demand so the set always reflects the caller's current data,
/// never a cached copy.
pub type OptionsFn = Arc<dyn Fn() -> IndexMap<String, String> + Send + Sync>;

type CheckFn = Box<dyn Fn(&Value, &FieldConfig) -> Option<String> + Send + Sync>;

/// A single named check in a descriptor's validator chain.
///
/// Stateless and side-effect-free: given a candidate value and the field's
/// config, returns a human-readable message when the value is rejected.
pub struct Validator {
    name: &'static str,
    check: CheckFn,
}

impl Validator {
    pub fn new<F>(name: &'static str, check: F) -> Self
    where
        F: Fn(&Value, &FieldConfig) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name,
            check: Box::new(check),
        }
    }

    /// Short identifier used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the check. `None` means the value passes.
    pub fn check(&self, value: &Value, config: &FieldConfig) -> Option<String> {
        (self.check)(value, config)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").field("name", &self.name).finish()
    }
}

/// Fails on absent or empty text.
pub fn not_empty() -> Validator {
    Validator::new("not-empty", |value, _| match value {
        Value::Null => Some("value is required".to_string()),
        Value::Text(s) if s.is_empty() => Some("value is required".to_string()),
        _ => None,
    })
}

/// Fails on whitespace-only text.
pub fn not_whitespace() -> Validator {
    Validator::new("not-whitespace", |value, _| match value {
        Value::Text(s) if !s.is_empty() && s.trim().is_empty() => {
            Some("value must not be blank".to_string())
        }
        _ => None,
    })
}

/// Fails when a date is absent.
pub fn not_missing() -> Validator {
    Validator::new("not-missing", |value, _| {
        value.is_null().then(|| "no date given".to_string())
    })
}

/// Fails when date input could not be parsed.
pub fn not_invalid_date() -> Validator {
    Validator::new("not-invalid-date", |value, _| match value {
        Value::InvalidDate(_) => Some("invalid date".to_string()),
        _ => None,
    })
}

/// Fails when future dates are disallowed and the date's year is strictly
/// greater than the current year.
///
/// Year-granularity comparison is an intentional coarse policy — downstream
/// behavior depends on it, so it must not be tightened to a full date compare.
pub fn not_in_future() -> Validator {
    Validator::new("not-in-future", |value, config| match value {
        Value::Date(d) if !config.allow_future && d.year() > Local::now().year() => {
            Some("date cannot be in the future".to_string())
        }
        _ => None,
    })
}

/// Fails when past dates are disallowed and the date's year is strictly less
/// than the current year. Same year-granularity policy as [`not_in_future`].
pub fn not_in_past() -> Validator {
    Validator::new("not-in-past", |value, config| match value {
        Value::Date(d) if !config.allow_past && d.year() < Local::now().year() => {
            Some("date cannot be in the past".to_string())
        }
        _ => None,
    })
}

/// Fails when a selected key is not a member of the late-bound option set.
/// Absence passes — pair with [`not_empty`] for required selects.
pub fn one_of(options: OptionsFn) -> Validator {
    Validator::new("one-of", move |value, _| match value {
        Value::Key(key) if !options().contains_key(key) => {
            Some(format!("'{key}' is not an allowed option"))
        }
        _ => None,
    })
}
