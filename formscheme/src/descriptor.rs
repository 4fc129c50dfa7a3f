//! Field descriptors — the typed bridge between the display string a user
//! edits and the validated model value a scheme produces.
//!
//! Nullability is a variant flag on the kind, not a subclass: each kind
//! supplies its own conversion and default policy, dispatched by `match`.
//! Config and validator methods are chainable and legal only while the
//! descriptor's scheme is under construction; misuse is recorded as a defect
//! and surfaced when the builder finishes.

use std::fmt;

use chrono::{Local, NaiveDate};

use crate::error::SchemeError;
use crate::scheme::Scheme;
use crate::types::{DateGranularity, FieldConfig, Value};
use crate::validator::{self, OptionsFn, Validator};

/// The closed set of field kinds.
pub enum FieldKind {
    /// Free text. Required variants convert absent input to empty text so the
    /// model value is never null; nullable variants pass absence through.
    Text { required: bool },
    /// Calendar date. Required variants substitute "today" for absent input;
    /// unparsable input becomes [`Value::InvalidDate`].
    Date { required: bool },
    /// One key out of a caller-supplied, late-bound option set.
    Select { options: OptionsFn },
    /// A nested child scheme. Model value and validity aggregate its children.
    Nested { scheme: Scheme },
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text { required } => {
                f.debug_struct("Text").field("required", required).finish()
            }
            FieldKind::Date { required } => {
                f.debug_struct("Date").field("required", required).finish()
            }
            FieldKind::Select { .. } => f.debug_struct("Select").finish_non_exhaustive(),
            FieldKind::Nested { scheme } => {
                f.debug_struct("Nested").field("scheme", scheme).finish()
            }
        }
    }
}

/// A single named field: identity, kind, config, and ordered validators.
///
/// Owned exclusively by the scheme that created it; never shared across
/// schemes.
#[derive(Debug)]
pub struct FieldDescriptor {
    name: String,
    display_name: String,
    kind: FieldKind,
    config: FieldConfig,
    validators: Vec<Validator>,
    defect: Option<SchemeError>,
}

impl FieldDescriptor {
    fn new(name: &str, display_name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            kind,
            config: FieldConfig::default(),
            validators: Vec::new(),
            defect: None,
        }
    }

    pub(crate) fn text(name: &str, display_name: &str, required: bool) -> Self {
        Self::new(name, display_name, FieldKind::Text { required })
    }

    pub(crate) fn date(name: &str, display_name: &str, required: bool) -> Self {
        Self::new(name, display_name, FieldKind::Date { required })
    }

    pub(crate) fn select(name: &str, display_name: &str, options: OptionsFn) -> Self {
        Self::new(name, display_name, FieldKind::Select { options })
    }

    pub(crate) fn nested(name: &str, display_name: &str, scheme: Scheme) -> Self {
        Self::new(name, display_name, FieldKind::Nested { scheme })
    }

    // --- Identity and shape ---

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn is_required(&self) -> bool {
        match &self.kind {
            FieldKind::Text { required } | FieldKind::Date { required } => *required,
            FieldKind::Select { .. } => self.config.default_key.is_some(),
            FieldKind::Nested { .. } => false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self.kind, FieldKind::Nested { .. })
    }

    /// The child scheme of a nested field.
    pub fn nested_scheme(&self) -> Option<&Scheme> {
        match &self.kind {
            FieldKind::Nested { scheme } => Some(scheme),
            _ => None,
        }
    }

    // --- Conversion ---

    /// Render a model value back to its display representation.
    pub fn convert_to_display(&self, value: &Value) -> Option<String> {
        match value {
            Value::Null | Value::Object(_) => None,
            Value::Text(s) => Some(s.clone()),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Value::InvalidDate(raw) => Some(raw.clone()),
            Value::Key(k) => Some(k.clone()),
        }
    }

    /// Convert the latest display input to a model value, applying the kind's
    /// default policy for absent input.
    ///
    /// Text keeps the raw input so whitespace validators see what the user
    /// typed; trimming happens when the model is assembled.
    pub fn convert_to_value(&self, display: Option<&str>) -> Value {
        let input = display.map(str::trim).filter(|s| !s.is_empty());
        match &self.kind {
            FieldKind::Text { required } => match display.filter(|s| !s.is_empty()) {
                Some(s) => Value::Text(s.to_string()),
                None if *required => Value::Text(String::new()),
                None => Value::Null,
            },
            FieldKind::Date { required } => match input {
                Some(s) => match s.parse::<NaiveDate>() {
                    Ok(d) => Value::Date(d),
                    Err(_) => Value::InvalidDate(s.to_string()),
                },
                None if *required => Value::Date(Local::now().date_naive()),
                None => Value::Null,
            },
            FieldKind::Select { .. } => match input {
                Some(s) => Value::Key(s.to_string()),
                None => match &self.config.default_key {
                    Some(key) => Value::Key(key.clone()),
                    None => Value::Null,
                },
            },
            // Composite values are assembled by the context from children.
            FieldKind::Nested { .. } => Value::Null,
        }
    }

    /// Run the full validator chain in registration order and collect every
    /// message. Valid means the returned list is empty.
    pub fn errors_for(&self, value: &Value) -> Vec<String> {
        self.validators
            .iter()
            .filter_map(|v| v.check(value, &self.config))
            .collect()
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    // --- Chainable configuration (construction phase only) ---

    /// Append a custom validator. Order is registration order.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Require non-empty text, or a selected key for select fields.
    pub fn not_empty(self) -> Self {
        if !matches!(
            self.kind,
            FieldKind::Text { .. } | FieldKind::Select { .. }
        ) {
            return self.poison("not_empty");
        }
        self.validator(validator::not_empty())
    }

    /// Reject whitespace-only text.
    pub fn not_whitespace(self) -> Self {
        self.text_only("not_whitespace", validator::not_whitespace())
    }

    /// Require a date to be present.
    pub fn not_missing(self) -> Self {
        self.date_only("not_missing", validator::not_missing())
    }

    /// Reject unparsable date input.
    pub fn not_invalid_date(self) -> Self {
        self.date_only("not_invalid_date", validator::not_invalid_date())
    }

    /// Reject dates whose year exceeds the current year when `allow_future`
    /// is off.
    pub fn not_in_future(self) -> Self {
        self.date_only("not_in_future", validator::not_in_future())
    }

    /// Reject dates whose year precedes the current year when `allow_past`
    /// is off.
    pub fn not_in_past(self) -> Self {
        self.date_only("not_in_past", validator::not_in_past())
    }

    /// Which calendar unit the date picker opens on.
    pub fn start_selecting_with(mut self, granularity: DateGranularity) -> Self {
        if !matches!(self.kind, FieldKind::Date { .. }) {
            return self.poison("start_selecting_with");
        }
        self.config.start_granularity = granularity;
        self
    }

    /// Whether dates after the current year are acceptable.
    pub fn allow_future(mut self, can: bool) -> Self {
        if !matches!(self.kind, FieldKind::Date { .. }) {
            return self.poison("allow_future");
        }
        self.config.allow_future = can;
        self
    }

    /// Whether dates before the current year are acceptable.
    pub fn allow_past(mut self, can: bool) -> Self {
        if !matches!(self.kind, FieldKind::Date { .. }) {
            return self.poison("allow_past");
        }
        self.config.allow_past = can;
        self
    }

    /// Option key substituted while a select field has no input.
    pub fn default_key(mut self, key: &str) -> Self {
        if !matches!(self.kind, FieldKind::Select { .. }) {
            return self.poison("default_key");
        }
        self.config.default_key = Some(key.to_string());
        self
    }

    pub(crate) fn defect(&self) -> Option<&SchemeError> {
        self.defect.as_ref()
    }

    fn text_only(self, option: &'static str, validator: Validator) -> Self {
        if !matches!(self.kind, FieldKind::Text { .. }) {
            return self.poison(option);
        }
        self.validator(validator)
    }

    fn date_only(self, option: &'static str, validator: Validator) -> Self {
        if !matches!(self.kind, FieldKind::Date { .. }) {
            return self.poison(option);
        }
        self.validator(validator)
    }

    fn poison(mut self, option: &'static str) -> Self {
        if self.defect.is_none() {
            self.defect = Some(SchemeError::IncompatibleOption {
                field: self.name.clone(),
                option,
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use indexmap::IndexMap;
    use std::sync::Arc;

    #[test]
    fn required_text_never_converts_to_null() {
        let field = FieldDescriptor::text("firstName", "First name", true);
        assert_eq!(field.convert_to_value(None), Value::Text(String::new()));
        assert_eq!(field.convert_to_value(Some("")), Value::Text(String::new()));
        assert_eq!(
            field.convert_to_value(Some("  Anna  ")),
            Value::Text("  Anna  ".into())
        );
    }

    #[test]
    fn nullable_text_passes_absence_through() {
        let field = FieldDescriptor::text("middleName", "Middle name", false);
        assert_eq!(field.convert_to_value(None), Value::Null);
        assert_eq!(field.convert_to_value(Some("")), Value::Null);
        assert_eq!(
            field.convert_to_value(Some("Petrovna")),
            Value::Text("Petrovna".into())
        );
    }

    #[test]
    fn whitespace_only_text_reaches_validators_raw() {
        let field =
            FieldDescriptor::text("middleName", "Middle name", false).not_whitespace();
        let value = field.convert_to_value(Some("   "));
        assert_eq!(value, Value::Text("   ".into()));
        assert_eq!(
            field.errors_for(&value),
            vec!["value must not be blank".to_string()]
        );
    }

    #[test]
    fn not_empty_is_chainable_on_selects() {
        let options: OptionsFn = Arc::new(no_options);
        let field = FieldDescriptor::select("nationality", "Nationality", options).not_empty();
        assert!(field.defect().is_none());
        assert_eq!(
            field.errors_for(&Value::Null),
            vec!["value is required".to_string()]
        );
        assert!(field.errors_for(&Value::Key("RU".into())).is_empty());
    }

    #[test]
    fn required_date_defaults_to_today() {
        let field = FieldDescriptor::date("birthDate", "Birth date", true);
        let today = Local::now().date_naive();
        assert_eq!(field.convert_to_value(None), Value::Date(today));
    }

    #[test]
    fn nullable_date_defaults_to_null() {
        let field = FieldDescriptor::date("diedOn", "Date of death", false);
        assert_eq!(field.convert_to_value(None), Value::Null);
    }

    #[test]
    fn unparsable_date_survives_as_invalid() {
        let field = FieldDescriptor::date("birthDate", "Birth date", true);
        let value = field.convert_to_value(Some("12/04/banana"));
        assert_eq!(value, Value::InvalidDate("12/04/banana".into()));

        let field = field.not_invalid_date();
        assert_eq!(field.errors_for(&value), vec!["invalid date".to_string()]);
    }

    #[test]
    fn date_round_trips_through_display() {
        let field = FieldDescriptor::date("birthDate", "Birth date", true);
        let value = field.convert_to_value(Some("1990-04-12"));
        assert_eq!(field.convert_to_display(&value), Some("1990-04-12".into()));
        if let Value::Date(d) = value {
            assert_eq!((d.year(), d.month(), d.day()), (1990, 4, 12));
        } else {
            panic!("expected Date value");
        }
    }

    fn no_options() -> IndexMap<String, String> {
        IndexMap::new()
    }

    #[test]
    fn select_applies_default_key() {
        let options: OptionsFn = Arc::new(no_options);
        let field =
            FieldDescriptor::select("nationality", "Nationality", options).default_key("RU");
        assert_eq!(field.convert_to_value(None), Value::Key("RU".into()));
        assert_eq!(
            field.convert_to_value(Some("KZ")),
            Value::Key("KZ".into())
        );
        assert!(field.is_required());
    }

    #[test]
    fn select_without_default_converts_absence_to_null() {
        let options: OptionsFn = Arc::new(no_options);
        let field = FieldDescriptor::select("nationality", "Nationality", options);
        assert_eq!(field.convert_to_value(None), Value::Null);
        assert!(!field.is_required());
    }

    #[test]
    fn validators_run_in_registration_order() {
        let field = FieldDescriptor::date("birthDate", "Birth date", true)
            .allow_future(false)
            .not_missing()
            .not_invalid_date()
            .not_in_future();

        let next_year = Local::now().year() + 1;
        let future = Value::Date(NaiveDate::from_ymd_opt(next_year, 1, 1).unwrap());
        assert_eq!(
            field.errors_for(&future),
            vec!["date cannot be in the future".to_string()]
        );
        assert_eq!(
            field.errors_for(&Value::Null),
            vec!["no date given".to_string()]
        );
    }

    #[test]
    fn date_option_on_text_field_is_a_defect() {
        let field = FieldDescriptor::text("firstName", "First name", true).allow_future(false);
        assert_eq!(
            field.defect(),
            Some(&SchemeError::IncompatibleOption {
                field: "firstName".into(),
                option: "allow_future",
            })
        );
    }

    #[test]
    fn first_defect_wins() {
        let field = FieldDescriptor::text("firstName", "First name", true)
            .not_missing()
            .default_key("RU");
        assert_eq!(
            field.defect(),
            Some(&SchemeError::IncompatibleOption {
                field: "firstName".into(),
                option: "not_missing",
            })
        );
    }
}
