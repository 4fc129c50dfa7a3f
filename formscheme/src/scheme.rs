//! Scheme tree and its fluent builder.
//!
//! A [`Scheme`] is the immutable, ordered description of an editable model
//! shape, built once per model type. The builder is the only way to obtain
//! one: it records the first definition defect (duplicate name, incompatible
//! option) and fails `finish()` with it, so no partially-defined scheme ever
//! escapes.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::descriptor::FieldDescriptor;
use crate::error::{SchemeError, SchemeResult};
use crate::validator::{self, OptionsFn};

/// An ordered, immutable tree of field descriptors for one model shape.
///
/// Field names are unique per level, recursively. A finished scheme is
/// read-only and may be shared (`Arc<Scheme>`) across any number of
/// independent validation contexts.
#[derive(Debug)]
pub struct Scheme {
    fields: IndexMap<String, FieldDescriptor>,
}

impl Scheme {
    /// Start defining a scheme.
    pub fn builder() -> SchemeBuilder {
        SchemeBuilder::new()
    }

    /// Get a top-level descriptor by name.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Top-level descriptors in registration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(name, desc)| (name.as_str(), desc))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolve a dotted path ("applicantName.firstName") to its descriptor.
    pub fn descriptor_at(&self, path: &str) -> Option<&FieldDescriptor> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.nested_scheme()?.get(segment)?;
        }
        Some(current)
    }
}

/// Fluent builder for a [`Scheme`].
///
/// One registration method per field kind; each takes the field name, its
/// display name, and a `configure` callback that receives the fresh
/// descriptor and returns it after chaining config and validator calls.
/// Holds no runtime editing state.
pub struct SchemeBuilder {
    fields: IndexMap<String, FieldDescriptor>,
    defect: Option<SchemeError>,
}

impl SchemeBuilder {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            defect: None,
        }
    }

    /// Register a required string field.
    pub fn string<F>(self, name: &str, display_name: &str, configure: F) -> Self
    where
        F: FnOnce(FieldDescriptor) -> FieldDescriptor,
    {
        self.register(configure(FieldDescriptor::text(name, display_name, true)))
    }

    /// Register a nullable string field. Absent or blank input converts to
    /// null, which is itself valid data.
    pub fn maybe_string<F>(self, name: &str, display_name: &str, configure: F) -> Self
    where
        F: FnOnce(FieldDescriptor) -> FieldDescriptor,
    {
        self.register(configure(FieldDescriptor::text(name, display_name, false)))
    }

    /// Register a required date field. Absent input converts to today so the
    /// model value is never null.
    pub fn date<F>(self, name: &str, display_name: &str, configure: F) -> Self
    where
        F: FnOnce(FieldDescriptor) -> FieldDescriptor,
    {
        self.register(configure(FieldDescriptor::date(name, display_name, true)))
    }

    /// Register a nullable date field.
    pub fn maybe_date<F>(self, name: &str, display_name: &str, configure: F) -> Self
    where
        F: FnOnce(FieldDescriptor) -> FieldDescriptor,
    {
        self.register(configure(FieldDescriptor::date(name, display_name, false)))
    }

    /// Register a select field over a late-bound option set. The options
    /// callback is invoked on demand, so membership always checks against the
    /// caller's current data. A membership validator is attached implicitly.
    pub fn select<O, F>(self, name: &str, display_name: &str, options: O, configure: F) -> Self
    where
        O: Fn() -> IndexMap<String, String> + Send + Sync + 'static,
        F: FnOnce(FieldDescriptor) -> FieldDescriptor,
    {
        let options: OptionsFn = Arc::new(options);
        let descriptor = FieldDescriptor::select(name, display_name, options.clone())
            .validator(validator::one_of(options));
        self.register(configure(descriptor))
    }

    /// Register a nested object field whose children are defined by a child
    /// builder. Child defects propagate to this builder.
    pub fn nested<F>(mut self, name: &str, display_name: &str, build: F) -> Self
    where
        F: FnOnce(SchemeBuilder) -> SchemeBuilder,
    {
        match build(SchemeBuilder::new()).finish() {
            Ok(scheme) => self.register(FieldDescriptor::nested(name, display_name, scheme)),
            Err(err) => {
                if self.defect.is_none() {
                    self.defect = Some(err);
                }
                self
            }
        }
    }

    /// Finalize. Fails with the first recorded defect, if any.
    pub fn finish(self) -> SchemeResult<Scheme> {
        if let Some(defect) = self.defect {
            return Err(defect);
        }
        debug!(fields = self.fields.len(), "scheme built");
        Ok(Scheme {
            fields: self.fields,
        })
    }

    fn register(mut self, descriptor: FieldDescriptor) -> Self {
        if self.defect.is_some() {
            return self;
        }
        if let Some(defect) = descriptor.defect() {
            self.defect = Some(defect.clone());
            return self;
        }
        let name = descriptor.name().to_string();
        if self.fields.contains_key(&name) {
            self.defect = Some(SchemeError::DuplicateField { name });
            return self;
        }
        self.fields.insert(name, descriptor);
        self
    }
}

impl Default for SchemeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DateGranularity;

    fn nationalities() -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        map.insert("RU".to_string(), "Russia".to_string());
        map.insert("KZ".to_string(), "Kazakhstan".to_string());
        map
    }

    #[test]
    fn fields_keep_registration_order() {
        let scheme = Scheme::builder()
            .string("lastName", "Last name", |f| f.not_empty())
            .string("firstName", "First name", |f| f.not_empty())
            .maybe_string("middleName", "Middle name", |f| f)
            .finish()
            .unwrap();

        let names: Vec<_> = scheme.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["lastName", "firstName", "middleName"]);
    }

    #[test]
    fn duplicate_registration_fails_and_no_scheme_is_produced() {
        let result = Scheme::builder()
            .string("firstName", "First name", |f| f.not_empty())
            .string("firstName", "First name again", |f| f)
            .finish();

        assert_eq!(
            result.unwrap_err(),
            SchemeError::DuplicateField {
                name: "firstName".into()
            }
        );
    }

    #[test]
    fn descriptor_defect_fails_finish() {
        let result = Scheme::builder()
            .string("firstName", "First name", |f| f.allow_future(false))
            .finish();

        assert!(matches!(
            result.unwrap_err(),
            SchemeError::IncompatibleOption { .. }
        ));
    }

    #[test]
    fn nested_duplicate_propagates() {
        let result = Scheme::builder()
            .nested("applicantName", "Name", |b| {
                b.string("firstName", "First name", |f| f)
                    .string("firstName", "First name", |f| f)
            })
            .finish();

        assert_eq!(
            result.unwrap_err(),
            SchemeError::DuplicateField {
                name: "firstName".into()
            }
        );
    }

    #[test]
    fn same_name_in_different_levels_is_fine() {
        let scheme = Scheme::builder()
            .string("name", "Name", |f| f)
            .nested("parent", "Parent", |b| b.string("name", "Name", |f| f))
            .finish()
            .unwrap();
        assert_eq!(scheme.len(), 2);
    }

    #[test]
    fn descriptor_at_walks_nested_paths() {
        let scheme = Scheme::builder()
            .nested("applicantName", "Name", |b| {
                b.string("firstName", "First name", |f| f)
            })
            .date("birthDate", "Birth date", |f| {
                f.start_selecting_with(DateGranularity::Year)
            })
            .finish()
            .unwrap();

        let first = scheme.descriptor_at("applicantName.firstName").unwrap();
        assert_eq!(first.display_name(), "First name");

        let birth = scheme.descriptor_at("birthDate").unwrap();
        assert_eq!(birth.config().start_granularity, DateGranularity::Year);

        assert!(scheme.descriptor_at("applicantName.lastName").is_none());
        assert!(scheme.descriptor_at("birthDate.firstName").is_none());
    }

    #[test]
    fn select_gets_implicit_membership_validator() {
        let scheme = Scheme::builder()
            .select("nationality", "Nationality", nationalities, |f| {
                f.default_key("RU")
            })
            .finish()
            .unwrap();

        let field = scheme.get("nationality").unwrap();
        assert_eq!(field.validators().len(), 1);
        assert_eq!(field.validators()[0].name(), "one-of");
        assert!(field
            .errors_for(&crate::types::Value::Key("XX".into()))
            .iter()
            .any(|m| m.contains("XX")));
    }
}
