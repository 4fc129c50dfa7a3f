//! Declarative validation schemes with reactive per-field state.
//!
//! `formscheme` describes an editable model as an ordered tree of typed field
//! descriptors. Each descriptor converts between the display string a user
//! edits and a validated model value, and owns an ordered chain of pure
//! validators plus a per-field config bag. A [`Scheme`] is built once per
//! model shape; a [`ValidationContext`] binds it to one editing session and
//! recomputes per-field model values, error lists, and aggregate validity
//! lazily as inputs change.
//!
//! # Architecture
//!
//! - **Builder/finalize split**: descriptors and their config are mutable only
//!   while a [`SchemeBuilder`] is open. A finished scheme is immutable and may
//!   back any number of independent contexts.
//! - **Pull-based reactivity**: writes mark arena cells dirty; reads recompute
//!   lazily and memoize. A read immediately after a write always observes it.
//! - **Errors as data**: invalid user input is returned as ordered message
//!   lists, never raised. Raising is reserved for schema misuse.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use formscheme::{Scheme, ValidationContext};
//!
//! let scheme = Scheme::builder()
//!     .string("firstName", "First name", |f| f.not_empty())
//!     .date("birthDate", "Birth date", |f| {
//!         f.allow_future(false)
//!             .not_missing()
//!             .not_invalid_date()
//!             .not_in_future()
//!     })
//!     .finish()
//!     .unwrap();
//!
//! let mut ctx = ValidationContext::new(Arc::new(scheme));
//! assert!(!ctx.is_valid()); // empty first name
//!
//! ctx.set_display_value("firstName", Some("Anna")).unwrap();
//! ctx.set_display_value("birthDate", Some("1990-04-12")).unwrap();
//! assert!(ctx.is_valid());
//!
//! let model = ctx.snapshot().unwrap();
//! assert_eq!(model["firstName"], "Anna");
//! assert_eq!(model["birthDate"], "1990-04-12");
//! ```

pub mod context;
pub mod descriptor;
pub mod error;
pub mod scheme;
pub mod types;
pub mod validator;

pub use context::ValidationContext;
pub use descriptor::{FieldDescriptor, FieldKind};
pub use error::{ContextError, ContextResult, SchemeError, SchemeResult};
pub use scheme::{Scheme, SchemeBuilder};
pub use types::{DateGranularity, FieldConfig, Value};
pub use validator::{OptionsFn, Validator};
