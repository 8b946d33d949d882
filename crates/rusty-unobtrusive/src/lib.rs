// Rusty Unobtrusive - data-val-* validation for server-rendered forms
// Attributes in, rules out; forms stay bound as the document changes

//! Server-side frameworks describe validation declaratively with
//! `data-val-*` attributes. This crate reads those attributes through an
//! [`AdapterRegistry`], builds per-form [`FormOptions`], binds one
//! [`Validator`] per form with a [`FormBinder`], and runs `remote` rules over
//! HTTP with stale responses discarded.
//!
//! ```ignore
//! let config = Config::load_default()?;
//! let transport = HttpTransport::new(&config.remote)?;
//! let mut page = Page::load(html, FormBinder::new(transport, &config));
//! page.type_text("Age", "15").await?;
//! let outcome = page.click_submit("regular-submit").await?;
//! ```

pub mod attributes;
pub mod binder;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod options;
pub mod page;
pub mod registry;
pub mod remote;
pub mod rules;
pub mod validators;

pub use attributes::AttributeSet;
pub use binder::{BindState, FormBinder, SubmitOutcome};
pub use config::{Config, RemoteConfig, ValidationConfig};
pub use dom::{Document, Element, Mutation, NodeId};
pub use engine::{FieldCheck, FieldInput, FieldState, RuleMethods, Validator};
pub use error::{DomError, RemoteError};
pub use options::{FieldOptions, FormOptions, OptionsParser};
pub use page::{ErrorInfo, Page};
pub use registry::{Adapter, AdapterContext, AdapterRegistry};
pub use remote::{
    HttpMethod, HttpTransport, RemoteOutcome, RemoteRequest, RemoteRunner, RemoteSpec,
    RemoteTransport,
};
pub use rules::{ParamShape, RuleKind, RuleParams};
