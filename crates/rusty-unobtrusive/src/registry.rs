// File: src/registry.rs
// Purpose: Adapter registry - maps data-val-<rule> attributes to rule entries

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::attributes::{append_model_prefix, model_prefix, split_and_trim, AttributeSet};
use crate::dom::{Document, Element, NodeId};
use crate::options::FieldOptions;
use crate::remote::{HttpMethod, RemoteSpec};
use crate::rules::{RuleKind, RuleParams};

/// Everything an adapter may look at while translating one element
pub struct AdapterContext<'a> {
    pub document: &'a Document,
    pub node: NodeId,
    pub element: &'a Element,
    /// Enclosing form, when parsing inside one
    pub form: Option<NodeId>,
    /// Value of `data-val-<rule>`
    pub message: Option<&'a str>,
    /// Declared params that were present on the element
    pub params: &'a HashMap<String, String>,
    pub attributes: &'a AttributeSet,
}

impl<'a> AdapterContext<'a> {
    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn field_name(&self) -> &'a str {
        self.element.name().unwrap_or_default()
    }

    /// Insert a rule plus this attribute's message into `out`
    pub fn set(&self, out: &mut FieldOptions, kind: RuleKind, params: RuleParams) -> bool {
        out.set(kind, params, self.message)
    }
}

type AdaptFn = dyn Fn(&AdapterContext<'_>, &mut FieldOptions) + Send + Sync;

/// A named adapter and the parameter suffixes it reads
#[derive(Clone)]
pub struct Adapter {
    name: String,
    params: Vec<String>,
    adapt: Arc<AdaptFn>,
}

impl Adapter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn adapt(&self, ctx: &AdapterContext<'_>, out: &mut FieldOptions) {
        (self.adapt)(ctx, out)
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Registry of adapters, keyed by the lower-case name after `data-val-`
#[derive(Clone, Debug)]
pub struct AdapterRegistry {
    adapters: IndexMap<String, Adapter>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AdapterRegistry {
    /// Registry with no adapters at all
    pub fn empty() -> Self {
        Self {
            adapters: IndexMap::new(),
        }
    }

    /// Registry with the built-in adapters
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register_defaults();
        registry
    }

    /// Add or replace an adapter
    pub fn add<F>(&mut self, name: &str, params: &[&str], adapt: F) -> &mut Self
    where
        F: Fn(&AdapterContext<'_>, &mut FieldOptions) + Send + Sync + 'static,
    {
        let name = name.to_ascii_lowercase();
        self.adapters.insert(
            name.clone(),
            Adapter {
                name,
                params: params.iter().map(|p| p.to_ascii_lowercase()).collect(),
                adapt: Arc::new(adapt),
            },
        );
        self
    }

    /// Attribute presence alone enables `rule` (defaults to the adapter name)
    pub fn add_bool(&mut self, name: &str, rule: Option<RuleKind>) -> &mut Self {
        let rule = rule.unwrap_or_else(|| RuleKind::from_name(name));
        self.add(name, &[], move |ctx, out| {
            ctx.set(out, rule.clone(), RuleParams::Flag);
        })
    }

    /// `data-val-<name>-<attribute>` becomes the single rule parameter
    pub fn add_single_val(&mut self, name: &str, attribute: &str, rule: Option<RuleKind>) -> &mut Self {
        let rule = rule.unwrap_or_else(|| RuleKind::from_name(name));
        let key = attribute.to_ascii_lowercase();
        self.add(name, &[attribute], move |ctx, out| match ctx.param(&key) {
            Some(value) => {
                ctx.set(out, rule.clone(), RuleParams::Value(value.to_string()));
            }
            None => debug!(rule = %rule, field = ctx.field_name(), "missing '{}' param, rule skipped", key),
        })
    }

    /// `-min`/`-max` params: both present gives the min-max rule, otherwise
    /// whichever bound is present gives its own rule
    pub fn add_min_max(
        &mut self,
        name: &str,
        min_rule: Option<RuleKind>,
        max_rule: Option<RuleKind>,
        min_max_rule: Option<RuleKind>,
    ) -> &mut Self {
        let adapter = name.to_string();
        self.add(name, &["min", "max"], move |ctx, out| {
            match (ctx.param("min"), ctx.param("max"), &min_rule, &max_rule, &min_max_rule) {
                (Some(min), Some(max), _, _, Some(rule)) => {
                    ctx.set(out, rule.clone(), RuleParams::Bounds(min.to_string(), max.to_string()));
                }
                (Some(min), _, Some(rule), _, _) => {
                    ctx.set(out, rule.clone(), RuleParams::Value(min.to_string()));
                }
                (_, Some(max), _, Some(rule), _) => {
                    ctx.set(out, rule.clone(), RuleParams::Value(max.to_string()));
                }
                _ => debug!(adapter = %adapter, field = ctx.field_name(), "no usable bound, rule skipped"),
            }
        })
    }

    pub fn get(&self, name: &str) -> Option<&Adapter> {
        self.adapters.get(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Adapter> {
        self.adapters.shift_remove(&name.to_ascii_lowercase())
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    fn register_defaults(&mut self) {
        self.add_single_val("regex", "pattern", None)
            .add_single_val("extension", "extension", None)
            .add_bool("creditcard", None)
            .add_bool("date", None)
            .add_bool("digits", None)
            .add_bool("email", None)
            .add_bool("number", None)
            .add_bool("url", None)
            .add_min_max(
                "length",
                Some(RuleKind::MinLength),
                Some(RuleKind::MaxLength),
                Some(RuleKind::RangeLength),
            )
            .add_min_max(
                "range",
                Some(RuleKind::Min),
                Some(RuleKind::Max),
                Some(RuleKind::Range),
            )
            .add_min_max("minlength", Some(RuleKind::MinLength), None, None)
            .add_min_max("maxlength", None, Some(RuleKind::MaxLength), None)
            .add("equalto", &["other"], equal_to)
            .add("required", &[], required)
            .add("remote", &["url", "type", "additionalfields"], remote)
            .add("password", &["min", "nonalphamin", "regex"], password)
            .add("fileextensions", &["extensions"], file_extensions);
    }
}

/// Compare rule: the other field must exist in the same form
fn equal_to(ctx: &AdapterContext<'_>, out: &mut FieldOptions) {
    let Some(other) = ctx.param("other") else {
        debug!(field = ctx.field_name(), "equalto without 'other', rule skipped");
        return;
    };
    let full_name = append_model_prefix(other, model_prefix(ctx.field_name()));
    let scope = ctx.form.unwrap_or(ctx.document.root());
    if ctx.document.elements_named(scope, &full_name).is_empty() {
        debug!(field = ctx.field_name(), other = %full_name, "equalto target not found, rule skipped");
        return;
    }
    ctx.set(out, RuleKind::EqualTo, RuleParams::Field(full_name));
}

// Checkboxes always post a value, so `required` on them means nothing client-side.
fn required(ctx: &AdapterContext<'_>, out: &mut FieldOptions) {
    if !ctx.element.is_checkbox() {
        ctx.set(out, RuleKind::Required, RuleParams::Flag);
    }
}

fn remote(ctx: &AdapterContext<'_>, out: &mut FieldOptions) {
    let Some(url) = ctx.param("url") else {
        debug!(field = ctx.field_name(), "remote without 'url', rule skipped");
        return;
    };
    let prefix = model_prefix(ctx.field_name());
    let additional_fields = split_and_trim(ctx.param("additionalfields").unwrap_or(ctx.field_name()))
        .iter()
        .map(|f| append_model_prefix(f, prefix))
        .collect();
    let spec = RemoteSpec {
        url: url.to_string(),
        method: HttpMethod::parse(ctx.param("type")),
        additional_fields,
    };
    ctx.set(out, RuleKind::Remote, RuleParams::Remote(spec));
}

fn password(ctx: &AdapterContext<'_>, out: &mut FieldOptions) {
    if let Some(min) = ctx.param("min") {
        ctx.set(out, RuleKind::MinLength, RuleParams::Value(min.to_string()));
    }
    if let Some(count) = ctx.param("nonalphamin") {
        ctx.set(out, RuleKind::NonAlphaMin, RuleParams::Value(count.to_string()));
    }
    if let Some(pattern) = ctx.param("regex") {
        ctx.set(out, RuleKind::Regex, RuleParams::Value(pattern.to_string()));
    }
}

fn file_extensions(ctx: &AdapterContext<'_>, out: &mut FieldOptions) {
    match ctx.param("extensions") {
        Some(list) => {
            ctx.set(out, RuleKind::Extension, RuleParams::Value(list.to_string()));
        }
        None => debug!(field = ctx.field_name(), "fileextensions without a list, rule skipped"),
    }
}
