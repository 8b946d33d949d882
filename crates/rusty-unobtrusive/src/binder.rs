// File: src/binder.rs
// Purpose: Form binder - attaches one validator per form and keeps it current as the document changes

use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::{Config, ValidationConfig};
use crate::dom::{Document, Mutation, NodeId};
use crate::engine::{FieldCheck, FieldState, RuleMethods, Validator};
use crate::options::OptionsParser;
use crate::registry::AdapterRegistry;
use crate::remote::{RemoteOutcome, RemoteRequest, RemoteRunner, RemoteTransport};

/// Binding lifecycle of one form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindState {
    #[default]
    Unbound,
    Bound,
    /// Bound again after a re-parse or a content change
    Rebound,
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Every field passed; the form may be posted
    pub valid: bool,
    /// `(field, message)` pairs in form order
    pub errors: Vec<(String, String)>,
    /// False when the form has no validator, in which case nothing was checked
    pub bound: bool,
}

/// Owns the adapter registry, the rule methods, the remote runner and one
/// [`Validator`] per bound form.
pub struct FormBinder<T> {
    registry: AdapterRegistry,
    methods: RuleMethods,
    runner: RemoteRunner<T>,
    settings: ValidationConfig,
    validators: HashMap<NodeId, Validator>,
    states: HashMap<NodeId, BindState>,
}

impl<T: RemoteTransport> FormBinder<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            registry: AdapterRegistry::with_defaults(),
            methods: RuleMethods::with_defaults(),
            runner: RemoteRunner::new(transport, config.remote.failure_message.clone()),
            settings: config.validation.clone(),
            validators: HashMap::new(),
            states: HashMap::new(),
        }
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Extension point for custom adapters; takes effect on the next parse
    pub fn adapters_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.registry
    }

    pub fn methods(&self) -> &RuleMethods {
        &self.methods
    }

    pub fn methods_mut(&mut self) -> &mut RuleMethods {
        &mut self.methods
    }

    pub fn runner(&self) -> &RemoteRunner<T> {
        &self.runner
    }

    pub fn state(&self, form: NodeId) -> BindState {
        self.states.get(&form).copied().unwrap_or_default()
    }

    pub fn validator(&self, form: NodeId) -> Option<&Validator> {
        self.validators.get(&form)
    }

    pub fn active_validators(&self) -> usize {
        self.validators.len()
    }

    /// Bind every form in the document
    pub fn bind_all(&mut self, doc: &Document) -> Vec<NodeId> {
        self.parse(doc, doc.root())
    }

    /// Re-scan `container` (its enclosing form plus every form inside it) and
    /// replace whatever validators those forms had
    pub fn parse(&mut self, doc: &Document, container: NodeId) -> Vec<NodeId> {
        let mut forms: Vec<NodeId> = doc.closest_form(container).into_iter().collect();
        for form in doc.forms_within(container) {
            if !forms.contains(&form) {
                forms.push(form);
            }
        }

        forms
            .into_iter()
            .filter(|form| self.attach(doc, *form) != BindState::Unbound)
            .collect()
    }

    /// Build fresh options for `form` and install a new validator, dropping
    /// the previous one. Forms without validated fields stay unbound.
    pub fn attach(&mut self, doc: &Document, form: NodeId) -> BindState {
        if !doc.is_attached(form) {
            self.unbind(form);
            return BindState::Unbound;
        }

        let options = OptionsParser::new(&self.registry).parse_form(doc, form, &self.settings);
        let previous = self.validators.remove(&form);
        if options.fields.is_empty() && previous.is_none() {
            debug!(form = form.index(), "no validated fields, form left unbound");
            return BindState::Unbound;
        }

        let fields = options.fields.len();
        self.validators.insert(form, Validator::new(form, options));
        let state = if previous.is_some() {
            BindState::Rebound
        } else {
            BindState::Bound
        };
        info!(form = form.index(), fields, ?state, "validator attached");
        self.states.insert(form, state);
        state
    }

    pub fn unbind(&mut self, form: NodeId) -> bool {
        self.states.remove(&form);
        let removed = self.validators.remove(&form).is_some();
        if removed {
            info!(form = form.index(), "validator detached");
        }
        removed
    }

    /// Drain the document's mutation records: forms that gained or lost
    /// content are re-parsed once each, forms no longer attached are unbound
    pub fn observe(&mut self, doc: &mut Document) -> Vec<NodeId> {
        let mut touched: Vec<NodeId> = Vec::new();
        let mut push = |form: NodeId| {
            if !touched.contains(&form) {
                touched.push(form);
            }
        };

        for mutation in doc.take_mutations() {
            match mutation {
                Mutation::Inserted { parent, nodes } => {
                    if let Some(form) = doc.closest_form(parent) {
                        push(form);
                    }
                    for node in nodes {
                        doc.forms_within(node).into_iter().for_each(&mut push);
                    }
                }
                Mutation::Removed { parent, node } => {
                    debug!(node = node.index(), "subtree removed");
                    if let Some(form) = parent.and_then(|p| doc.closest_form(p)) {
                        push(form);
                    }
                }
            }
        }

        let gone: Vec<NodeId> = self
            .validators
            .keys()
            .copied()
            .filter(|form| !doc.is_attached(*form))
            .collect();
        for form in gone {
            self.unbind(form);
        }

        touched
            .into_iter()
            .filter(|form| doc.is_attached(*form))
            .filter(|form| self.attach(doc, *form) != BindState::Unbound)
            .collect()
    }

    /// Synchronous check of one field, rendered immediately. A pending remote
    /// check is returned inside `FieldCheck::Remote` for the caller to run.
    pub fn check(&mut self, doc: &mut Document, form: NodeId, name: &str) -> Option<FieldCheck> {
        let validator = self.validators.get_mut(&form)?;
        let check = validator.check_field(doc, &self.methods, name);
        if !matches!(check, FieldCheck::Remote(_)) {
            render(validator, doc, name);
        }
        Some(check)
    }

    /// Start a remote check for `name`, if its synchronous rules pass and it
    /// has one. Any earlier request for the field becomes stale.
    pub fn begin_remote(&mut self, doc: &mut Document, form: NodeId, name: &str) -> Option<RemoteRequest> {
        match self.check(doc, form, name)? {
            FieldCheck::Remote(request) => Some(request),
            _ => None,
        }
    }

    /// Apply a remote outcome and render the field. Returns false for stale
    /// requests and for forms that have been unbound meanwhile.
    pub fn complete_remote(&mut self, doc: &mut Document, request: &RemoteRequest, outcome: RemoteOutcome) -> bool {
        let Some(validator) = self.validators.get_mut(&request.form) else {
            debug!(field = %request.field, "form unbound before remote answer, ignored");
            return false;
        };
        if !validator.complete_remote(request, outcome) {
            return false;
        }
        render(validator, doc, &request.field);
        true
    }

    /// Lazy validation when `element` loses focus
    pub async fn blur(&mut self, doc: &mut Document, element: NodeId) -> Option<FieldState> {
        let form = doc.closest_form(element)?;
        let name = doc.element(element)?.name()?.to_string();
        if !self.validators.get(&form)?.wants_blur_check(doc, &name) {
            return None;
        }

        if let Some(request) = self.begin_remote(doc, form, &name) {
            let outcome = self.runner.run(&request).await;
            self.complete_remote(doc, &request, outcome);
        }
        self.validators.get(&form).map(|v| v.state(&name))
    }

    /// Validate the whole form: synchronous rules, then every remote check
    /// concurrently, then error rendering
    pub async fn submit(&mut self, doc: &mut Document, form: NodeId) -> SubmitOutcome {
        let Some(validator) = self.validators.get_mut(&form) else {
            debug!(form = form.index(), "submit on an unbound form");
            return SubmitOutcome {
                valid: true,
                errors: Vec::new(),
                bound: false,
            };
        };

        let names: Vec<String> = validator.options().fields.keys().cloned().collect();
        let mut requests = Vec::new();
        for name in &names {
            validator.mark_submitted(name);
            if let FieldCheck::Remote(request) = validator.check_field(doc, &self.methods, name) {
                requests.push(request);
            }
        }

        let outcomes = join_all(requests.iter().map(|r| self.runner.run(r))).await;
        for (request, outcome) in requests.iter().zip(outcomes) {
            validator.complete_remote(request, outcome);
        }

        if let Err(e) = validator
            .show_errors(doc)
            .and_then(|_| validator.show_summary(doc))
        {
            warn!(form = form.index(), "failed to render errors: {}", e);
        }

        let outcome = SubmitOutcome {
            valid: validator.is_valid(),
            errors: validator.errors(),
            bound: true,
        };
        info!(
            form = form.index(),
            valid = outcome.valid,
            errors = outcome.errors.len(),
            remote = requests.len(),
            "form submitted"
        );
        outcome
    }
}

fn render(validator: &Validator, doc: &mut Document, name: &str) {
    if let Err(e) = validator
        .render_field(doc, name)
        .and_then(|_| validator.show_summary(doc))
    {
        warn!(field = name, "failed to render field state: {}", e);
    }
}
