// File: src/engine.rs
// Purpose: Rule evaluation - method table, per-form validator state, error rendering

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::dom::{Document, Element, NodeId};
use crate::error::DomError;
use crate::options::{FieldOptions, FormOptions};
use crate::remote::{RemoteOutcome, RemoteRequest, RemoteSpec};
use crate::rules::{format_message, RuleKind, RuleParams};
use crate::validators;

/// Message for a rule with neither an attribute message nor a default
pub const FALLBACK_MESSAGE: &str = "Please fix this field.";

/// Live view of one field (all elements sharing its name) inside a form
pub struct FieldInput<'a> {
    pub document: &'a Document,
    pub form: NodeId,
    pub name: &'a str,
    pub elements: Vec<NodeId>,
}

impl<'a> FieldInput<'a> {
    pub fn new(document: &'a Document, form: NodeId, name: &'a str) -> Self {
        Self {
            document,
            form,
            name,
            elements: document.elements_named(form, name),
        }
    }

    fn members(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.elements.iter().filter_map(|n| self.document.element(*n))
    }

    pub fn is_checkable(&self) -> bool {
        self.members().next().is_some_and(Element::is_checkable)
    }

    pub fn checked_count(&self) -> usize {
        self.members().filter(|e| e.is_checkable() && e.checked).count()
    }

    /// Checked member's value for checkables, else the first element's value
    pub fn value(&self) -> String {
        if self.is_checkable() {
            return self
                .members()
                .find(|e| e.is_checkable() && e.checked)
                .map(checked_value)
                .unwrap_or_default();
        }
        self.members()
            .next()
            .map(|e| e.value.replace('\r', ""))
            .unwrap_or_default()
    }

    /// Checked count for checkables, character count otherwise
    pub fn length(&self) -> usize {
        if self.is_checkable() {
            self.checked_count()
        } else {
            self.value().chars().count()
        }
    }

    pub fn is_blank(&self) -> bool {
        if self.is_checkable() {
            self.checked_count() == 0
        } else {
            self.value().trim().is_empty()
        }
    }

    pub fn is_hidden(&self) -> bool {
        !self.elements.is_empty() && self.elements.iter().all(|n| self.document.is_hidden(*n))
    }

    /// Current value of another field in the same form
    pub fn value_of(&self, other: &str) -> String {
        FieldInput::new(self.document, self.form, other).value()
    }

    /// Value a remote check sends for `name`; an unchecked checkbox falls
    /// back to its hidden companion
    pub fn remote_value_of(&self, name: &str) -> String {
        let field = FieldInput::new(self.document, self.form, name);
        let members: Vec<&Element> = field.members().collect();
        if members.iter().any(|e| e.is_checkbox()) {
            members
                .iter()
                .find(|e| e.is_checkbox() && e.checked)
                .map(|e| checked_value(e))
                .or_else(|| {
                    members
                        .iter()
                        .find(|e| e.input_type() == "hidden")
                        .map(|e| e.value.clone())
                })
                .unwrap_or_default()
        } else {
            field.value()
        }
    }
}

// Browsers report "on" for a checked box without a value attribute
fn checked_value(element: &Element) -> String {
    if element.attrs.contains_key("value") {
        element.value.clone()
    } else {
        "on".to_string()
    }
}

type MethodFn = dyn Fn(&FieldInput<'_>, &RuleParams) -> bool + Send + Sync;

/// Rule name -> check function, plus default messages
#[derive(Clone)]
pub struct RuleMethods {
    methods: HashMap<RuleKind, Arc<MethodFn>>,
    messages: HashMap<RuleKind, String>,
}

impl Default for RuleMethods {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for RuleMethods {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.methods.keys().map(RuleKind::name).collect();
        names.sort_unstable();
        f.debug_struct("RuleMethods").field("methods", &names).finish()
    }
}

impl RuleMethods {
    pub fn empty() -> Self {
        Self {
            methods: HashMap::new(),
            messages: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut methods = Self::empty();
        methods.register_defaults();
        methods
    }

    /// Add or replace the check behind `kind`
    pub fn add_method<F>(&mut self, kind: RuleKind, default_message: &str, method: F) -> &mut Self
    where
        F: Fn(&FieldInput<'_>, &RuleParams) -> bool + Send + Sync + 'static,
    {
        self.messages.insert(kind.clone(), default_message.to_string());
        self.methods.insert(kind, Arc::new(method));
        self
    }

    pub fn has_method(&self, kind: &RuleKind) -> bool {
        self.methods.contains_key(kind)
    }

    /// `None` when no method is registered for `kind`
    pub fn check(&self, kind: &RuleKind, input: &FieldInput<'_>, params: &RuleParams) -> Option<bool> {
        self.methods.get(kind).map(|method| method(input, params))
    }

    /// Default message with `{n}` placeholders filled from `params`
    pub fn default_message(&self, kind: &RuleKind, params: &RuleParams) -> String {
        let template = self
            .messages
            .get(kind)
            .map(String::as_str)
            .unwrap_or(FALLBACK_MESSAGE);
        format_message(template, &params.positional())
    }

    fn register_defaults(&mut self) {
        self.add_method(RuleKind::Required, "This field is required.", |input, _| {
            !input.is_blank()
        })
        .add_method(RuleKind::Email, "Please enter a valid email address.", |input, _| {
            validators::is_valid_email(&input.value())
        })
        .add_method(RuleKind::Url, "Please enter a valid URL.", |input, _| {
            validators::is_valid_url(&input.value())
        })
        .add_method(RuleKind::Date, "Please enter a valid date.", |input, _| {
            validators::is_valid_date(&input.value())
        })
        .add_method(RuleKind::Digits, "Please enter only digits.", |input, _| {
            validators::is_digits(&input.value())
        })
        .add_method(RuleKind::Number, "Please enter a valid number.", |input, _| {
            validators::is_number(&input.value())
        })
        .add_method(RuleKind::CreditCard, "Please enter a valid credit card number.", |input, _| {
            validators::is_credit_card(&input.value())
        })
        .add_method(RuleKind::MinLength, "Please enter at least {0} characters.", |input, params| {
            bound(params).is_some_and(|min| input.length() as f64 >= min)
        })
        .add_method(RuleKind::MaxLength, "Please enter no more than {0} characters.", |input, params| {
            bound(params).is_some_and(|max| input.length() as f64 <= max)
        })
        .add_method(
            RuleKind::RangeLength,
            "Please enter a value between {0} and {1} characters long.",
            |input, params| {
                bounds(params).is_some_and(|(min, max)| {
                    let len = input.length() as f64;
                    len >= min && len <= max
                })
            },
        )
        .add_method(RuleKind::Min, "Please enter a value greater than or equal to {0}.", |input, params| {
            match (validators::parse_number(&input.value()), bound(params)) {
                (Some(value), Some(min)) => value >= min,
                _ => false,
            }
        })
        .add_method(RuleKind::Max, "Please enter a value less than or equal to {0}.", |input, params| {
            match (validators::parse_number(&input.value()), bound(params)) {
                (Some(value), Some(max)) => value <= max,
                _ => false,
            }
        })
        .add_method(RuleKind::Range, "Please enter a value between {0} and {1}.", |input, params| {
            match (validators::parse_number(&input.value()), bounds(params)) {
                (Some(value), Some((min, max))) => value >= min && value <= max,
                _ => false,
            }
        })
        .add_method(RuleKind::Regex, "Please match the requested format.", |input, params| {
            params
                .value()
                .is_some_and(|pattern| validators::matches_whole(pattern, &input.value()))
        })
        .add_method(RuleKind::EqualTo, "Please enter the same value again.", |input, params| {
            params
                .value()
                .is_some_and(|other| input.value() == input.value_of(other))
        })
        .add_method(
            RuleKind::Extension,
            "Please enter a value with a valid extension.",
            |input, params| {
                params
                    .value()
                    .is_some_and(|list| validators::has_extension(&input.value(), list))
            },
        )
        .add_method(
            RuleKind::NonAlphaMin,
            "Please enter at least {0} non-alphanumeric characters.",
            |input, params| {
                bound(params)
                    .is_some_and(|min| validators::count_non_alphanumeric(&input.value()) as f64 >= min)
            },
        );
        self.messages
            .insert(RuleKind::Remote, FALLBACK_MESSAGE.to_string());
    }
}

fn bound(params: &RuleParams) -> Option<f64> {
    params.value().and_then(validators::parse_number)
}

fn bounds(params: &RuleParams) -> Option<(f64, f64)> {
    match params {
        RuleParams::Bounds(min, max) => {
            Some((validators::parse_number(min)?, validators::parse_number(max)?))
        }
        _ => None,
    }
}

/// Built-in rules other than these pass on an empty value
fn checks_blank_values(kind: &RuleKind) -> bool {
    matches!(kind, RuleKind::Required | RuleKind::EqualTo | RuleKind::Custom(_))
}

/// Validation state of one field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldState {
    #[default]
    Unvalidated,
    Valid,
    Invalid(String),
    /// Waiting for a remote check
    Pending,
}

/// Result of checking a field's synchronous rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    Valid,
    Invalid(String),
    /// Synchronous rules passed; this remote check decides
    Remote(RemoteRequest),
    /// Field not validated (ignored, absent, or without rules)
    Skipped,
}

#[derive(Debug, Default)]
struct RemoteTrack {
    generation: u64,
    last: Option<(Vec<(String, String)>, RemoteOutcome)>,
}

/// Validator instance bound to one form
#[derive(Debug)]
pub struct Validator {
    form: NodeId,
    options: FormOptions,
    states: HashMap<String, FieldState>,
    submitted: HashSet<String>,
    remote: HashMap<String, RemoteTrack>,
}

impl Validator {
    pub fn new(form: NodeId, options: FormOptions) -> Self {
        Self {
            form,
            options,
            states: HashMap::new(),
            submitted: HashSet::new(),
            remote: HashMap::new(),
        }
    }

    pub fn form(&self) -> NodeId {
        self.form
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn state(&self, name: &str) -> FieldState {
        self.states.get(name).cloned().unwrap_or_default()
    }

    pub fn mark_submitted(&mut self, name: &str) {
        self.submitted.insert(name.to_string());
    }

    /// Lazy blur: only fields already submitted or holding a value, never checkables
    pub fn wants_blur_check(&self, doc: &Document, name: &str) -> bool {
        if !self.options.fields.contains_key(name) {
            return false;
        }
        let input = FieldInput::new(doc, self.form, name);
        !input.is_checkable() && (self.submitted.contains(name) || !input.is_blank())
    }

    /// Run the synchronous rules of `name` in the order they were produced.
    ///
    /// Every call supersedes any remote check still in flight for the field.
    pub fn check_field(&mut self, doc: &Document, methods: &RuleMethods, name: &str) -> FieldCheck {
        let Some(field) = self.options.fields.get(name) else {
            return FieldCheck::Skipped;
        };
        let input = FieldInput::new(doc, self.form, name);
        if input.elements.is_empty() || (self.options.settings.ignore_hidden && input.is_hidden()) {
            debug!(field = name, "field ignored");
            self.states.remove(name);
            return FieldCheck::Skipped;
        }

        let track = self.remote.entry(name.to_string()).or_default();
        track.generation += 1;

        let blank = input.is_blank();
        let mut remote_spec: Option<&RemoteSpec> = None;

        for (kind, params) in &field.rules {
            if let RuleParams::Remote(spec) = params {
                remote_spec = Some(spec);
                continue;
            }
            if blank && !checks_blank_values(kind) {
                continue;
            }
            match methods.check(kind, &input, params) {
                Some(true) => {}
                Some(false) => {
                    let message = message_for(methods, field, kind, params);
                    self.states
                        .insert(name.to_string(), FieldState::Invalid(message.clone()));
                    return FieldCheck::Invalid(message);
                }
                None => debug!(field = name, rule = %kind, "no method for rule, treated as passing"),
            }
        }

        let Some(spec) = remote_spec.filter(|_| !blank) else {
            self.states.insert(name.to_string(), FieldState::Valid);
            return FieldCheck::Valid;
        };

        let mut data: Vec<(String, String)> = spec
            .additional_fields
            .iter()
            .map(|f| (f.clone(), input.remote_value_of(f)))
            .collect();
        if !data.iter().any(|(k, _)| k == name) {
            data.push((name.to_string(), input.value()));
        }

        if let Some((previous, outcome)) = &track.last {
            if *previous == data {
                debug!(field = name, "remote data unchanged, previous outcome reused");
                let state = remote_state(field, outcome);
                let check = match &state {
                    FieldState::Invalid(message) => FieldCheck::Invalid(message.clone()),
                    _ => FieldCheck::Valid,
                };
                self.states.insert(name.to_string(), state);
                return check;
            }
        }

        let request = RemoteRequest {
            form: self.form,
            field: name.to_string(),
            generation: track.generation,
            url: spec.url.clone(),
            method: spec.method,
            data,
        };
        self.states.insert(name.to_string(), FieldState::Pending);
        FieldCheck::Remote(request)
    }

    /// Apply a remote outcome. Returns false when a newer check has been
    /// issued for the field since `request`, in which case nothing changes.
    pub fn complete_remote(&mut self, request: &RemoteRequest, outcome: RemoteOutcome) -> bool {
        let Some(track) = self.remote.get_mut(&request.field) else {
            return false;
        };
        if track.generation != request.generation {
            debug!(
                field = %request.field,
                stale = request.generation,
                latest = track.generation,
                "stale remote response discarded"
            );
            return false;
        }

        let state = match self.options.fields.get(&request.field) {
            Some(field) => remote_state(field, &outcome),
            None => return false,
        };
        track.last = Some((request.data.clone(), outcome));
        self.states.insert(request.field.clone(), state);
        true
    }

    /// No field invalid or waiting on a remote check
    pub fn is_valid(&self) -> bool {
        !self
            .states
            .values()
            .any(|s| matches!(s, FieldState::Invalid(_) | FieldState::Pending))
    }

    /// `(field, message)` for every invalid field, in form order
    pub fn errors(&self) -> Vec<(String, String)> {
        self.options
            .fields
            .keys()
            .filter_map(|name| match self.states.get(name) {
                Some(FieldState::Invalid(message)) => Some((name.clone(), message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Render every settled field
    pub fn show_errors(&self, doc: &mut Document) -> Result<(), DomError> {
        let names: Vec<&String> = self.options.fields.keys().collect();
        for name in names {
            self.render_field(doc, name)?;
        }
        Ok(())
    }

    /// Swap input classes and the `data-valmsg-for` container for one field
    pub fn render_field(&self, doc: &mut Document, name: &str) -> Result<(), DomError> {
        let settings = &self.options.settings;
        let elements = doc.elements_named(self.form, name);
        let containers = doc.find_by_attr(self.form, "data-valmsg-for", name);

        match self.states.get(name) {
            Some(FieldState::Invalid(message)) => {
                for el in &elements {
                    doc.add_class(*el, &settings.error_class)?;
                    doc.remove_class(*el, &settings.valid_class)?;
                }
                let label_id = format!("{}-error", label_base(doc, &elements, name));
                for container in containers {
                    doc.remove_class(container, "field-validation-valid")?;
                    doc.add_class(container, "field-validation-error")?;
                    if replaces_content(doc, container) {
                        doc.clear_children(container)?;
                        doc.append_element(container, "span", &[("id", label_id.as_str())], Some(message))?;
                    }
                }
            }
            Some(FieldState::Valid) => {
                for el in &elements {
                    doc.remove_class(*el, &settings.error_class)?;
                    doc.add_class(*el, &settings.valid_class)?;
                }
                for container in containers {
                    doc.remove_class(container, "field-validation-error")?;
                    doc.add_class(container, "field-validation-valid")?;
                    if replaces_content(doc, container) {
                        doc.clear_children(container)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Fill `data-valmsg-summary="true"` containers with the current errors
    pub fn show_summary(&self, doc: &mut Document) -> Result<(), DomError> {
        let errors = self.errors();
        for container in doc.find_by_attr(self.form, "data-valmsg-summary", "true") {
            let existing = doc
                .descendants(container)
                .into_iter()
                .find(|n| doc.element(*n).is_some_and(|e| e.tag == "ul"));
            let list = match existing {
                Some(list) => list,
                None => doc.append_element(container, "ul", &[], None)?,
            };
            doc.clear_children(list)?;

            if errors.is_empty() {
                doc.remove_class(container, "validation-summary-errors")?;
                doc.add_class(container, "validation-summary-valid")?;
            } else {
                doc.remove_class(container, "validation-summary-valid")?;
                doc.add_class(container, "validation-summary-errors")?;
                for (_, message) in &errors {
                    doc.append_element(list, "li", &[], Some(message))?;
                }
            }
        }
        Ok(())
    }
}

fn message_for(methods: &RuleMethods, field: &FieldOptions, kind: &RuleKind, params: &RuleParams) -> String {
    field
        .message(kind)
        .map(str::to_string)
        .unwrap_or_else(|| methods.default_message(kind, params))
}

fn remote_state(field: &FieldOptions, outcome: &RemoteOutcome) -> FieldState {
    match outcome {
        RemoteOutcome::Valid => FieldState::Valid,
        RemoteOutcome::Invalid(Some(message)) => FieldState::Invalid(message.clone()),
        RemoteOutcome::Invalid(None) => FieldState::Invalid(
            field
                .message(&RuleKind::Remote)
                .unwrap_or(FALLBACK_MESSAGE)
                .to_string(),
        ),
    }
}

// Checkables are labelled by name, everything else by id when it has one
fn label_base(doc: &Document, elements: &[NodeId], name: &str) -> String {
    elements
        .first()
        .and_then(|n| doc.element(*n))
        .filter(|e| !e.is_checkable())
        .and_then(Element::id)
        .unwrap_or(name)
        .to_string()
}

fn replaces_content(doc: &Document, container: NodeId) -> bool {
    doc.attr(container, "data-valmsg-replace")
        .map(|v| !v.eq_ignore_ascii_case("false"))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::options::OptionsParser;
    use crate::registry::AdapterRegistry;
    use crate::remote::HttpMethod;
    use pretty_assertions::assert_eq;

    fn setup(body: &str) -> (Document, Validator, RuleMethods) {
        let doc = Document::parse(&format!("<form id=\"f\">{}</form>", body));
        let form = doc.element_by_id("f").unwrap();
        let registry = AdapterRegistry::with_defaults();
        let options = OptionsParser::new(&registry).parse_form(&doc, form, &ValidationConfig::default());
        (doc, Validator::new(form, options), RuleMethods::with_defaults())
    }

    fn type_into(doc: &mut Document, id: &str, value: &str) {
        let node = doc.element_by_id(id).unwrap();
        doc.set_value(node, value).unwrap();
    }

    #[test]
    fn test_required_on_empty_input() {
        let (doc, mut validator, methods) =
            setup(r#"<input id="X" name="X" data-val="true" data-val-required="X is required">"#);
        assert_eq!(
            validator.check_field(&doc, &methods, "X"),
            FieldCheck::Invalid("X is required".to_string())
        );
        assert!(!validator.is_valid());
        assert_eq!(validator.errors(), vec![("X".to_string(), "X is required".to_string())]);
    }

    #[test]
    fn test_range_rejects_out_of_bounds() {
        let (mut doc, mut validator, methods) = setup(
            r#"<input id="Age" name="Age" data-val="true"
                 data-val-range="The field Age must be between 18 and 99."
                 data-val-range-min="18" data-val-range-max="99">"#,
        );
        type_into(&mut doc, "Age", "15");
        assert_eq!(
            validator.check_field(&doc, &methods, "Age"),
            FieldCheck::Invalid("The field Age must be between 18 and 99.".to_string())
        );
        type_into(&mut doc, "Age", "42");
        assert_eq!(validator.check_field(&doc, &methods, "Age"), FieldCheck::Valid);
    }

    #[test]
    fn test_compare_mismatch() {
        let (mut doc, mut validator, methods) = setup(
            r#"<input id="Password" name="Password">
               <input id="PasswordConfirmation" name="PasswordConfirmation" data-val="true"
                 data-val-equalto="'PasswordConfirmation' and 'Password' do not match."
                 data-val-equalto-other="*.Password">"#,
        );
        type_into(&mut doc, "Password", "1234");
        type_into(&mut doc, "PasswordConfirmation", "4321");
        assert_eq!(
            validator.check_field(&doc, &methods, "PasswordConfirmation"),
            FieldCheck::Invalid("'PasswordConfirmation' and 'Password' do not match.".to_string())
        );
    }

    #[test]
    fn test_optional_fields_skip_format_rules() {
        let (doc, mut validator, methods) =
            setup(r#"<input id="Email" name="Email" data-val="true" data-val-email="bad">"#);
        assert_eq!(validator.check_field(&doc, &methods, "Email"), FieldCheck::Valid);
    }

    #[test]
    fn test_default_message_is_formatted() {
        let (mut doc, mut validator, mut methods) = setup(r#"<input id="N" name="N" data-val="true">"#);
        let mut field = FieldOptions::default();
        field.set(RuleKind::MinLength, RuleParams::Value("3".into()), None);
        validator.options.fields.insert("N".to_string(), field);
        type_into(&mut doc, "N", "a");
        assert_eq!(
            validator.check_field(&doc, &methods, "N"),
            FieldCheck::Invalid("Please enter at least 3 characters.".to_string())
        );

        methods.add_method(RuleKind::MinLength, "Too short", |_, _| false);
        assert_eq!(
            validator.check_field(&doc, &methods, "N"),
            FieldCheck::Invalid("Too short".to_string())
        );
    }

    #[test]
    fn test_hidden_fields_are_ignored() {
        let (doc, mut validator, methods) =
            setup(r#"<input type="hidden" name="H" data-val="true" data-val-required="r">"#);
        assert_eq!(validator.check_field(&doc, &methods, "H"), FieldCheck::Skipped);
    }

    #[test]
    fn test_checkbox_group_length() {
        let (mut doc, mut validator, methods) = setup(
            r#"<input type="checkbox" id="c1" name="C" value="1" data-val="true" data-val-minlength="pick two" data-val-minlength-min="2">
               <input type="checkbox" id="c2" name="C" value="2">"#,
        );
        let c1 = doc.element_by_id("c1").unwrap();
        doc.set_checked(c1, true).unwrap();
        assert_eq!(
            validator.check_field(&doc, &methods, "C"),
            FieldCheck::Invalid("pick two".to_string())
        );
        let c2 = doc.element_by_id("c2").unwrap();
        doc.set_checked(c2, true).unwrap();
        assert_eq!(validator.check_field(&doc, &methods, "C"), FieldCheck::Valid);
    }

    fn remote_form() -> (Document, Validator, RuleMethods) {
        setup(
            r#"<input id="UserName" name="UserName" data-val="true"
                 data-val-remote="'UserName' is invalid."
                 data-val-remote-url="/Validation/UserName" data-val-remote-type="POST">"#,
        )
    }

    #[test]
    fn test_remote_request_is_issued_after_sync_rules() {
        let (mut doc, mut validator, methods) = remote_form();
        type_into(&mut doc, "UserName", "b");
        let FieldCheck::Remote(request) = validator.check_field(&doc, &methods, "UserName") else {
            panic!("remote check expected");
        };
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.data, vec![("UserName".to_string(), "b".to_string())]);
        assert_eq!(validator.state("UserName"), FieldState::Pending);

        assert!(validator.complete_remote(&request, RemoteOutcome::Invalid(None)));
        assert_eq!(
            validator.state("UserName"),
            FieldState::Invalid("'UserName' is invalid.".to_string())
        );
    }

    #[test]
    fn test_remote_string_response_overrides_message() {
        let (mut doc, mut validator, methods) = remote_form();
        type_into(&mut doc, "UserName", "b");
        let FieldCheck::Remote(request) = validator.check_field(&doc, &methods, "UserName") else {
            panic!("remote check expected");
        };
        validator.complete_remote(&request, RemoteOutcome::Invalid(Some("Taken".into())));
        assert_eq!(validator.state("UserName"), FieldState::Invalid("Taken".to_string()));
    }

    #[test]
    fn test_stale_remote_response_is_discarded() {
        let (mut doc, mut validator, methods) = remote_form();
        type_into(&mut doc, "UserName", "b");
        let FieldCheck::Remote(first) = validator.check_field(&doc, &methods, "UserName") else {
            panic!("remote check expected");
        };
        type_into(&mut doc, "UserName", "alice");
        let FieldCheck::Remote(second) = validator.check_field(&doc, &methods, "UserName") else {
            panic!("remote check expected");
        };
        assert!(second.generation > first.generation);

        assert!(validator.complete_remote(&second, RemoteOutcome::Valid));
        assert!(!validator.complete_remote(&first, RemoteOutcome::Invalid(None)));
        assert_eq!(validator.state("UserName"), FieldState::Valid);
        assert!(validator.is_valid());
    }

    #[test]
    fn test_unchanged_remote_data_reuses_outcome() {
        let (mut doc, mut validator, methods) = remote_form();
        type_into(&mut doc, "UserName", "b");
        let FieldCheck::Remote(request) = validator.check_field(&doc, &methods, "UserName") else {
            panic!("remote check expected");
        };
        validator.complete_remote(&request, RemoteOutcome::Invalid(None));
        assert_eq!(
            validator.check_field(&doc, &methods, "UserName"),
            FieldCheck::Invalid("'UserName' is invalid.".to_string())
        );
    }

    #[test]
    fn test_render_error_then_success() {
        let (mut doc, mut validator, methods) = setup(
            r#"<input id="Name" name="Name" class="form-control" data-val="true" data-val-required="The Name field is required.">
               <span id="c" class="field-validation-valid" data-valmsg-for="Name" data-valmsg-replace="true"></span>"#,
        );
        validator.check_field(&doc, &methods, "Name");
        validator.show_errors(&mut doc).unwrap();

        let input = doc.element_by_id("Name").unwrap();
        let container = doc.element_by_id("c").unwrap();
        assert_eq!(doc.class_name(input), "form-control input-validation-error");
        assert_eq!(doc.class_name(container), "field-validation-error");
        let label = doc.element_by_id("Name-error").unwrap();
        assert_eq!(doc.text(label), "The Name field is required.");

        validator.show_errors(&mut doc).unwrap();
        assert_eq!(doc.children(container).len(), 1);

        type_into(&mut doc, "Name", "Ada");
        validator.check_field(&doc, &methods, "Name");
        validator.show_errors(&mut doc).unwrap();
        assert_eq!(doc.class_name(input), "form-control input-validation-valid");
        assert_eq!(doc.class_name(container), "field-validation-valid");
        assert!(doc.children(container).is_empty());
    }

    #[test]
    fn test_summary_lists_errors() {
        let (mut doc, mut validator, methods) = setup(
            r#"<div id="s" class="validation-summary-valid" data-valmsg-summary="true"><ul></ul></div>
               <input id="A" name="A" data-val="true" data-val-required="A needed">
               <input id="B" name="B" data-val="true" data-val-required="B needed">"#,
        );
        validator.check_field(&doc, &methods, "A");
        validator.check_field(&doc, &methods, "B");
        validator.show_summary(&mut doc).unwrap();

        let summary = doc.element_by_id("s").unwrap();
        assert_eq!(doc.class_name(summary), "validation-summary-errors");
        assert_eq!(doc.text(summary), "A neededB needed");
    }
}
