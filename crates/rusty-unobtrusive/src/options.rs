// File: src/options.rs
// Purpose: Options parser - scans a form and builds per-field rules and messages

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::attributes::{is_enabled, AttributeSet};
use crate::config::ValidationConfig;
use crate::dom::{Document, NodeId};
use crate::registry::{AdapterContext, AdapterRegistry};
use crate::rules::{ParamShape, RuleKind, RuleParams};

/// Rules and messages for one field name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldOptions {
    pub rules: IndexMap<RuleKind, RuleParams>,
    pub messages: IndexMap<RuleKind, String>,
}

impl FieldOptions {
    /// Insert or overwrite a rule. Params of the wrong shape are refused, and a
    /// custom rule keeps the shape it was first given.
    pub fn set(&mut self, kind: RuleKind, params: RuleParams, message: Option<&str>) -> bool {
        let accepted = match (&kind, self.rules.get(&kind)) {
            (RuleKind::Custom(_), Some(existing)) => ParamShape::of(existing) == ParamShape::of(&params),
            _ => kind.shape().accepts(&params),
        };
        if !accepted {
            debug!(rule = %kind, ?params, "params of the wrong shape, rule ignored");
            return false;
        }

        if let Some(message) = message {
            self.messages.insert(kind.clone(), message.to_string());
        }
        self.rules.insert(kind, params);
        true
    }

    pub fn rule(&self, kind: &RuleKind) -> Option<&RuleParams> {
        self.rules.get(kind)
    }

    pub fn message(&self, kind: &RuleKind) -> Option<&str> {
        self.messages.get(kind).map(String::as_str)
    }

    pub fn has_rule(&self, kind: &RuleKind) -> bool {
        self.rules.contains_key(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Complete configuration for one form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormOptions {
    pub fields: IndexMap<String, FieldOptions>,
    pub settings: ValidationConfig,
}

impl FormOptions {
    pub fn new(settings: ValidationConfig) -> Self {
        Self {
            fields: IndexMap::new(),
            settings,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldOptions> {
        self.fields.get(name)
    }

    /// JSON dump in the shape validation engines usually take
    pub fn to_json(&self) -> serde_json::Value {
        let rules: IndexMap<&str, &IndexMap<RuleKind, RuleParams>> =
            self.fields.iter().map(|(k, f)| (k.as_str(), &f.rules)).collect();
        let messages: IndexMap<&str, &IndexMap<RuleKind, String>> =
            self.fields.iter().map(|(k, f)| (k.as_str(), &f.messages)).collect();
        serde_json::json!({ "rules": rules, "messages": messages })
    }
}

/// Reads validation attributes through an [`AdapterRegistry`]
pub struct OptionsParser<'r> {
    registry: &'r AdapterRegistry,
}

impl<'r> OptionsParser<'r> {
    pub fn new(registry: &'r AdapterRegistry) -> Self {
        Self { registry }
    }

    /// Build the options for every validated element inside `form`.
    ///
    /// Elements sharing a name merge into one field; a rule seen again
    /// later in document order overwrites the earlier entry.
    pub fn parse_form(&self, doc: &Document, form: NodeId, settings: &ValidationConfig) -> FormOptions {
        let mut options = FormOptions::new(settings.clone());
        for node in doc.descendants(form) {
            self.parse_element(doc, node, Some(form), &mut options);
        }
        options.fields.retain(|_, field| !field.is_empty());
        options
    }

    /// Apply every recognised attribute of one element to `options`.
    /// Returns false when the element is not a named, validated input.
    pub fn parse_element(
        &self,
        doc: &Document,
        node: NodeId,
        form: Option<NodeId>,
        options: &mut FormOptions,
    ) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };
        if !element.is_input_capable() || !is_enabled(element) {
            return false;
        }
        let Some(name) = element.name() else {
            debug!(node = node.index(), tag = %element.tag, "validated element has no name, skipped");
            return false;
        };

        let attributes = AttributeSet::from_element(element);
        let field = options.fields.entry(name.to_string()).or_default();

        for key in attributes.keys() {
            let Some(adapter) = self.registry.get(key) else {
                continue;
            };
            let params = attributes.params(key, adapter.params());
            let ctx = AdapterContext {
                document: doc,
                node,
                element,
                form,
                message: attributes.message(key),
                params: &params,
                attributes: &attributes,
            };
            adapter.adapt(&ctx, field);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{HttpMethod, RemoteSpec};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(body: &str) -> FormOptions {
        parse_with(&AdapterRegistry::with_defaults(), body)
    }

    fn parse_with(registry: &AdapterRegistry, body: &str) -> FormOptions {
        let doc = Document::parse(&format!("<html><body><form id=\"f\">{}</form></body></html>", body));
        let form = doc.element_by_id("f").unwrap();
        OptionsParser::new(registry).parse_form(&doc, form, &ValidationConfig::default())
    }

    fn value(v: &str) -> RuleParams {
        RuleParams::Value(v.to_string())
    }

    #[test]
    fn test_required_message_is_carried() {
        let options = parse(r#"<input name="Name" data-val="true" data-val-required="The Name field is required.">"#);
        let field = options.field("Name").unwrap();
        assert_eq!(field.rule(&RuleKind::Required), Some(&RuleParams::Flag));
        assert_eq!(field.message(&RuleKind::Required), Some("The Name field is required."));
    }

    #[test]
    fn test_range_produces_bounds_with_verbatim_message() {
        let options = parse(
            r#"<input name="Age" data-val="true"
                 data-val-range="The field Age must be between 18 and 99."
                 data-val-range-min="18" data-val-range-max="99">"#,
        );
        let field = options.field("Age").unwrap();
        assert_eq!(
            field.rule(&RuleKind::Range),
            Some(&RuleParams::Bounds("18".into(), "99".into()))
        );
        assert_eq!(
            field.message(&RuleKind::Range),
            Some("The field Age must be between 18 and 99.")
        );
    }

    #[rstest]
    #[case(r#"data-val-range-min="18""#, RuleKind::Min, "18")]
    #[case(r#"data-val-range-max="99""#, RuleKind::Max, "99")]
    fn test_range_with_one_bound(#[case] attrs: &str, #[case] kind: RuleKind, #[case] bound: &str) {
        let options = parse(&format!(r#"<input name="Age" data-val="true" data-val-range="m" {}>"#, attrs));
        let field = options.field("Age").unwrap();
        assert_eq!(field.rule(&kind), Some(&value(bound)));
        assert!(!field.has_rule(&RuleKind::Range));
    }

    #[rstest]
    #[case(r#"<input name="A" data-val="true" data-val-range="m">"#)]
    #[case(r#"<input name="A" data-val="true" data-val-length="m" data-val-length-min="">"#)]
    #[case(r#"<input name="A" data-val="true" data-val-regex="m">"#)]
    #[case(r#"<input name="A" data-val="true" data-val-equalto="m">"#)]
    #[case(r#"<input name="A" data-val="true" data-val-remote="m" data-val-remote-type="POST">"#)]
    #[case(r#"<input name="A" data-val="true" data-val-fileextensions="m">"#)]
    #[case(r#"<input name="A" data-val="true" data-val-minlength="m">"#)]
    fn test_missing_params_omit_the_rule(#[case] body: &str) {
        let options = parse(body);
        assert_eq!(options.field("A"), None);
    }

    #[test]
    fn test_string_length_and_regex() {
        let options = parse(
            r#"<input name="Tag" data-val="true"
                 data-val-length="len" data-val-length-min="8" data-val-length-max="15"
                 data-val-regex="re" data-val-regex-pattern="web\..*"
                 data-val-required="req">"#,
        );
        let field = options.field("Tag").unwrap();
        assert_eq!(
            field.rules.keys().cloned().collect::<Vec<_>>(),
            vec![RuleKind::RangeLength, RuleKind::Regex, RuleKind::Required]
        );
        assert_eq!(field.rule(&RuleKind::Regex), Some(&value(r"web\..*")));
    }

    #[test]
    fn test_minlength_and_maxlength_adapters() {
        let options = parse(
            r#"<input name="N" data-val="true" data-val-minlength="a" data-val-minlength-min="3">
               <input name="L" data-val="true" data-val-maxlength="b" data-val-maxlength-max="5">"#,
        );
        assert_eq!(options.field("N").unwrap().rule(&RuleKind::MinLength), Some(&value("3")));
        assert_eq!(options.field("L").unwrap().rule(&RuleKind::MaxLength), Some(&value("5")));
    }

    #[test]
    fn test_equalto_resolves_model_prefix() {
        let options = parse(
            r#"<input name="User.Password">
               <input name="User.PasswordConfirmation" data-val="true"
                 data-val-equalto="mismatch" data-val-equalto-other="*.Password">"#,
        );
        let field = options.field("User.PasswordConfirmation").unwrap();
        assert_eq!(
            field.rule(&RuleKind::EqualTo),
            Some(&RuleParams::Field("User.Password".to_string()))
        );
    }

    #[test]
    fn test_equalto_target_outside_form_is_skipped() {
        let options = parse(
            r#"<input name="Confirm" data-val="true" data-val-equalto="m" data-val-equalto-other="*.Missing">"#,
        );
        assert_eq!(options.field("Confirm"), None);
    }

    #[test]
    fn test_remote_spec() {
        let options = parse(
            r#"<input name="Order.UserName" data-val="true" data-val-remote="'UserName' is invalid."
                 data-val-remote-url="/Validation/UserName" data-val-remote-type="POST"
                 data-val-remote-additionalfields="*.UserName,*.Email">"#,
        );
        let field = options.field("Order.UserName").unwrap();
        assert_eq!(
            field.rule(&RuleKind::Remote),
            Some(&RuleParams::Remote(RemoteSpec {
                url: "/Validation/UserName".to_string(),
                method: HttpMethod::Post,
                additional_fields: vec!["Order.UserName".to_string(), "Order.Email".to_string()],
            }))
        );
    }

    #[test]
    fn test_remote_defaults_to_get_and_own_field() {
        let options = parse(
            r#"<input name="Likes" data-val="true" data-val-remote="m" data-val-remote-url="/Validation/Likes">"#,
        );
        let Some(RuleParams::Remote(spec)) = options.field("Likes").unwrap().rule(&RuleKind::Remote) else {
            panic!("remote rule expected");
        };
        assert_eq!(spec.method, HttpMethod::Get);
        assert_eq!(spec.additional_fields, vec!["Likes".to_string()]);
    }

    #[test]
    fn test_password_adapter_splits_into_rules() {
        let options = parse(
            r#"<input name="P" data-val="true" data-val-password="weak"
                 data-val-password-min="6" data-val-password-nonalphamin="1">"#,
        );
        let field = options.field("P").unwrap();
        assert_eq!(field.rule(&RuleKind::MinLength), Some(&value("6")));
        assert_eq!(field.rule(&RuleKind::NonAlphaMin), Some(&value("1")));
        assert!(!field.has_rule(&RuleKind::Regex));
        assert_eq!(field.message(&RuleKind::NonAlphaMin), Some("weak"));
    }

    #[test]
    fn test_required_is_skipped_on_checkboxes() {
        let options = parse(r#"<input type="checkbox" name="Agree" data-val="true" data-val-required="m">"#);
        assert_eq!(options.field("Agree"), None);
    }

    #[test]
    fn test_unnamed_and_disabled_elements_are_skipped() {
        let options = parse(
            r#"<input data-val="true" data-val-required="m">
               <input name="Off" data-val="false" data-val-required="m">
               <div name="Div" data-val="true" data-val-required="m"></div>"#,
        );
        assert!(options.fields.is_empty());
    }

    #[test]
    fn test_radio_group_rules_are_unioned() {
        let options = parse(
            r#"<input type="radio" name="Color" value="r" data-val="true" data-val-required="pick one">
               <input type="radio" name="Color" value="g" data-val="true" data-val-digits="digits">
               <input type="radio" name="Color" value="b" data-val="true" data-val-minlength="m" data-val-minlength-min="1">"#,
        );
        let field = options.field("Color").unwrap();
        assert_eq!(
            field.rules.keys().cloned().collect::<Vec<_>>(),
            vec![RuleKind::Required, RuleKind::Digits, RuleKind::MinLength]
        );
    }

    #[test]
    fn test_later_element_wins_on_conflict() {
        let options = parse(
            r#"<input name="N" data-val="true" data-val-minlength="first" data-val-minlength-min="2">
               <input name="N" data-val="true" data-val-minlength="second" data-val-minlength-min="4">"#,
        );
        let field = options.field("N").unwrap();
        assert_eq!(field.rule(&RuleKind::MinLength), Some(&value("4")));
        assert_eq!(field.message(&RuleKind::MinLength), Some("second"));
    }

    #[test]
    fn test_parsing_twice_is_idempotent() {
        let registry = AdapterRegistry::with_defaults();
        let doc = Document::parse(
            r#"<form id="f">
                 <input name="A" data-val="true" data-val-required="a" data-val-email="e">
                 <input name="B" data-val="true" data-val-range="r" data-val-range-min="1" data-val-range-max="5">
               </form>"#,
        );
        let form = doc.element_by_id("f").unwrap();
        let parser = OptionsParser::new(&registry);
        let first = parser.parse_form(&doc, form, &ValidationConfig::default());
        let second = parser.parse_form(&doc, form, &ValidationConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_adapter_extension() {
        let mut registry = AdapterRegistry::with_defaults();
        registry.add("zipcode", &["country"], |ctx, out| {
            if let Some(country) = ctx.param("country") {
                ctx.set(out, RuleKind::Custom("zipcode".into()), RuleParams::Value(country.to_string()));
            }
        });
        let options = parse_with(
            &registry,
            r#"<input name="Zip" data-val="true" data-val-zipcode="Bad zip" data-val-zipcode-country="NL">"#,
        );
        let field = options.field("Zip").unwrap();
        assert_eq!(field.rule(&RuleKind::Custom("zipcode".into())), Some(&value("NL")));
        assert_eq!(field.message(&RuleKind::Custom("zipcode".into())), Some("Bad zip"));
    }

    #[test]
    fn test_custom_rule_keeps_its_first_shape() {
        let mut field = FieldOptions::default();
        let kind = RuleKind::Custom("pair".into());
        assert!(field.set(kind.clone(), RuleParams::Bounds("1".into(), "2".into()), None));
        assert!(!field.set(kind.clone(), RuleParams::Value("1".into()), None));
        assert!(!field.set(RuleKind::Required, RuleParams::Value("x".into()), None));
        assert_eq!(field.rule(&kind), Some(&RuleParams::Bounds("1".into(), "2".into())));
    }

    #[test]
    fn test_options_json_shape() {
        let options = parse(r#"<input name="Age" data-val="true" data-val-range="r" data-val-range-min="1" data-val-range-max="5">"#);
        assert_eq!(
            options.to_json(),
            serde_json::json!({
                "rules": { "Age": { "range": ["1", "5"] } },
                "messages": { "Age": { "range": "r" } }
            })
        );
    }
}
