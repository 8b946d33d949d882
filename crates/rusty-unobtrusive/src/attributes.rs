// File: src/attributes.rs
// Purpose: Read data-val-* attributes off an element

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::dom::Element;

/// Marker attribute that enables unobtrusive validation on an element
pub const MARKER: &str = "data-val";

/// Prefix shared by every rule attribute
pub const PREFIX: &str = "data-val-";

/// The `data-val-*` attributes of one element, keyed by the text after the
/// prefix (`required`, `range-min`, ...), in attribute order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    entries: IndexMap<String, String>,
}

impl AttributeSet {
    pub fn from_element(element: &Element) -> Self {
        let entries = element
            .attrs
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(PREFIX)
                    .filter(|suffix| !suffix.is_empty())
                    .map(|suffix| (suffix.to_ascii_lowercase(), value.clone()))
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every key after the prefix, in attribute order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `data-val-<rule>`: the rule's error message
    pub fn message(&self, rule: &str) -> Option<&str> {
        self.entries.get(rule).map(String::as_str)
    }

    /// `data-val-<rule>-<param>`; empty values count as absent
    pub fn param(&self, rule: &str, param: &str) -> Option<&str> {
        self.entries
            .get(&format!("{}-{}", rule, param.to_ascii_lowercase()))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The declared params of `rule` that are present
    pub fn params(&self, rule: &str, names: &[String]) -> HashMap<String, String> {
        names
            .iter()
            .filter_map(|name| {
                self.param(rule, name)
                    .map(|value| (name.clone(), value.to_string()))
            })
            .collect()
    }
}

/// True when `data-val="true"` (any case)
pub fn is_enabled(element: &Element) -> bool {
    element
        .attr(MARKER)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// `Order.Total` -> `Order.`
pub fn model_prefix(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..=idx],
        None => "",
    }
}

/// Resolve a `*.Other` reference against the model prefix of the referring field
pub fn append_model_prefix(value: &str, prefix: &str) -> String {
    match value.strip_prefix("*.") {
        Some(rest) => format!("{}{}", prefix, rest),
        None => value.to_string(),
    }
}

/// Comma-separated list, trimmed, empties dropped
pub fn split_and_trim(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn element(attrs: &[(&str, &str)]) -> Element {
        Element::new(
            "input",
            attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        )
    }

    #[test]
    fn test_collects_rule_attributes_in_order() {
        let el = element(&[
            ("name", "Age"),
            ("data-val", "true"),
            ("data-val-range", "The field Age must be between 18 and 99."),
            ("data-val-range-min", "18"),
            ("data-val-range-max", "99"),
        ]);
        let set = AttributeSet::from_element(&el);
        assert!(is_enabled(&el));
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["range", "range-min", "range-max"]);
        assert_eq!(set.message("range"), Some("The field Age must be between 18 and 99."));
        assert_eq!(set.param("range", "min"), Some("18"));
    }

    #[test]
    fn test_empty_param_counts_as_missing() {
        let el = element(&[("data-val-range", "m"), ("data-val-range-min", "")]);
        let set = AttributeSet::from_element(&el);
        let params = set.params("range", &["min".to_string(), "max".to_string()]);
        assert!(params.is_empty());
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case("false", false)]
    fn test_marker(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_enabled(&element(&[("data-val", value)])), expected);
    }

    #[rstest]
    #[case("Order.Total", "Order.")]
    #[case("Total", "")]
    #[case("A.B.C", "A.B.")]
    fn test_model_prefix(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(model_prefix(name), expected);
    }

    #[test]
    fn test_append_model_prefix() {
        assert_eq!(append_model_prefix("*.Password", "User."), "User.Password");
        assert_eq!(append_model_prefix("Password", "User."), "Password");
    }

    #[test]
    fn test_split_and_trim() {
        assert_eq!(split_and_trim(" a, b ,,c "), vec!["a", "b", "c"]);
    }
}
