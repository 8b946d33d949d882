// File: src/model.rs
// Purpose: ValidationModel - annotated properties and the data-val-* attributes they emit

use rusty_unobtrusive::attributes::{MARKER, PREFIX};
use rusty_unobtrusive::HttpMethod;

/// Validation annotation on a model property
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Required,
    MinLength(usize),
    MaxLength(usize),
    StringLength { min: usize, max: usize },
    /// Must equal the named property
    Compare(&'static str),
    EmailAddress,
    Phone,
    CreditCard,
    Range { min: f64, max: f64 },
    RegularExpression(&'static str),
    /// Comma-separated list such as `.png,.jpg`
    FileExtensions(&'static str),
    Url,
    Remote { action: &'static str, controller: &'static str, method: HttpMethod },
}

/// Property storage type; value types are implicitly required and numeric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: &'static str,
    pub kind: ValueKind,
    pub annotations: Vec<Annotation>,
}

impl Property {
    fn new(name: &'static str, kind: ValueKind, annotations: Vec<Annotation>) -> Self {
        Self {
            name,
            kind,
            annotations,
        }
    }

    /// HTML input type for the editor
    pub fn input_type(&self) -> &'static str {
        if self.kind != ValueKind::Text {
            return "number";
        }
        for annotation in &self.annotations {
            match annotation {
                Annotation::EmailAddress => return "email",
                Annotation::Phone => return "tel",
                Annotation::Url => return "url",
                _ => {}
            }
        }
        if self.name.starts_with("Password") {
            "password"
        } else {
            "text"
        }
    }

    /// Property this one must match, if it carries a Compare annotation
    pub fn compare_target(&self) -> Option<&'static str> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Compare(other) => Some(*other),
            _ => None,
        })
    }

    /// Every `data-val*` attribute the editor carries, marker first
    pub fn attributes(&self) -> Vec<(String, String)> {
        let name = self.name;
        let mut attrs: Vec<(String, String)> = Vec::new();
        let mut rule = |suffix: &str, value: String| attrs.push((format!("{}{}", PREFIX, suffix), value));

        if self.kind != ValueKind::Text {
            rule("number", format!("The field {} must be a number.", name));
        }

        for annotation in &self.annotations {
            match annotation {
                Annotation::Required => rule("required", required_message(name)),
                Annotation::MinLength(min) => {
                    rule(
                        "minlength",
                        format!("The field {} must be a string or array type with a minimum length of '{}'.", name, min),
                    );
                    rule("minlength-min", min.to_string());
                }
                Annotation::MaxLength(max) => {
                    rule(
                        "maxlength",
                        format!("The field {} must be a string or array type with a maximum length of '{}'.", name, max),
                    );
                    rule("maxlength-max", max.to_string());
                }
                Annotation::StringLength { min, max } => {
                    rule(
                        "length",
                        format!(
                            "The field {} must be a string with a minimum length of {} and a maximum length of {}.",
                            name, min, max
                        ),
                    );
                    rule("length-max", max.to_string());
                    rule("length-min", min.to_string());
                }
                Annotation::Compare(other) => {
                    rule("equalto", format!("'{}' and '{}' do not match.", name, other));
                    rule("equalto-other", format!("*.{}", other));
                }
                Annotation::EmailAddress => {
                    rule("email", format!("The {} field is not a valid e-mail address.", name))
                }
                Annotation::Phone => rule("phone", format!("The {} field is not a valid phone number.", name)),
                Annotation::CreditCard => {
                    rule("creditcard", format!("The {} field is not a valid credit card number.", name))
                }
                Annotation::Range { min, max } => {
                    rule("range", format!("The field {} must be between {} and {}.", name, min, max));
                    rule("range-max", max.to_string());
                    rule("range-min", min.to_string());
                }
                Annotation::RegularExpression(pattern) => {
                    rule(
                        "regex",
                        format!("The field {} must match the regular expression '{}'.", name, pattern),
                    );
                    rule("regex-pattern", pattern.to_string());
                }
                Annotation::FileExtensions(list) => {
                    let shown: Vec<&str> = list.split(',').map(str::trim).collect();
                    rule(
                        "fileextensions",
                        format!(
                            "The {} field only accepts files with the following extensions: {}",
                            name,
                            shown.join(", ")
                        ),
                    );
                    rule("fileextensions-extensions", list.to_string());
                }
                Annotation::Url => rule(
                    "url",
                    format!("The {} field is not a valid fully-qualified http, https, or ftp URL.", name),
                ),
                Annotation::Remote {
                    action,
                    controller,
                    method,
                } => {
                    rule("remote", format!("'{}' is invalid.", name));
                    rule("remote-additionalfields", format!("*.{}", name));
                    rule("remote-type", method.as_str().to_string());
                    rule("remote-url", format!("/{}/{}", controller, action));
                }
            }
        }

        if self.kind != ValueKind::Text && !self.annotations.contains(&Annotation::Required) {
            rule("required", required_message(name));
        }

        if !attrs.is_empty() {
            attrs.insert(0, (MARKER.to_string(), "true".to_string()));
        }
        attrs
    }
}

fn required_message(name: &str) -> String {
    format!("The {} field is required.", name)
}

/// The properties of the test model, in declaration order
pub fn validation_model() -> Vec<Property> {
    use Annotation::*;
    use ValueKind::*;

    vec![
        Property::new("Name", Text, vec![Required, MinLength(3)]),
        Property::new("LastName", Text, vec![Required, MaxLength(5)]),
        Property::new("Password", Text, vec![Required]),
        Property::new("PasswordConfirmation", Text, vec![Required, Compare("Password")]),
        Property::new("Email", Text, vec![EmailAddress]),
        Property::new("PhoneNumber", Text, vec![Phone]),
        Property::new("CreditCard", Text, vec![CreditCard]),
        Property::new("Age", Integer, vec![Range { min: 18.0, max: 99.0 }]),
        Property::new("Rating", Float, vec![Range { min: 1.0, max: 5.0 }]),
        Property::new(
            "Tag",
            Text,
            vec![Required, StringLength { min: 8, max: 15 }, RegularExpression(r"web\..*")],
        ),
        Property::new("Photo", Text, vec![Required, FileExtensions(".png,.jpg")]),
        Property::new("WebPage", Text, vec![Url]),
        Property::new(
            "UserName",
            Text,
            vec![Remote {
                action: "UserName",
                controller: "Validation",
                method: HttpMethod::Post,
            }],
        ),
        Property::new(
            "Likes",
            Integer,
            vec![Remote {
                action: "Likes",
                controller: "Validation",
                method: HttpMethod::Get,
            }],
        ),
    ]
}

/// The property named `name` plus whatever it is compared with, in
/// declaration order. Empty for unknown names.
pub fn form_properties(name: &str) -> Vec<Property> {
    let model = validation_model();
    let Some(requested) = model.iter().find(|p| p.name.eq_ignore_ascii_case(name)) else {
        return Vec::new();
    };
    let requested_name = requested.name;
    let target = requested.compare_target();

    model
        .into_iter()
        .filter(|p| {
            p.name == requested_name || Some(p.name) == target || p.compare_target() == Some(requested_name)
        })
        .collect()
}
