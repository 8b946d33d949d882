// File: src/rules.rs
// Purpose: Known rule kinds and the parameter shape each one carries

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

use crate::remote::RemoteSpec;

/// A validation rule understood by the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    Required,
    Email,
    Url,
    Date,
    Digits,
    Number,
    CreditCard,
    MinLength,
    MaxLength,
    RangeLength,
    Min,
    Max,
    Range,
    Regex,
    EqualTo,
    Extension,
    NonAlphaMin,
    Remote,
    /// Rule added through the extension API
    Custom(String),
}

const KNOWN: [RuleKind; 18] = [
    RuleKind::Required,
    RuleKind::Email,
    RuleKind::Url,
    RuleKind::Date,
    RuleKind::Digits,
    RuleKind::Number,
    RuleKind::CreditCard,
    RuleKind::MinLength,
    RuleKind::MaxLength,
    RuleKind::RangeLength,
    RuleKind::Min,
    RuleKind::Max,
    RuleKind::Range,
    RuleKind::Regex,
    RuleKind::EqualTo,
    RuleKind::Extension,
    RuleKind::NonAlphaMin,
    RuleKind::Remote,
];

impl RuleKind {
    /// Engine-side rule name
    pub fn name(&self) -> &str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Email => "email",
            RuleKind::Url => "url",
            RuleKind::Date => "date",
            RuleKind::Digits => "digits",
            RuleKind::Number => "number",
            RuleKind::CreditCard => "creditcard",
            RuleKind::MinLength => "minlength",
            RuleKind::MaxLength => "maxlength",
            RuleKind::RangeLength => "rangelength",
            RuleKind::Min => "min",
            RuleKind::Max => "max",
            RuleKind::Range => "range",
            RuleKind::Regex => "regex",
            RuleKind::EqualTo => "equalTo",
            RuleKind::Extension => "extension",
            RuleKind::NonAlphaMin => "nonalphamin",
            RuleKind::Remote => "remote",
            RuleKind::Custom(name) => name,
        }
    }

    /// Lookup by engine-side name; anything unknown is a custom rule
    pub fn from_name(name: &str) -> Self {
        KNOWN
            .iter()
            .find(|k| k.name() == name)
            .cloned()
            .unwrap_or_else(|| RuleKind::Custom(name.to_string()))
    }

    pub fn shape(&self) -> ParamShape {
        match self {
            RuleKind::Required
            | RuleKind::Email
            | RuleKind::Url
            | RuleKind::Date
            | RuleKind::Digits
            | RuleKind::Number
            | RuleKind::CreditCard => ParamShape::Flag,
            RuleKind::MinLength
            | RuleKind::MaxLength
            | RuleKind::Min
            | RuleKind::Max
            | RuleKind::Regex
            | RuleKind::Extension
            | RuleKind::NonAlphaMin => ParamShape::Value,
            RuleKind::RangeLength | RuleKind::Range => ParamShape::Bounds,
            RuleKind::EqualTo => ParamShape::Field,
            RuleKind::Remote => ParamShape::Remote,
            RuleKind::Custom(_) => ParamShape::Any,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for RuleKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Parameter cardinality a rule expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    Flag,
    Value,
    Bounds,
    Field,
    Remote,
    Any,
}

impl ParamShape {
    pub fn of(params: &RuleParams) -> Self {
        match params {
            RuleParams::Flag => ParamShape::Flag,
            RuleParams::Value(_) => ParamShape::Value,
            RuleParams::Bounds(_, _) => ParamShape::Bounds,
            RuleParams::Field(_) => ParamShape::Field,
            RuleParams::Remote(_) => ParamShape::Remote,
            RuleParams::List(_) => ParamShape::Any,
        }
    }

    pub fn accepts(&self, params: &RuleParams) -> bool {
        *self == ParamShape::Any || *self == ParamShape::of(params)
    }
}

/// Parameters of one rule entry
#[derive(Debug, Clone, PartialEq)]
pub enum RuleParams {
    Flag,
    Value(String),
    Bounds(String, String),
    /// Form-relative field name whose live value is compared
    Field(String),
    Remote(RemoteSpec),
    List(Vec<String>),
}

impl RuleParams {
    /// Positional values, used to fill `{0}`/`{1}` in default messages
    pub fn positional(&self) -> Vec<String> {
        match self {
            RuleParams::Flag => Vec::new(),
            RuleParams::Value(v) | RuleParams::Field(v) => vec![v.clone()],
            RuleParams::Bounds(min, max) => vec![min.clone(), max.clone()],
            RuleParams::Remote(spec) => vec![spec.url.clone()],
            RuleParams::List(items) => items.clone(),
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            RuleParams::Value(v) | RuleParams::Field(v) => Some(v),
            _ => None,
        }
    }
}

// Serialized the way validation options are usually written out by hand:
// flags as `true`, bounds as a pair, remote as an object.
impl Serialize for RuleParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RuleParams::Flag => serializer.serialize_bool(true),
            RuleParams::Value(v) | RuleParams::Field(v) => serializer.serialize_str(v),
            RuleParams::Bounds(min, max) => [min, max].serialize(serializer),
            RuleParams::List(items) => items.serialize(serializer),
            RuleParams::Remote(spec) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("url", &spec.url)?;
                map.serialize_entry("type", spec.method.as_str())?;
                map.serialize_entry("additionalFields", &spec.additional_fields)?;
                map.end()
            }
        }
    }
}

/// Replace `{0}`, `{1}`, ... with positional params
pub fn format_message(template: &str, params: &[String]) -> String {
    params
        .iter()
        .enumerate()
        .fold(template.to_string(), |acc, (i, p)| {
            acc.replace(&format!("{{{}}}", i), p)
        })
}
