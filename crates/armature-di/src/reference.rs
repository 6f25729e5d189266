//! Reference syntax and the argument model
//!
//! Definitions and parameters may embed two kinds of references: `"@id@"`
//! names another service, `"%dot.path%"` names a parameter. Raw definition
//! data is parsed into [`Argument`] values exactly once, at the point it
//! enters the container; resolution later walks the parsed form without
//! re-scanning strings.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value as Json;

use crate::value::Instance;

/// A parsed `@id@` or `%path%` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `@id@`: resolve another service
    Service(String),
    /// `%dot.path%`: look up a parameter
    Parameter(String),
}

impl Reference {
    /// Parse reference syntax: a matching marker pair around a non-empty
    /// name with no whitespace. Anything else is not a reference.
    pub fn parse(text: &str) -> Option<Reference> {
        let bytes = text.as_bytes();
        if bytes.len() < 3 {
            return None;
        }
        let marker = bytes[0];
        if (marker != b'@' && marker != b'%') || bytes[bytes.len() - 1] != marker {
            return None;
        }
        let name = &text[1..text.len() - 1];
        if name.is_empty()
            || name.contains(char::is_whitespace)
            || name.contains(marker as char)
        {
            return None;
        }
        Some(match marker {
            b'@' => Reference::Service(name.to_string()),
            _ => Reference::Parameter(name.to_string()),
        })
    }

    /// The referenced service id or parameter path
    pub fn name(&self) -> &str {
        match self {
            Reference::Service(name) | Reference::Parameter(name) => name,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Service(name) => write!(f, "@{name}@"),
            Reference::Parameter(name) => write!(f, "%{name}%"),
        }
    }
}

/// One constructor or method argument, parsed from raw definition data
#[derive(Debug, Clone)]
pub enum Argument {
    /// Plain data, passed through untouched
    Literal(Json),
    /// A service or parameter reference, resolved at construction time
    Reference(Reference),
    /// A pre-built instance supplied directly by the caller
    Instance(Instance),
    /// An ordered container; elements are parsed and resolved individually
    List(Vec<Argument>),
    /// A keyed container; entries are parsed and resolved individually
    Map(BTreeMap<String, Argument>),
}

impl Argument {
    /// Parse raw JSON definition data, recognizing reference syntax in
    /// strings and recursing into containers
    pub fn parse(value: Json) -> Argument {
        match value {
            Json::String(text) => match Reference::parse(&text) {
                Some(reference) => Argument::Reference(reference),
                None => Argument::Literal(Json::String(text)),
            },
            Json::Array(items) => {
                Argument::List(items.into_iter().map(Argument::parse).collect())
            }
            Json::Object(entries) => Argument::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Argument::parse(value)))
                    .collect(),
            ),
            other => Argument::Literal(other),
        }
    }

    /// A `@id@` service reference
    pub fn service(id: impl Into<String>) -> Argument {
        Argument::Reference(Reference::Service(id.into()))
    }

    /// A `%path%` parameter reference
    pub fn parameter(path: impl Into<String>) -> Argument {
        Argument::Reference(Reference::Parameter(path.into()))
    }
}

impl From<&str> for Argument {
    fn from(text: &str) -> Self {
        Argument::parse(Json::String(text.to_string()))
    }
}

impl From<String> for Argument {
    fn from(text: String) -> Self {
        Argument::parse(Json::String(text))
    }
}

impl From<i64> for Argument {
    fn from(number: i64) -> Self {
        Argument::Literal(Json::from(number))
    }
}

impl From<f64> for Argument {
    fn from(number: f64) -> Self {
        Argument::Literal(Json::from(number))
    }
}

impl From<bool> for Argument {
    fn from(flag: bool) -> Self {
        Argument::Literal(Json::from(flag))
    }
}

impl From<Json> for Argument {
    fn from(value: Json) -> Self {
        Argument::parse(value)
    }
}

impl From<Instance> for Argument {
    fn from(instance: Instance) -> Self {
        Argument::Instance(instance)
    }
}

impl From<Reference> for Argument {
    fn from(reference: Reference) -> Self {
        Argument::Reference(reference)
    }
}

impl From<Vec<Argument>> for Argument {
    fn from(items: Vec<Argument>) -> Self {
        Argument::List(items)
    }
}
