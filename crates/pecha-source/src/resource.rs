// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resource records and typed property lookup.
//
// A record is a flat map from predicate to values, where each value is a
// literal (`{"@value": .., "@language": ..}`), a reference to another record
// (`{"@id": ..}`) or an embedded node carrying its own properties.

use std::collections::BTreeMap;

use pecha_core::error::{PechaError, Result};
use serde::{Deserialize, Serialize};

use crate::language::LanguageRule;

/// A bibliographic resource record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resource {
    /// Empty for anonymous embedded nodes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<Value>>,
}

/// One value of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Literal(Literal),
    Reference(Reference),
    Node(Resource),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Literal {
    #[serde(rename = "@value")]
    pub value: LiteralValue,
    #[serde(rename = "@language", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    #[serde(rename = "@id")]
    pub id: String,
}

/// A resource-valued property: either a pointer to another record or a node
/// embedded in this one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Link<'a> {
    Reference(&'a str),
    Embedded(&'a Resource),
}

impl<'a> Link<'a> {
    /// Identifier of the linked resource (empty for anonymous nodes).
    pub fn id(&self) -> &'a str {
        match *self {
            Self::Reference(id) => id,
            Self::Embedded(node) => &node.id,
        }
    }
}

impl Literal {
    /// The literal rendered as text.
    pub fn text(&self) -> String {
        match &self.value {
            LiteralValue::Integer(n) => n.to_string(),
            LiteralValue::Number(n) => n.to_string(),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Text(s) => s.clone(),
        }
    }

    /// The literal as an integer, accepting numeric strings.
    pub fn integer(&self) -> Option<i64> {
        match &self.value {
            LiteralValue::Integer(n) => Some(*n),
            LiteralValue::Text(s) => s.trim().parse().ok(),
            LiteralValue::Number(_) | LiteralValue::Boolean(_) => None,
        }
    }
}

impl Resource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Append a plain literal.
    pub fn with_text(self, predicate: &str, text: impl Into<String>) -> Self {
        self.with_value(
            predicate,
            Value::Literal(Literal {
                value: LiteralValue::Text(text.into()),
                language: None,
            }),
        )
    }

    /// Append a language-tagged literal.
    pub fn with_text_in(self, predicate: &str, text: impl Into<String>, language: &str) -> Self {
        self.with_value(
            predicate,
            Value::Literal(Literal {
                value: LiteralValue::Text(text.into()),
                language: Some(language.into()),
            }),
        )
    }

    pub fn with_integer(self, predicate: &str, n: i64) -> Self {
        self.with_value(
            predicate,
            Value::Literal(Literal {
                value: LiteralValue::Integer(n),
                language: None,
            }),
        )
    }

    pub fn with_reference(self, predicate: &str, id: impl Into<String>) -> Self {
        self.with_value(predicate, Value::Reference(Reference { id: id.into() }))
    }

    pub fn with_node(self, predicate: &str, node: Resource) -> Self {
        self.with_value(predicate, Value::Node(node))
    }

    pub fn with_value(mut self, predicate: &str, value: Value) -> Self {
        self.properties
            .entry(predicate.to_string())
            .or_default()
            .push(value);
        self
    }

    // -- Lookup ---------------------------------------------------------------

    /// All values of `predicate`, in record order.
    pub fn values(&self, predicate: &str) -> &[Value] {
        self.properties
            .get(predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn literals(&self, predicate: &str) -> impl Iterator<Item = &Literal> {
        self.values(predicate).iter().filter_map(|v| match v {
            Value::Literal(lit) => Some(lit),
            _ => None,
        })
    }

    /// All resource-valued entries of `predicate`.
    pub fn links(&self, predicate: &str) -> Vec<Link<'_>> {
        self.values(predicate)
            .iter()
            .filter_map(|v| match v {
                Value::Reference(r) => Some(Link::Reference(&r.id)),
                Value::Node(node) => Some(Link::Embedded(node)),
                Value::Literal(_) => None,
            })
            .collect()
    }

    /// First resource-valued entry of `predicate`.
    pub fn link(&self, predicate: &str) -> Option<Link<'_>> {
        self.links(predicate).into_iter().next()
    }

    /// First literal of `predicate` in any language.
    pub fn string(&self, predicate: &str) -> Option<String> {
        self.literals(predicate).next().map(Literal::text)
    }

    /// Literal of `predicate` in `language`, following the equivalence `rule`.
    pub fn string_in(&self, predicate: &str, language: &str, rule: &LanguageRule) -> Option<String> {
        rule.select(self.literals(predicate), language)
            .map(Literal::text)
    }

    /// First literal of `predicate` as an integer.
    ///
    /// `Ok(None)` when the property is absent; an error when it is present
    /// but not numeric.
    pub fn integer(&self, predicate: &str) -> Result<Option<i64>> {
        let Some(lit) = self.literals(predicate).next() else {
            return Ok(None);
        };
        lit.integer()
            .map(Some)
            .ok_or_else(|| PechaError::MalformedProperty {
                resource: self.display_id().to_string(),
                predicate: predicate.to_string(),
                detail: format!("expected an integer, got {:?}", lit.text()),
            })
    }

    /// Whether the record's type is `kind`.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    /// Identifier for log and error messages.
    pub fn display_id(&self) -> &str {
        if self.id.is_empty() {
            "<embedded>"
        } else {
            &self.id
        }
    }
}
