//! Typed value cells: defaulted scalar attribute projections.
//!
//! A [`ValueCell`] wraps one optional attribute of a model node's backing
//! element as a typed value with a declared default. The cell tracks whether
//! its value was explicitly authored, which is a different question from
//! whether it equals the default: an author writing `IsPartial="false"` has
//! still made an explicit choice.

use serde::{Deserialize, Serialize};

use crate::diagnostic::ParseDiagnostic;
use crate::schema::ValueCellSpec;

/// Declared type of a scalar attribute projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    Bool,
    Int,
    Text,
}

/// A typed scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Bool(_) => ScalarKind::Bool,
            ScalarValue::Int(_) => ScalarKind::Int,
            ScalarValue::Text(_) => ScalarKind::Text,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Interpret raw attribute text at the given declared kind. Boolean
    /// parsing accepts the XML Schema lexical forms (`true`/`false`/`1`/`0`).
    pub fn parse(kind: ScalarKind, raw: &str) -> Option<ScalarValue> {
        match kind {
            ScalarKind::Bool => match raw.trim() {
                "true" | "1" => Some(ScalarValue::Bool(true)),
                "false" | "0" => Some(ScalarValue::Bool(false)),
                _ => None,
            },
            ScalarKind::Int => raw.trim().parse::<i64>().ok().map(ScalarValue::Int),
            ScalarKind::Text => Some(ScalarValue::Text(raw.to_string())),
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Bool(v) => write!(f, "{v}"),
            ScalarValue::Int(v) => write!(f, "{v}"),
            ScalarValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// One defaulted, optionally-explicit scalar attribute projection.
///
/// Cells are constructed eagerly during parse (one per declared
/// [`ValueCellSpec`], present or not) and recreated wholesale on every
/// re-parse of their owning node. They are never mutated across a re-parse
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCell {
    attribute: &'static str,
    default: ScalarValue,
    /// Authored value, `None` when the attribute is absent or unparseable
    value: Option<ScalarValue>,
    /// Raw attribute text as authored, kept even when unparseable
    raw: Option<String>,
}

impl ValueCell {
    /// Build a cell from its spec and the authored attribute text, if any.
    ///
    /// Authored text that does not parse at the declared kind falls back to
    /// the default and reports a warning; mid-edit attribute values are data,
    /// not contract violations.
    pub(crate) fn from_spec(
        spec: &ValueCellSpec,
        tag: &str,
        authored: Option<&str>,
    ) -> (ValueCell, Option<ParseDiagnostic>) {
        let mut diagnostic = None;
        let value = match authored {
            Some(raw) => {
                let parsed = ScalarValue::parse(spec.kind, raw);
                if parsed.is_none() {
                    diagnostic = Some(ParseDiagnostic::warning(format!(
                        "Attribute '{}' on <{tag}> has value {raw:?} which does not parse as {:?}; \
                         using the default",
                        spec.attribute, spec.kind,
                    )));
                }
                parsed
            }
            None => None,
        };
        (
            ValueCell {
                attribute: spec.attribute,
                default: spec.default.clone(),
                value,
                raw: authored.map(str::to_string),
            },
            diagnostic,
        )
    }

    /// The backing attribute name.
    pub fn attribute(&self) -> &'static str {
        self.attribute
    }

    /// The declared default.
    pub fn default(&self) -> &ScalarValue {
        &self.default
    }

    /// The effective value: the authored value if present, else the default.
    pub fn get(&self) -> &ScalarValue {
        self.value.as_ref().unwrap_or(&self.default)
    }

    /// Whether the attribute was explicitly authored with a value of the
    /// declared type. Authoring the same value as the default still counts as
    /// explicit.
    pub fn is_explicit(&self) -> bool {
        self.value.is_some()
    }

    /// Whether [`ValueCell::get`] falls through to the declared default.
    pub fn is_defaulted(&self) -> bool {
        !self.is_explicit()
    }

    /// Raw authored attribute text, kept verbatim even when it failed to
    /// parse at the declared kind.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}
