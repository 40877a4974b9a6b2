//! Schema ingestion.
//!
//! Converts raw JSON into [`SchemaNode`] trees. This is the only place where
//! authored strings become typed values: `type` goes through the registry and
//! `onClick` through [`Action`]'s parser. Unknown names are logged and kept as
//! inert nodes so that the rest of the tree still renders.

use log::warn;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    action::Action,
    data::{
        node::{CHILD_KEYS, NodeBase, NodeKind, OnClick, STRUCTURAL_KEYS, SchemaNode},
        types::resolve_type,
    },
};

/// Errors raised while ingesting a schema tree.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("{path}: expected an object, found {actual}")]
    NotAnObject { path: String, actual: String },
    #[error("{path}: missing required field `{field}`")]
    MissingField { path: String, field: &'static str },
    #[error("{path}: type mismatch, expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

impl TryFrom<&Value> for SchemaNode {
    type Error = SchemaError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        parse_node(value, "$")
    }
}

/// Parse one node and, recursively, its children.
///
/// A malformed child is logged and dropped; only a malformed `value` at
/// `path` itself is an error.
pub fn parse_node(value: &Value, path: &str) -> Result<SchemaNode, SchemaError> {
    let Value::Object(obj) = value else {
        return Err(SchemaError::NotAnObject {
            path: path.to_string(),
            actual: kind_of(value).to_string(),
        });
    };

    let type_name = opt_string(obj, "type", path)?.ok_or_else(|| SchemaError::MissingField {
        path: path.to_string(),
        field: "type",
    })?;

    let on_click = non_empty(opt_string(obj, "onClick", path)?).map(|name| {
        let action = match name.parse::<Action>() {
            Ok(action) => Some(action),
            Err(e) => {
                warn!("{path}: {e}, clicks on this node are ignored");
                None
            }
        };
        OnClick { name, action }
    });

    let props = obj
        .iter()
        .filter(|(k, _)| {
            !STRUCTURAL_KEYS.contains(&k.as_str()) && !CHILD_KEYS.contains(&k.as_str())
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let base = NodeBase {
        node_name: non_empty(opt_string(obj, "nodeName", path)?),
        key_id: non_empty(opt_string(obj, "keyId", path)?),
        keyname: non_empty(opt_string(obj, "keyname", path)?),
        module: non_empty(opt_string(obj, "module", path)?),
        metadata: opt_object(obj, "metadata", path)?,
        on_click,
        visibility_key: non_empty(opt_string(obj, "visibilityKey", path)?),
        style: opt_object(obj, "style", path)?,
        value: obj.get("value").cloned(),
        props,
        type_name,
    };

    let kind = match resolve_type(&base.type_name) {
        Some(widget) if widget.is_layout() => NodeKind::Layout {
            widget,
            children: parse_children(obj, path)?,
        },
        Some(widget) => NodeKind::Leaf(widget),
        None => {
            warn!("{path}: no widget registered for type `{}`", base.type_name);
            NodeKind::Unregistered
        }
    };

    Ok(SchemaNode { base, kind })
}

fn parse_children(obj: &Map<String, Value>, path: &str) -> Result<Vec<SchemaNode>, SchemaError> {
    let Some((key, value)) = CHILD_KEYS
        .iter()
        .find_map(|key| obj.get(*key).map(|v| (*key, v)))
    else {
        return Ok(Vec::new());
    };

    let Value::Array(items) = value else {
        return Err(SchemaError::TypeMismatch {
            path: format!("{path}.{key}"),
            expected: "array".to_string(),
            actual: kind_of(value).to_string(),
        });
    };

    let mut children = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let child_path = format!("{path}.{key}[{i}]");
        match parse_node(item, &child_path) {
            Ok(child) => children.push(child),
            Err(e) => warn!("skipping malformed node: {e}"),
        }
    }
    Ok(children)
}

fn opt_string(
    obj: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<String>, SchemaError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(SchemaError::TypeMismatch {
            path: format!("{path}.{field}"),
            expected: "string".to_string(),
            actual: kind_of(other).to_string(),
        }),
    }
}

fn opt_object(
    obj: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<Map<String, Value>>, SchemaError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(m)) => Ok(Some(m.clone())),
        Some(other) => Err(SchemaError::TypeMismatch {
            path: format!("{path}.{field}"),
            expected: "object".to_string(),
            actual: kind_of(other).to_string(),
        }),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
