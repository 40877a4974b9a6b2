use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{node::SchemaNode, schema::SchemaError};

/// Stored asset wrapping a schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetDocument {
    /// Service whose flags the asset configures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Whether option lists are filled from catalogs at runtime.
    #[serde(default)]
    pub has_dynamic_catalogs: bool,
    /// Hidden assets are not offered for editing.
    #[serde(default)]
    pub hidden: bool,
    /// Root schema node.
    pub document: Value,
}

impl AssetDocument {
    /// Accept either a full asset or a bare schema node.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let is_envelope = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("document") && !obj.contains_key("type"));

        if is_envelope {
            serde_json::from_value(value)
        } else {
            Ok(Self {
                service_id: None,
                has_dynamic_catalogs: false,
                hidden: false,
                document: value,
            })
        }
    }

    /// Parse the wrapped schema tree.
    pub fn root(&self) -> Result<SchemaNode, SchemaError> {
        SchemaNode::try_from(&self.document)
    }

    /// JSON Schema describing the asset envelope.
    pub fn json_schema() -> Value {
        let schema = schemars::schema_for!(AssetDocument);
        serde_json::to_value(&schema).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_envelope() {
        let asset = AssetDocument::from_value(json!({
            "serviceId": "MOBILE_APP",
            "hasDynamicCatalogs": true,
            "hidden": false,
            "document": {"type": "collapsible", "title": "Mobile App", "content": []}
        }))
        .unwrap();
        assert_eq!(asset.service_id.as_deref(), Some("MOBILE_APP"));
        assert!(asset.has_dynamic_catalogs);
        assert_eq!(asset.root().unwrap().base.type_name, "collapsible");
    }

    #[test]
    fn test_bare_node() {
        let asset = AssetDocument::from_value(json!({"type": "card", "components": []})).unwrap();
        assert_eq!(asset.service_id, None);
        assert_eq!(asset.root().unwrap().base.type_name, "card");
    }

    #[test]
    fn test_json_schema_lists_fields() {
        let schema = AssetDocument::json_schema();
        let props = &schema["properties"];
        assert!(props.get("serviceId").is_some());
        assert!(props.get("document").is_some());
    }
}
