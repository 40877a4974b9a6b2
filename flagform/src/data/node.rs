use serde_json::{Map, Value};

use crate::{action::Action, data::types::WidgetKind};

/// Fields that describe tree structure rather than rendering.
pub const STRUCTURAL_KEYS: &[&str] = &["type", "nodeName", "keyId", "keyname"];

/// Fields holding child nodes, in lookup order.
pub const CHILD_KEYS: &[&str] = &["content", "components"];

/// Node name reserved for the control that toggles a module's edit mode.
pub const MODULE_TOGGLE_NAME: &str = "moduleStatus";

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Fields shared by every node kind.
    pub base: NodeBase,
    /// Widget-specific shape, keyed by the declared `type`.
    pub kind: NodeKind,
}

/// Node shape after resolving the declared `type` through the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Layout widget owning child nodes.
    Layout {
        widget: WidgetKind,
        children: Vec<SchemaNode>,
    },
    /// Widget without children.
    Leaf(WidgetKind),
    /// Type string missing from the registry.
    Unregistered,
}

/// Symbolic action declared in `onClick`.
#[derive(Debug, Clone, PartialEq)]
pub struct OnClick {
    /// Name exactly as authored.
    pub name: String,
    /// Parsed action, `None` when the name is not a known action.
    pub action: Option<Action>,
}

/// Common optional fields of a schema node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeBase {
    /// Declared `type` string.
    pub type_name: String,
    /// Key of a value-bearing node, unique within its module.
    pub node_name: Option<String>,
    /// Flag field this node maps to inside its group.
    pub key_id: Option<String>,
    /// Marks the root of a configuration group.
    pub keyname: Option<String>,
    /// Module imposed on every descendant (group cards declare it).
    pub module: Option<String>,
    /// Authored `metadata` object.
    pub metadata: Option<Map<String, Value>>,
    /// Symbolic click action.
    pub on_click: Option<OnClick>,
    /// Node name whose current value gates this node's visibility.
    pub visibility_key: Option<String>,
    /// Authored `style` object.
    pub style: Option<Map<String, Value>>,
    /// Editable payload; `Some(Value::Null)` when authored as `null`.
    pub value: Option<Value>,
    /// Every authored field except the structural and child keys.
    pub props: Map<String, Value>,
}

impl NodeBase {
    /// `metadata.module`, ignoring empty strings.
    pub fn metadata_module(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get("module")?
            .as_str()
            .filter(|m| !m.is_empty())
    }

    /// `metadata.belongTo`.
    pub fn belong_to(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("belongTo")?.as_str()
    }

    /// Parsed click action, if any.
    pub fn action(&self) -> Option<Action> {
        self.on_click.as_ref().and_then(|c| c.action)
    }
}

impl SchemaNode {
    /// Registered widget kind of this node.
    pub fn widget(&self) -> Option<WidgetKind> {
        match &self.kind {
            NodeKind::Layout { widget, .. } => Some(*widget),
            NodeKind::Leaf(widget) => Some(*widget),
            NodeKind::Unregistered => None,
        }
    }

    /// Child nodes; empty for non-layout nodes.
    pub fn children(&self) -> &[SchemaNode] {
        match &self.kind {
            NodeKind::Layout { children, .. } => children,
            _ => &[],
        }
    }

    /// Whether this node is the control flipping its module's edit mode.
    pub fn is_module_toggle(&self) -> bool {
        self.base.action() == Some(Action::ModuleStatus)
            || self.base.node_name.as_deref() == Some(MODULE_TOGGLE_NAME)
    }

    /// Depth-first search for a node by `nodeName`.
    pub fn find(&self, node_name: &str) -> Option<&SchemaNode> {
        if self.base.node_name.as_deref() == Some(node_name) {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(node_name))
    }
}
