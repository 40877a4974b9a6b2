//! Recursive rendering pass.
//!
//! The walker applies the resolver to every node of a schema tree, threading
//! the module context down explicitly: a node declaring a top-level `module`
//! imposes it on all of its descendants.

use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::{
    data::{node::SchemaNode, types::WidgetKind},
    resolver::{Ambient, BindingSet, resolve_bindings},
    store::EditorStore,
};

/// A resolved node ready for presentation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub widget: WidgetKind,
    pub bindings: BindingSet,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    /// Depth-first search by node name.
    pub fn find(&self, node_name: &str) -> Option<&RenderNode> {
        if self.bindings.node_name.as_deref() == Some(node_name) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(node_name))
    }

    /// Visit this node and all descendants, parents first.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a RenderNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Walks schema trees against one store.
pub struct TreeWalker<'s> {
    store: &'s mut EditorStore,
    collapsed: Option<&'s BTreeMap<String, bool>>,
}

impl<'s> TreeWalker<'s> {
    pub fn new(store: &'s mut EditorStore) -> Self {
        Self {
            store,
            collapsed: None,
        }
    }

    /// Collapse state of collapsible nodes, keyed by keyname or node name.
    pub fn with_collapsed(mut self, collapsed: &'s BTreeMap<String, bool>) -> Self {
        self.collapsed = Some(collapsed);
        self
    }

    fn collapse_state(&self, node: &SchemaNode) -> Option<bool> {
        let collapsed = self.collapsed?;
        [&node.base.keyname, &node.base.node_name]
            .into_iter()
            .flatten()
            .find_map(|key| collapsed.get(key).copied())
    }

    /// Resolve `node` and its subtree.
    ///
    /// Returns `None` for nodes whose type has no registered widget; their
    /// siblings are unaffected.
    pub fn walk<'a>(&mut self, node: &'a SchemaNode, ambient: Ambient<'a>) -> Option<RenderNode> {
        let Some(widget) = node.widget() else {
            warn!(
                "skipping node {:?}: unregistered type `{}`",
                node.base.node_name, node.base.type_name
            );
            return None;
        };

        let mut ambient = ambient;
        if widget == WidgetKind::Collapsible
            && let Some(state) = self.collapse_state(node)
        {
            ambient.is_collapsed = Some(state);
        }
        let bindings = resolve_bindings(node, &ambient, self.store);

        let child_ambient = Ambient {
            read_only: ambient.read_only,
            is_collapsed: None,
            module_context: node.base.module.as_deref().or(ambient.module_context),
        };
        let children = node
            .children()
            .iter()
            .filter_map(|child| self.walk(child, child_ambient))
            .collect();

        Some(RenderNode {
            widget,
            bindings,
            children,
        })
    }
}
