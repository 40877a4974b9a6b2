//! Edit-state store.
//!
//! Holds every piece of mutable session state, partitioned by module:
//!
//! - input state: the live value of each value-bearing node
//! - module status: whether a module is being edited
//! - baseline: input state captured when a module entered edit mode
//! - pending changes: nodes whose live value diverges from the baseline
//! - asset flags: group-root nodes indexed by `keyname`
//!
//! Baseline and pending changes of a module exist exactly while the module
//! is in edit mode.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::data::node::SchemaNode;

/// Change-equality used by change tracking.
pub mod equality;

pub use equality::values_equal;

/// Live value of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEntry {
    /// Current value.
    pub value: Value,
    /// Group the value belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub belong_to: Option<String>,
}

/// A value that diverged from its baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    /// Baseline captured on entering edit mode.
    pub original_value: Value,
    /// Latest value set while editing.
    pub current_value: Value,
}

/// Per-module inputs keyed by node name.
pub type ModuleInputs = BTreeMap<String, InputEntry>;

/// Per-module pending changes keyed by node name.
pub type ModuleChanges = BTreeMap<String, PendingChange>;

/// Session-scoped edit state for all modules.
#[derive(Debug, Clone, Default)]
pub struct EditorStore {
    input_state: HashMap<String, ModuleInputs>,
    module_status: HashMap<String, bool>,
    asset_flags: HashMap<String, SchemaNode>,
    pending_changes: HashMap<String, ModuleChanges>,
    original_values: HashMap<String, BTreeMap<String, Value>>,
}

impl EditorStore {
    /// Create an empty store; every module starts read-only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a node's value and track it against the module's baseline.
    pub fn set_input_state(
        &mut self,
        node_name: &str,
        module: &str,
        belong_to: Option<&str>,
        value: Value,
    ) {
        self.upsert(node_name, module, belong_to, value.clone());
        self.track_change(node_name, module, &value);
    }

    /// Set a node's value without change tracking.
    ///
    /// Used when a node is resolved for the first time and its schema value
    /// becomes the initial input state.
    pub fn seed_input_state(
        &mut self,
        node_name: &str,
        module: &str,
        belong_to: Option<&str>,
        value: Value,
    ) {
        debug!("seeding {module}.{node_name} = {value}");
        self.upsert(node_name, module, belong_to, value);
    }

    fn upsert(&mut self, node_name: &str, module: &str, belong_to: Option<&str>, value: Value) {
        self.input_state.entry(module.to_string()).or_default().insert(
            node_name.to_string(),
            InputEntry {
                value,
                belong_to: belong_to.map(str::to_string),
            },
        );
    }

    /// Compare `new_value` with the baseline and update pending changes.
    ///
    /// Without a baseline (module not in edit mode) this only logs.
    pub fn track_change(&mut self, node_name: &str, module: &str, new_value: &Value) {
        let Some(original) = self
            .original_values
            .get(module)
            .and_then(|m| m.get(node_name))
        else {
            warn!("no original value found for {module}.{node_name}, change not tracked");
            return;
        };

        let changes = self.pending_changes.entry(module.to_string()).or_default();

        if values_equal(new_value, original) {
            if changes.remove(node_name).is_some() {
                info!("reverted {module}.{node_name}");
            }
        } else {
            let previous = changes.insert(
                node_name.to_string(),
                PendingChange {
                    original_value: original.clone(),
                    current_value: new_value.clone(),
                },
            );
            match previous {
                Some(_) => info!("updated {module}.{node_name}: {original} -> {new_value}"),
                None => info!("new change {module}.{node_name}: {original} -> {new_value}"),
            }
        }

        debug!("{module} has {} pending change(s)", changes.len());
    }

    /// Snapshot the module's current input state as its baseline.
    pub fn capture_original_values(&mut self, module: &str) {
        let originals: BTreeMap<String, Value> = match self.input_state.get(module) {
            Some(inputs) => inputs
                .iter()
                .map(|(name, entry)| (name.clone(), entry.value.clone()))
                .collect(),
            None => {
                warn!("no input state for module {module}, baseline is empty");
                BTreeMap::new()
            }
        };
        info!("captured {} original value(s) for {module}", originals.len());
        self.original_values.insert(module.to_string(), originals);
    }

    /// Current value of a node, `None` if never set.
    pub fn get_input_state(&self, node_name: &str, module: &str) -> Option<&Value> {
        self.input_state
            .get(module)?
            .get(node_name)
            .map(|entry| &entry.value)
    }

    /// Every input of a module.
    pub fn get_all_input_state(&self, module: &str) -> Option<&ModuleInputs> {
        self.input_state.get(module)
    }

    /// Drop a module's input state; nodes reseed from the schema on the next
    /// resolution pass.
    pub fn clear_input_state(&mut self, module: &str) {
        self.input_state.remove(module);
    }

    /// Enter (`true`) or leave (`false`) edit mode.
    ///
    /// Entering captures a fresh baseline and starts with no pending changes.
    /// Leaving discards baseline and pending changes; input state is kept.
    pub fn set_module_status(&mut self, module: &str, is_editing: bool) {
        self.module_status.insert(module.to_string(), is_editing);

        if is_editing {
            self.capture_original_values(module);
            self.pending_changes
                .insert(module.to_string(), ModuleChanges::new());
        } else {
            self.pending_changes.remove(module);
            self.original_values.remove(module);
        }
    }

    /// Whether the module is in edit mode; `false` for unknown modules.
    pub fn get_module_status(&self, module: &str) -> bool {
        self.module_status.get(module).copied().unwrap_or(false)
    }

    /// Whether any value of the module diverges from its baseline.
    pub fn has_pending_changes(&self, module: &str) -> bool {
        self.pending_changes
            .get(module)
            .is_some_and(|changes| !changes.is_empty())
    }

    /// Pending changes of a module.
    pub fn get_pending_changes(&self, module: &str) -> Option<&ModuleChanges> {
        self.pending_changes.get(module)
    }

    /// Baseline of a module.
    pub fn get_original_values(&self, module: &str) -> Option<&BTreeMap<String, Value>> {
        self.original_values.get(module)
    }

    /// Forget every pending change of a module.
    pub fn clear_pending_changes(&mut self, module: &str) {
        self.pending_changes.remove(module);
    }

    /// Index a group-root node by its keyname; the last write wins.
    ///
    /// Re-indexing an identical node leaves the entry untouched.
    pub fn set_asset_flag(&mut self, keyname: &str, node: &SchemaNode) {
        if self.asset_flags.get(keyname) == Some(node) {
            return;
        }
        self.asset_flags.insert(keyname.to_string(), node.clone());
    }

    /// Group-root node registered under `keyname`.
    pub fn get_asset_flag(&self, keyname: &str) -> Option<&SchemaNode> {
        self.asset_flags.get(keyname)
    }

    pub fn clear_asset_flags(&mut self) {
        self.asset_flags.clear();
    }
}
