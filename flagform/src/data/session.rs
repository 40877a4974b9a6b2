use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use serde_json::Value;

use crate::{
    action::{Action, ActionEvent, Dispatcher, ModuleEvent, RecordedSummaries, SummaryHandler},
    data::{asset::AssetDocument, node::SchemaNode},
    resolver::Ambient,
    store::{EditorStore, PendingChange},
    walker::{RenderNode, TreeWalker},
};

/// One editing session over a single asset.
///
/// Owns the schema tree, the edit-state store and the dispatcher, and plays
/// the part of the presentation layer: values and clicks are routed through
/// the handlers the resolver produced, honoring their read-only state.
pub struct EditorSession<H = RecordedSummaries> {
    /// Loaded asset.
    pub asset: AssetDocument,
    /// Parsed schema tree.
    pub root: SchemaNode,
    /// Edit state of every module in the asset.
    pub store: EditorStore,
    /// Action dispatcher with its summary collaborator.
    pub dispatcher: Dispatcher<H>,
    /// Ambient read-only flag for the whole form.
    pub read_only: bool,
    /// File the asset was loaded from.
    pub path: Option<PathBuf>,
    /// Collapse state of collapsible sections, keyed by keyname or node name.
    pub collapsed: BTreeMap<String, bool>,
}

/// Read a JSON or TOML file into a JSON value, chosen by extension.
pub fn read_value(path: &Path) -> anyhow::Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let value = match ext {
        "json" => serde_json::from_str(&content)?,
        "toml" => {
            let v: toml::Value = toml::from_str(&content)?;
            serde_json::to_value(v)?
        }
        _ => {
            bail!("Unsupported schema file extension: {ext:?}");
        }
    };
    Ok(value)
}

impl EditorSession<RecordedSummaries> {
    /// Load a session from a schema or asset file.
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::new_with_handler(path, RecordedSummaries::default())
    }

    /// Build a session from an in-memory schema or asset.
    pub fn from_value(value: Value) -> anyhow::Result<Self> {
        Self::from_value_with_handler(value, RecordedSummaries::default())
    }
}

impl<H: SummaryHandler> EditorSession<H> {
    /// Load a session from a file, handing change sets to `handler`.
    pub fn new_with_handler(path: impl AsRef<Path>, handler: H) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("Schema file does not exist: {}", path.display());
        }
        let value = read_value(path)?;
        let mut session = Self::from_value_with_handler(value, handler)
            .with_context(|| format!("Invalid schema in {}", path.display()))?;
        session.path = Some(path.to_path_buf());
        Ok(session)
    }

    /// Build a session from a value, handing change sets to `handler`.
    pub fn from_value_with_handler(value: Value, handler: H) -> anyhow::Result<Self> {
        let asset = AssetDocument::from_value(value)?;
        let root = asset.root()?;
        Ok(Self {
            asset,
            root,
            store: EditorStore::new(),
            dispatcher: Dispatcher::new(handler),
            read_only: false,
            path: None,
            collapsed: BTreeMap::new(),
        })
    }

    /// Resolve the whole tree against the current state.
    pub fn render(&mut self) -> anyhow::Result<RenderNode> {
        let ambient = Ambient {
            read_only: self.read_only,
            ..Default::default()
        };
        TreeWalker::new(&mut self.store)
            .with_collapsed(&self.collapsed)
            .walk(&self.root, ambient)
            .with_context(|| {
                format!(
                    "Schema root has unregistered type `{}`",
                    self.root.base.type_name
                )
            })
    }

    fn rendered(&mut self, node_name: &str) -> anyhow::Result<RenderNode> {
        let tree = self.render()?;
        match tree.find(node_name) {
            Some(node) => Ok(node.clone()),
            None => bail!("No node named `{node_name}`"),
        }
    }

    /// Set a node's value the way its widget would.
    ///
    /// # Errors
    ///
    /// Fails when the node does not exist, carries no value or is read-only.
    pub fn update(&mut self, node_name: &str, value: Value) -> anyhow::Result<()> {
        let node = self.rendered(node_name)?;
        let Some(handler) = &node.bindings.on_update else {
            bail!("Node `{node_name}` has no editable value");
        };
        if node.bindings.read_only {
            bail!("Node `{node_name}` is read-only");
        }
        handler.update(&mut self.store, value);
        Ok(())
    }

    /// Click a node the way its widget would.
    ///
    /// # Errors
    ///
    /// Fails when the node does not exist, has no action or is disabled.
    pub fn click(&mut self, node_name: &str) -> anyhow::Result<()> {
        let node = self.rendered(node_name)?;
        let Some(handler) = &node.bindings.on_click else {
            bail!("Node `{node_name}` has no click action");
        };
        if node.bindings.read_only {
            bail!("Node `{node_name}` is disabled");
        }
        self.dispatcher.click(&mut self.store, handler);
        Ok(())
    }

    /// Collapse or expand the section registered under `key`.
    pub fn set_collapsed(&mut self, key: &str, collapsed: bool) {
        self.collapsed.insert(key.to_string(), collapsed);
    }

    /// Put `module` into edit mode.
    ///
    /// The tree is rendered first so every value of the module is seeded
    /// before its baseline is captured.
    pub fn enter_edit(&mut self, module: &str) -> anyhow::Result<()> {
        self.render()?;
        self.module_event(module, ModuleEvent::Edit);
        Ok(())
    }

    /// Leave edit mode on `module`, dropping its edited values.
    pub fn cancel_edit(&mut self, module: &str) {
        self.module_event(module, ModuleEvent::Cancel);
    }

    fn module_event(&mut self, module: &str, event: ModuleEvent) {
        let event = ActionEvent::ModuleStatus {
            module: module.to_string(),
            event,
        };
        self.dispatcher
            .dispatch(&mut self.store, Action::ModuleStatus, &event);
    }

    /// Dispatch an apply action for `module`.
    pub fn apply(&mut self, module: &str, now: bool) {
        let action = if now {
            Action::ApplyChangesNow
        } else {
            Action::ApplyChangesLater
        };
        let mut payload = serde_json::Map::new();
        payload.insert("module".to_string(), Value::String(module.to_string()));
        self.dispatcher
            .dispatch(&mut self.store, action, &ActionEvent::Node(payload));
    }

    /// Pending changes of `module`.
    pub fn pending_changes(&self, module: &str) -> Option<&BTreeMap<String, PendingChange>> {
        self.store.get_pending_changes(module)
    }
}
