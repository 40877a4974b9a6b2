//! Node resolver.
//!
//! [`resolve_bindings`] turns one schema node plus its ambient context into a
//! flat [`BindingSet`]: the props a widget renders with, its read-only state,
//! visibility, live value and event handlers. Resolution reads the
//! [`EditorStore`] and may seed input state and the asset-flag index; it
//! never changes edit mode, baselines or pending changes.

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    action::{Action, ActionEvent, ModuleEvent},
    data::node::SchemaNode,
    store::EditorStore,
};

/// Keywords marking a control that submits a module's changes.
pub const ACTION_KEYWORDS: &[&str] = &["apply", "reset", "push", "save", "submit"];

/// Authored keys that the binding set models as dedicated fields.
const MODELED_KEYS: &[&str] = &[
    "style",
    "uiStyle",
    "metadata",
    "readOnly",
    "modelValue",
    "isCollapsed",
    "nodeName",
    "keyname",
];

/// Context inherited from the caller of a resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ambient<'a> {
    /// Read-only state used when no module decides it.
    pub read_only: bool,
    /// Collapsed state for collapsible widgets.
    pub is_collapsed: Option<bool>,
    /// Module imposed by an ancestor; wins over `metadata.module`.
    pub module_context: Option<&'a str>,
}

impl<'a> Ambient<'a> {
    pub fn with_module(self, module_context: Option<&'a str>) -> Self {
        Self {
            module_context,
            ..self
        }
    }
}

/// Rendering parameters for one node.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingSet {
    /// Authored props passed through untouched.
    #[serde(flatten)]
    pub props: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyname: Option<String>,
    /// Style read by leaf widgets; carries the visibility decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,
    /// Copy of the authored style read by layout containers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_style: Option<Map<String, Value>>,
    /// Metadata with the effective module and node name merged in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_collapsed: Option<bool>,
    pub read_only: bool,
    /// Live tracked value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_value: Option<Value>,
    #[serde(skip)]
    pub on_click: Option<ClickHandler>,
    #[serde(skip)]
    pub on_update: Option<UpdateHandler>,
}

impl BindingSet {
    /// Whether the resolved style hides the node.
    pub fn is_hidden(&self) -> bool {
        self.style
            .as_ref()
            .and_then(|s| s.get("display"))
            .and_then(Value::as_str)
            == Some("none")
    }
}

/// Click handler synthesized for nodes declaring `onClick`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickHandler {
    /// Action name as authored.
    pub name: String,
    /// Parsed action; `None` for unknown names.
    pub action: Option<Action>,
    /// Effective module of the node.
    pub module: Option<String>,
    /// Node metadata merged with the effective module and node name.
    pub payload: Map<String, Value>,
}

impl ClickHandler {
    /// Event to dispatch given the current store state.
    ///
    /// A module toggle asks for `cancel` while its module is editing and
    /// `edit` otherwise.
    pub fn event(&self, store: &EditorStore) -> ActionEvent {
        match (&self.module, self.action) {
            (Some(module), Some(Action::ModuleStatus)) => ActionEvent::ModuleStatus {
                module: module.clone(),
                event: if store.get_module_status(module) {
                    ModuleEvent::Cancel
                } else {
                    ModuleEvent::Edit
                },
            },
            _ => ActionEvent::Node(self.payload.clone()),
        }
    }
}

/// Value update handler synthesized for value-bearing nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateHandler {
    pub node_name: String,
    pub module: String,
    pub belong_to: Option<String>,
}

impl UpdateHandler {
    /// Forward a new widget value into the store with change tracking.
    pub fn update(&self, store: &mut EditorStore, value: Value) {
        store.set_input_state(
            &self.node_name,
            &self.module,
            self.belong_to.as_deref(),
            value,
        );
    }
}

/// Derive the bindings of `node`.
pub fn resolve_bindings(
    node: &SchemaNode,
    ambient: &Ambient<'_>,
    store: &mut EditorStore,
) -> BindingSet {
    let base = &node.base;

    let mut bindings = BindingSet {
        props: base
            .props
            .iter()
            .filter(|(k, _)| !MODELED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        node_name: base.node_name.clone(),
        keyname: base.keyname.clone(),
        style: base.style.clone(),
        ui_style: base.style.clone(),
        metadata: base.metadata.clone(),
        is_collapsed: ambient.is_collapsed,
        read_only: ambient.read_only,
        ..Default::default()
    };

    if let Some(keyname) = &base.keyname {
        store.set_asset_flag(keyname, node);
    }

    let module = ambient
        .module_context
        .filter(|m| !m.is_empty())
        .or_else(|| base.metadata_module());

    if let Some(module) = module {
        let mut metadata = base.metadata.clone().unwrap_or_default();
        metadata.insert("module".to_string(), Value::String(module.to_string()));
        match &base.node_name {
            Some(name) => {
                metadata.insert("nodeName".to_string(), Value::String(name.clone()));
            }
            None => {
                metadata.remove("nodeName");
            }
        }
        bindings.metadata = Some(metadata);

        if !node.is_module_toggle() {
            bindings.read_only = !store.get_module_status(module);
        }
    }

    if let (Some(key), Some(module)) = (&base.visibility_key, module) {
        let visible = store.get_input_state(key, module).is_some_and(is_truthy);
        set_display(&mut bindings.style, if visible { "block" } else { "none" });
    }

    let action_submit = is_action_submit(node);
    if action_submit
        && let Some(module) = module
        && !store.get_module_status(module)
    {
        set_display(&mut bindings.style, "none");
    }

    if let Some(on_click) = &base.on_click {
        bindings.on_click = Some(ClickHandler {
            name: on_click.name.clone(),
            action: on_click.action,
            module: module.map(str::to_string),
            payload: bindings.metadata.clone().unwrap_or_default(),
        });
    }

    if action_submit && let Some(module) = module {
        bindings.read_only = !store.has_pending_changes(module);
    }

    if let (Some(schema_value), Some(node_name), Some(module)) =
        (&base.value, &base.node_name, module)
    {
        if store.get_input_state(node_name, module).is_none() {
            store.seed_input_state(node_name, module, base.belong_to(), schema_value.clone());
        }
        bindings.model_value = Some(
            store
                .get_input_state(node_name, module)
                .cloned()
                .unwrap_or_else(|| schema_value.clone()),
        );
        bindings.on_update = Some(UpdateHandler {
            node_name: node_name.clone(),
            module: module.to_string(),
            belong_to: base.belong_to().map(str::to_string),
        });
    }

    debug!(
        "resolved {} {:?}: read_only={} hidden={}",
        base.type_name,
        base.node_name,
        bindings.read_only,
        bindings.is_hidden()
    );
    bindings
}

/// Whether a node submits its module's changes.
///
/// Matches [`ACTION_KEYWORDS`] case-insensitively against the action name and
/// the node name.
pub fn is_action_submit(node: &SchemaNode) -> bool {
    let candidates = [
        node.base.on_click.as_ref().map(|c| c.name.as_str()),
        node.base.node_name.as_deref(),
    ];
    candidates.into_iter().flatten().any(|s| {
        let s = s.to_lowercase();
        ACTION_KEYWORDS.iter().any(|k| s.contains(k))
    })
}

/// JavaScript-style truthiness of a flag value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn set_display(style: &mut Option<Map<String, Value>>, display: &str) {
    style
        .get_or_insert_with(Map::new)
        .insert("display".to_string(), Value::String(display.to_string()));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const MODULE: &str = "MOBILE_APP";

    fn node(value: Value) -> SchemaNode {
        SchemaNode::try_from(&value).unwrap()
    }

    fn toggle(name: &str, value: Value) -> SchemaNode {
        node(json!({
            "type": "toogle",
            "title": "Enable screen",
            "nodeName": name,
            "value": value,
            "metadata": {"module": MODULE, "belongTo": "maintenanceScreen"}
        }))
    }

    fn apply_button() -> SchemaNode {
        node(json!({
            "type": "button",
            "title": "Apply changes now",
            "nodeName": "applyChangesNow",
            "onClick": "applyChangesNow",
            "metadata": {"module": MODULE, "belongTo": ""}
        }))
    }

    fn module_toggle() -> SchemaNode {
        node(json!({
            "type": "toggleButton",
            "nodeName": "moduleStatus",
            "onClick": "moduleStatus",
            "metadata": {"module": MODULE}
        }))
    }

    #[test]
    fn test_structural_props_are_stripped_and_reattached() {
        let mut store = EditorStore::new();
        let n = node(json!({
            "type": "card",
            "keyname": "group",
            "keyId": "k",
            "nodeName": "n",
            "title": "T",
            "style": {"layout": {"type": "row"}}
        }));
        let b = resolve_bindings(&n, &Ambient::default(), &mut store);
        assert!(!b.props.contains_key("type"));
        assert!(!b.props.contains_key("keyId"));
        assert_eq!(b.props.get("title"), Some(&json!("T")));
        assert_eq!(b.node_name.as_deref(), Some("n"));
        assert_eq!(b.keyname.as_deref(), Some("group"));
        assert_eq!(b.style, b.ui_style, "style is exposed under both names");
        assert!(b.style.is_some());
    }

    #[test]
    fn test_keyname_registers_asset_flag() {
        let mut store = EditorStore::new();
        let first = node(json!({"type": "card", "keyname": "group", "title": "one"}));
        let second = node(json!({"type": "card", "keyname": "group", "title": "two"}));
        resolve_bindings(&first, &Ambient::default(), &mut store);
        resolve_bindings(&second, &Ambient::default(), &mut store);
        assert_eq!(store.get_asset_flag("group"), Some(&second), "last write wins");
    }

    #[test]
    fn test_read_only_until_module_edits() {
        let mut store = EditorStore::new();
        let n = toggle("X", json!(false));
        let ambient = Ambient::default();

        assert!(resolve_bindings(&n, &ambient, &mut store).read_only);
        store.set_module_status(MODULE, true);
        assert!(!resolve_bindings(&n, &ambient, &mut store).read_only);
    }

    #[test]
    fn test_module_toggle_uses_ambient_read_only() {
        let mut store = EditorStore::new();
        let n = module_toggle();
        assert!(!resolve_bindings(&n, &Ambient::default(), &mut store).read_only);
        let ro = Ambient {
            read_only: true,
            ..Default::default()
        };
        store.set_module_status(MODULE, true);
        assert!(resolve_bindings(&n, &ro, &mut store).read_only);
    }

    #[test]
    fn test_no_module_falls_back_to_ambient() {
        let mut store = EditorStore::new();
        let n = node(json!({"type": "text", "title": "hello"}));
        let ro = Ambient {
            read_only: true,
            ..Default::default()
        };
        assert!(resolve_bindings(&n, &ro, &mut store).read_only);
        assert!(!resolve_bindings(&n, &Ambient::default(), &mut store).read_only);
    }

    #[test]
    fn test_context_module_overrides_metadata() {
        let mut store = EditorStore::new();
        let n = toggle("X", json!(true));
        let ambient = Ambient::default().with_module(Some("WEB"));
        let b = resolve_bindings(&n, &ambient, &mut store);

        let metadata = b.metadata.unwrap();
        assert_eq!(metadata["module"], json!("WEB"));
        assert_eq!(metadata["nodeName"], json!("X"));
        assert_eq!(metadata["belongTo"], json!("maintenanceScreen"));
        assert_eq!(store.get_input_state("X", "WEB"), Some(&json!(true)));
        assert!(store.get_input_state("X", MODULE).is_none());
    }

    #[test]
    fn test_context_imposes_module_on_bare_node() {
        let mut store = EditorStore::new();
        let n = node(json!({"type": "input", "nodeName": "name", "value": "abc"}));
        let b = resolve_bindings(&n, &Ambient::default(), &mut store);
        assert!(b.on_update.is_none(), "no module, no tracked value");

        let b = resolve_bindings(&n, &Ambient::default().with_module(Some(MODULE)), &mut store);
        assert_eq!(b.model_value, Some(json!("abc")));
        assert!(b.on_update.is_some());
    }

    #[test]
    fn test_value_seeded_once_without_tracking() {
        let mut store = EditorStore::new();
        let n = toggle("X", json!(1));
        let ambient = Ambient::default();

        let b = resolve_bindings(&n, &ambient, &mut store);
        assert_eq!(b.model_value, Some(json!(1)));
        assert!(!store.has_pending_changes(MODULE));

        store.set_module_status(MODULE, true);
        b.on_update.unwrap().update(&mut store, json!(5));

        let b = resolve_bindings(&n, &ambient, &mut store);
        assert_eq!(b.model_value, Some(json!(5)), "live value wins over schema value");
        assert!(store.has_pending_changes(MODULE));
    }

    #[test]
    fn test_null_schema_value_is_bound() {
        let mut store = EditorStore::new();
        let n = toggle("X", Value::Null);
        let b = resolve_bindings(&n, &Ambient::default(), &mut store);
        assert_eq!(b.model_value, Some(Value::Null));
        assert_eq!(store.get_input_state("X", MODULE), Some(&Value::Null));
    }

    #[test]
    fn test_visibility_follows_named_value() {
        let mut store = EditorStore::new();
        let n = node(json!({
            "type": "input",
            "visibilityKey": "X",
            "style": {"width": "100%"},
            "metadata": {"module": MODULE}
        }));

        let b = resolve_bindings(&n, &Ambient::default(), &mut store);
        assert!(b.is_hidden(), "unset key hides the node");

        store.seed_input_state("X", MODULE, None, json!(false));
        assert!(resolve_bindings(&n, &Ambient::default(), &mut store).is_hidden());

        store.seed_input_state("X", MODULE, None, json!(true));
        let b = resolve_bindings(&n, &Ambient::default(), &mut store);
        assert!(!b.is_hidden());
        let style = b.style.unwrap();
        assert_eq!(style["display"], json!("block"));
        assert_eq!(style["width"], json!("100%"), "authored style is kept");
    }

    #[test]
    fn test_action_submit_detection() {
        assert!(is_action_submit(&apply_button()));
        assert!(is_action_submit(&node(json!({"type": "button", "nodeName": "SaveAll"}))));
        assert!(is_action_submit(&node(json!({"type": "button", "onClick": "pushToProd"}))));
        assert!(!is_action_submit(&module_toggle()));
    }

    #[test]
    fn test_apply_button_enabled_by_pending_changes() {
        let mut store = EditorStore::new();
        let ambient = Ambient::default();
        let field = toggle("X", json!(1));
        let button = apply_button();

        resolve_bindings(&field, &ambient, &mut store);
        let b = resolve_bindings(&button, &ambient, &mut store);
        assert!(b.is_hidden(), "hidden while viewing");
        assert!(b.read_only);

        store.set_module_status(MODULE, true);
        let b = resolve_bindings(&button, &ambient, &mut store);
        assert!(!b.is_hidden());
        assert!(b.read_only, "no pending changes yet");

        store.set_input_state("X", MODULE, None, json!(2));
        let b = resolve_bindings(&button, &ambient, &mut store);
        assert!(!b.read_only);
    }

    #[test]
    fn test_module_toggle_click_event_flips() {
        let mut store = EditorStore::new();
        let b = resolve_bindings(&module_toggle(), &Ambient::default(), &mut store);
        let handler = b.on_click.unwrap();

        assert_eq!(
            handler.event(&store),
            ActionEvent::ModuleStatus {
                module: MODULE.to_string(),
                event: ModuleEvent::Edit,
            }
        );
        store.set_module_status(MODULE, true);
        assert_eq!(
            handler.event(&store),
            ActionEvent::ModuleStatus {
                module: MODULE.to_string(),
                event: ModuleEvent::Cancel,
            }
        );
    }

    #[test]
    fn test_other_click_carries_metadata() {
        let mut store = EditorStore::new();
        let ambient = Ambient::default().with_module(Some("WEB"));
        let b = resolve_bindings(&apply_button(), &ambient, &mut store);
        let ActionEvent::Node(payload) = b.on_click.unwrap().event(&store) else {
            panic!("expected a node payload");
        };
        assert_eq!(payload["module"], json!("WEB"));
        assert_eq!(payload["nodeName"], json!("applyChangesNow"));
        assert_eq!(payload["belongTo"], json!(""));
    }

    #[test]
    fn test_resolution_never_touches_edit_state() {
        let mut store = EditorStore::new();
        for n in [toggle("X", json!(1)), apply_button(), module_toggle()] {
            resolve_bindings(&n, &Ambient::default(), &mut store);
        }
        assert!(!store.get_module_status(MODULE));
        assert!(store.get_original_values(MODULE).is_none());
        assert!(store.get_pending_changes(MODULE).is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(0.5)));
    }

    #[test]
    fn test_bindings_serialize_flat() {
        let mut store = EditorStore::new();
        let b = resolve_bindings(&toggle("X", json!(true)), &Ambient::default(), &mut store);
        let value = serde_json::to_value(&b).unwrap();
        assert_eq!(value["title"], json!("Enable screen"));
        assert_eq!(value["nodeName"], json!("X"));
        assert_eq!(value["readOnly"], json!(true));
        assert_eq!(value["modelValue"], json!(true));
        assert_eq!(value["value"], json!(true));
    }
}
