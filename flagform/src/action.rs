//! Click actions and their dispatch.
//!
//! Schemas name actions with strings in `onClick`. They are parsed into
//! [`Action`] during ingestion; from then on dispatch is a total match.

use std::{collections::BTreeMap, fmt, str::FromStr};

use log::{info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    resolver::ClickHandler,
    store::{EditorStore, InputEntry, ModuleChanges},
};

/// Actions a schema node may trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Flip a module between viewing and editing.
    ModuleStatus,
    /// Open the change summary for a later rollout.
    ApplyChangesLater,
    /// Open the change summary for an immediate rollout.
    ApplyChangesNow,
}

impl Action {
    /// Name used in schemas.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::ModuleStatus => "moduleStatus",
            Action::ApplyChangesLater => "applyChangesLater",
            Action::ApplyChangesNow => "applyChangesNow",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action name not present in the dispatch table.
#[derive(Debug, Error, PartialEq)]
#[error("no handler for action `{0}`")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "moduleStatus" => Ok(Action::ModuleStatus),
            "applyChangesLater" => Ok(Action::ApplyChangesLater),
            "applyChangesNow" => Ok(Action::ApplyChangesNow),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Requested edit-mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleEvent {
    Edit,
    Cancel,
}

/// Payload carried by a click.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEvent {
    /// Edit-mode toggle for one module.
    ModuleStatus { module: String, event: ModuleEvent },
    /// Node metadata merged with the effective module and node name.
    Node(Map<String, Value>),
}

impl ActionEvent {
    /// Module the event targets.
    pub fn module(&self) -> Option<&str> {
        match self {
            ActionEvent::ModuleStatus { module, .. } => Some(module),
            ActionEvent::Node(payload) => payload
                .get("module")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty()),
        }
    }
}

/// Change set handed to the summary collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    /// Module the changes belong to.
    pub module: String,
    /// Roll out immediately instead of at a later time.
    pub apply_now: bool,
    /// Values that diverged from the baseline.
    pub changes: ModuleChanges,
    /// Full input state of the module.
    pub values: BTreeMap<String, InputEntry>,
}

/// Receives change sets when an apply action fires.
///
/// Implementors show a confirmation and talk to persistence; the engine
/// stops at producing the [`ChangeSet`].
pub trait SummaryHandler {
    fn open_summary(&mut self, changes: ChangeSet);
}

/// Summary handler that keeps every change set it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordedSummaries {
    pub summaries: Vec<ChangeSet>,
}

impl SummaryHandler for RecordedSummaries {
    fn open_summary(&mut self, changes: ChangeSet) {
        self.summaries.push(changes);
    }
}

/// Maps actions onto store transitions.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<H = RecordedSummaries> {
    summary: H,
}

impl<H: SummaryHandler> Dispatcher<H> {
    pub fn new(summary: H) -> Self {
        Self { summary }
    }

    /// The summary collaborator.
    pub fn summary(&self) -> &H {
        &self.summary
    }

    pub fn summary_mut(&mut self) -> &mut H {
        &mut self.summary
    }

    /// Run a click handler produced by the resolver.
    ///
    /// The event is computed now, so a module toggle always flips the
    /// module's current state.
    pub fn click(&mut self, store: &mut EditorStore, handler: &ClickHandler) {
        let Some(action) = handler.action else {
            warn!("no handler for action `{}`", handler.name);
            return;
        };
        let event = handler.event(store);
        self.dispatch(store, action, &event);
    }

    /// Run `action` with `event`.
    pub fn dispatch(&mut self, store: &mut EditorStore, action: Action, event: &ActionEvent) {
        info!("dispatching {action} for {:?}", event.module());
        match action {
            Action::ModuleStatus => self.module_status(store, event),
            Action::ApplyChangesLater => self.open_summary(store, event, false),
            Action::ApplyChangesNow => self.open_summary(store, event, true),
        }
    }

    fn module_status(&mut self, store: &mut EditorStore, event: &ActionEvent) {
        match event {
            ActionEvent::ModuleStatus {
                module,
                event: ModuleEvent::Edit,
            } => {
                info!("module {module} enters edit mode");
                store.set_module_status(module, true);
            }
            ActionEvent::ModuleStatus {
                module,
                event: ModuleEvent::Cancel,
            } => {
                info!("module {module} leaves edit mode");
                store.set_module_status(module, false);
                store.clear_input_state(module);
            }
            ActionEvent::Node(_) => {
                warn!("module status event without a module: {event:?}");
            }
        }
    }

    fn open_summary(&mut self, store: &EditorStore, event: &ActionEvent, apply_now: bool) {
        let Some(module) = event.module() else {
            warn!("summary requested without a module");
            return;
        };
        let Some(values) = store
            .get_all_input_state(module)
            .filter(|inputs| !inputs.is_empty())
        else {
            info!("no changes to apply for {module}");
            return;
        };

        let changes = ChangeSet {
            module: module.to_string(),
            apply_now,
            changes: store.get_pending_changes(module).cloned().unwrap_or_default(),
            values: values.clone(),
        };
        info!(
            "opening summary for {module} ({} pending, apply now: {apply_now})",
            changes.changes.len()
        );
        self.summary.open_summary(changes);
    }
}
