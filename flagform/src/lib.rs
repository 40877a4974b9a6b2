//! # flagform
//!
//! Schema interpreter and edit-state engine for remote feature flag forms.
//!
//! Operators describe configuration screens as a JSON tree. `flagform` walks
//! that tree, derives the rendering bindings of every node from its metadata
//! and the session's edit state, and tracks which flag values diverged from
//! the baseline captured when a module entered edit mode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flagform::data::EditorSession;
//! use serde_json::json;
//!
//! let mut session = EditorSession::new("mobile-app.json").unwrap();
//! session.render().unwrap();
//! session.click("moduleStatus").unwrap();
//! session.update("MS-tg1", json!(true)).unwrap();
//! let pending = session.pending_changes("MOBILE_APP");
//! ```
//!
//! ## Modules
//!
//! - [`data`] - schema model, registry, ingestion and sessions
//! - [`resolver`] - per-node binding resolution
//! - [`store`] - edit-state store and change tracking
//! - [`action`] - click actions and their dispatcher
//! - [`walker`] - recursive rendering pass
//! - [`run`] - command-line workflows (requires the `cli` feature)

/// Schema data structures, registry and sessions.
pub mod data;

/// Click actions and the dispatcher.
pub mod action;

/// Node resolver producing binding sets.
pub mod resolver;

/// Edit-state store and change tracking.
pub mod store;

/// Tree walker threading module context through a schema tree.
pub mod walker;

/// Command-line workflows.
///
/// This module is only available when the `cli` feature is enabled.
#[cfg(feature = "cli")]
pub mod run;

pub use serde_json::Value;
