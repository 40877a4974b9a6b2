//! Schema data structures and sessions.
//!
//! - [`types`] - widget kinds and the component type registry
//! - [`node`] - schema node model
//! - [`schema`] - ingestion of JSON into schema nodes
//! - [`asset`] - stored asset envelope
//! - [`session`] - editing session over one asset

/// Stored asset envelope around a schema tree.
pub mod asset;

/// Schema node model.
pub mod node;

/// Schema ingestion and its errors.
pub mod schema;

/// Editing session owning schema, store and dispatcher.
pub mod session;

/// Widget kinds and the component type registry.
pub mod types;

pub use asset::AssetDocument;
pub use node::SchemaNode;
pub use session::EditorSession;
