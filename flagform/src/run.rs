use std::path::Path;

use anyhow::{Context, anyhow, bail};
use clap::ValueEnum;
use serde_json::Value;

use crate::{action::SummaryHandler, data::session::EditorSession};

/// When an applied change set should roll out.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyMode {
    /// Roll out immediately.
    Now,
    /// Schedule for later.
    Later,
}

/// Scripted edit of one module.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    /// Module to put into edit mode.
    pub module: String,
    /// Values to set, in order.
    pub assignments: Vec<(String, Value)>,
    /// Apply action to dispatch afterwards.
    pub apply: Option<ApplyMode>,
}

/// Parse `NODE=VALUE`.
///
/// The value is read as JSON when possible and as plain text otherwise, so
/// `X=5` sets a number and `X=abc` a string.
pub fn parse_assignment(s: &str) -> anyhow::Result<(String, Value)> {
    let (name, raw) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NODE=VALUE, got `{s}`"))?;
    if name.is_empty() {
        bail!("empty node name in `{s}`");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

/// Load a schema file and return its resolved render tree as JSON.
pub fn render_schema(path: impl AsRef<Path>, read_only: bool) -> anyhow::Result<Value> {
    let mut session = EditorSession::new(path)?;
    session.read_only = read_only;
    let tree = session.render()?;
    Ok(serde_json::to_value(&tree)?)
}

/// Run an edit request against a session.
pub fn run_edit<H: SummaryHandler>(
    session: &mut EditorSession<H>,
    request: &EditRequest,
) -> anyhow::Result<()> {
    session.enter_edit(&request.module)?;

    for (name, value) in &request.assignments {
        session
            .update(name, value.clone())
            .with_context(|| format!("Failed to set `{name}`"))?;
    }

    if let Some(mode) = request.apply {
        session.apply(&request.module, mode == ApplyMode::Now);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("X=5").unwrap(), ("X".to_string(), json!(5)));
        assert_eq!(parse_assignment("X=true").unwrap().1, json!(true));
        assert_eq!(parse_assignment("X=abc").unwrap().1, json!("abc"));
        assert_eq!(parse_assignment("X=\"5\"").unwrap().1, json!("5"));
        assert_eq!(parse_assignment("X=a=b").unwrap().1, json!("a=b"));
        assert!(parse_assignment("X").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn test_run_edit() {
        let mut session = EditorSession::from_value(json!({
            "type": "card",
            "module": "M",
            "components": [
                {"type": "dropdown", "nodeName": "freq", "value": 30},
                {"type": "toggle", "nodeName": "on", "value": false}
            ]
        }))
        .unwrap();

        let request = EditRequest {
            module: "M".to_string(),
            assignments: vec![
                ("freq".to_string(), json!("30")),
                ("on".to_string(), json!(true)),
            ],
            apply: Some(ApplyMode::Later),
        };
        run_edit(&mut session, &request).unwrap();

        let changes = session.pending_changes("M").unwrap();
        assert_eq!(changes.len(), 1, "\"30\" matches the numeric baseline");
        assert!(changes.contains_key("on"));

        let summaries = &session.dispatcher.summary().summaries;
        assert_eq!(summaries.len(), 1);
        assert!(!summaries[0].apply_now);
    }

    #[test]
    fn test_run_edit_wrong_module() {
        let mut session = EditorSession::from_value(json!({
            "type": "card",
            "module": "M",
            "components": [{"type": "toggle", "nodeName": "on", "value": false}]
        }))
        .unwrap();
        let request = EditRequest {
            module: "OTHER".to_string(),
            assignments: vec![("on".to_string(), json!(true))],
            apply: None,
        };
        let err = run_edit(&mut session, &request).unwrap_err();
        assert!(format!("{err:#}").contains("read-only"), "{err:#}");
    }
}
