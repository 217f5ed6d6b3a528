//! Built-in whiteboard action modules

use std::sync::Arc;

use serde_json::{json, Value};

use crate::handler::{FnFactory, Handler, HandlerCatalog, HandlerFactory};
use crate::params::{ParamKind, ParamSchema, Parameters};

/// Module used when an action does not name one
///
/// The dotted path is what deployed configuration files already contain.
pub const DEFAULT_MODULE: &str = "src.jbi.whiteboard_actions.default";

pub(crate) fn register_builtins(catalog: &mut HandlerCatalog) {
    catalog.register_factory(DEFAULT_MODULE, default_factory());
}

/// Entry point of the default module: `whiteboard_tag` and `jira_project_key`
/// are required, any other key is passed through
pub fn default_factory() -> Arc<dyn HandlerFactory> {
    let schema = ParamSchema::new()
        .required("whiteboard_tag", ParamKind::String)
        .required("jira_project_key", ParamKind::String)
        .allow_extra();
    Arc::new(FnFactory::new(schema, |parameters| {
        Ok(Arc::new(DefaultHandler::from_parameters(parameters)?) as Arc<dyn Handler>)
    }))
}

/// Handler produced by the default module
///
/// Ticket synchronisation itself lives in the webhook service; this handler
/// only reports which project an event would be synced to.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultHandler {
    pub whiteboard_tag: String,
    pub jira_project_key: String,
    /// Extra keyword parameters, kept for the sync layer
    pub options: Parameters,
}

impl DefaultHandler {
    fn from_parameters(parameters: &Parameters) -> anyhow::Result<Self> {
        let text = |name: &str| -> anyhow::Result<String> {
            parameters
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("`{}` must be a string", name))
        };

        let options = parameters
            .iter()
            .filter(|(key, _)| *key != "whiteboard_tag" && *key != "jira_project_key")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            whiteboard_tag: text("whiteboard_tag")?,
            jira_project_key: text("jira_project_key")?,
            options,
        })
    }
}

impl Handler for DefaultHandler {
    fn handle(&self, payload: &Value) -> anyhow::Result<Value> {
        let bug_id = payload.pointer("/bug/id").cloned().unwrap_or(Value::Null);
        tracing::debug!(
            whiteboard_tag = %self.whiteboard_tag,
            jira_project_key = %self.jira_project_key,
            "default action invoked"
        );
        Ok(json!({
            "status": "noop",
            "whiteboard_tag": self.whiteboard_tag,
            "jira_project_key": self.jira_project_key,
            "bug_id": bug_id,
        }))
    }
}
