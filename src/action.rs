//! Action definitions
//!
//! [`ActionRecord`] is the YAML shape of one entry in the actions file.
//! [`ActionSpec`] is the validated form: its contact has been checked, its
//! module resolved, and its parameters bound against the module's schema.
//!
//! ```yaml
//! - action_tag: devtest
//!   contact: tbd@mozilla.com
//!   description: DevTest whiteboard tag
//!   enabled: true
//!   parameters:
//!     whiteboard_tag: devtest
//!     jira_project_key: DevTest
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::builtin::DEFAULT_MODULE;
use crate::contact::{Contact, RawContact};
use crate::error::{ActionConfigurationError, RegistryError};
use crate::handler::{Handler, HandlerCatalog, HandlerFactory};
use crate::params::Parameters;

/// One action as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Lookup key, matched case-insensitively
    pub action_tag: String,

    /// Module providing the `init` entry point
    #[serde(default = "default_module")]
    pub module: String,

    pub contact: RawContact,

    pub description: String,

    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub allow_private: bool,

    /// Keyword parameters passed to `init`
    #[serde(default, deserialize_with = "crate::params::deserialize_parameters")]
    pub parameters: Parameters,

    /// Unrecognised keys are kept rather than rejected
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_module() -> String {
    DEFAULT_MODULE.to_string()
}

impl ActionRecord {
    /// Record with defaults for every optional field
    pub fn new(
        action_tag: impl Into<String>,
        contact: RawContact,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_tag: action_tag.into(),
            module: default_module(),
            contact,
            description: description.into(),
            enabled: false,
            allow_private: false,
            parameters: Parameters::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A validated action with a lazily initialized handler
pub struct ActionSpec {
    record: ActionRecord,
    contact: Contact,
    factory: Arc<dyn HandlerFactory>,
    handler: OnceCell<Arc<dyn Handler>>,
}

impl ActionSpec {
    /// Validate `record` against `catalog`.
    ///
    /// Checks run in order and stop at the first failure: contact, module
    /// lookup, `init` entry point, parameter binding. `init` is not called.
    pub fn new(record: ActionRecord, catalog: &HandlerCatalog) -> Result<Self, RegistryError> {
        let contact =
            Contact::parse(&record.contact).map_err(|source| RegistryError::InvalidContact {
                tag: record.action_tag.clone(),
                source,
            })?;

        let factory = catalog
            .check(&record.module, &record.parameters)
            .map_err(|cause| ActionConfigurationError {
                tag: record.action_tag.clone(),
                cause,
            })?;

        debug!(
            "Resolved action '{}' to module '{}'",
            record.action_tag, record.module
        );

        Ok(Self {
            record,
            contact,
            factory,
            handler: OnceCell::new(),
        })
    }

    /// Initialized handler, built on first use and cached afterwards.
    ///
    /// Errors from the module's `init` are returned as-is and nothing is
    /// cached, so a later call tries again.
    pub fn handler(&self) -> anyhow::Result<Arc<dyn Handler>> {
        self.handler
            .get_or_try_init(|| {
                debug!("Initializing handler for action '{}'", self.record.action_tag);
                self.factory.init(&self.record.parameters)
            })
            .cloned()
    }

    pub fn is_handler_initialized(&self) -> bool {
        self.handler.get().is_some()
    }

    pub fn tag(&self) -> &str {
        &self.record.action_tag
    }

    /// Lowercased tag used by the registry
    pub fn lookup_key(&self) -> String {
        self.record.action_tag.to_lowercase()
    }

    pub fn module(&self) -> &str {
        &self.record.module
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub fn description(&self) -> &str {
        &self.record.description
    }

    pub fn enabled(&self) -> bool {
        self.record.enabled
    }

    pub fn allow_private(&self) -> bool {
        self.record.allow_private
    }

    pub fn parameters(&self) -> &Parameters {
        &self.record.parameters
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.record.extra
    }

    pub fn record(&self) -> &ActionRecord {
        &self.record
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("record", &self.record)
            .field("contact", &self.contact)
            .field("handler_initialized", &self.is_handler_initialized())
            .finish_non_exhaustive()
    }
}

impl PartialEq for ActionSpec {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
    }
}
