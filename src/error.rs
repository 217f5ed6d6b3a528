//! Error types for the action registry
//!
//! Everything that can go wrong while a configuration is loaded is a
//! [`RegistryError`]. These are startup-fatal: the registry is either built
//! completely or not at all. Failures raised later, when a handler is actually
//! initialized, are plain `anyhow::Error` values owned by the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for building an [`Actions`](crate::Actions) registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("action `{tag}` has an invalid contact: {source}")]
    InvalidContact {
        tag: String,
        #[source]
        source: ContactError,
    },

    #[error(transparent)]
    Action(#[from] ActionConfigurationError),

    #[error("no actions configured")]
    EmptyRegistry,

    #[error("actions have duplicated lookup tags: {tags:?}")]
    DuplicateTag { tags: Vec<String> },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse actions configuration{}: {source}", display_path(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_yaml::Error,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" {}", path.display()),
        None => String::new(),
    }
}

impl RegistryError {
    /// Tag of the offending action, when the failure belongs to one action
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::InvalidContact { tag, .. } => Some(tag),
            Self::Action(err) => Some(&err.tag),
            _ => None,
        }
    }
}

/// Contact field failed the email / list / sentinel union
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("`{value}` is not a valid email address")]
    InvalidEmail { value: String },

    #[error("contact list must not be empty")]
    EmptyList,

    #[error("contact must be an email address or a list of them, found {found}")]
    InvalidType { found: String },
}

/// Strict lookup of a tag that is not configured
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no action configured for tag `{tag}`")]
pub struct UnknownTagError {
    pub tag: String,
}

/// An action's module could not be turned into a handler factory
///
/// Carries the offending tag so the configuration can be fixed without
/// guessing which entry failed.
#[derive(Error, Debug)]
#[error("action `{tag}` is not properly set up: {cause}")]
pub struct ActionConfigurationError {
    pub tag: String,
    #[source]
    pub cause: ResolutionError,
}

/// Module resolution failures checked at construction time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("unknown module `{module}`")]
    UnknownModule { module: String },

    #[error("module `{module}` is missing `{entry_point}` entry point")]
    MissingEntryPoint { module: String, entry_point: String },

    #[error("parameters rejected by `{module}`: {source}")]
    InvalidParameters {
        module: String,
        #[source]
        source: ParamError,
    },
}

/// Parameter bag does not bind to a factory's declared schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("missing required parameters: {}", .names.join(", "))]
    Missing { names: Vec<String> },

    #[error("unexpected parameters: {}", .names.join(", "))]
    Unexpected { names: Vec<String> },

    #[error("parameter `{name}` expects {expected}, found {found}")]
    WrongKind {
        name: String,
        expected: String,
        found: String,
    },
}
