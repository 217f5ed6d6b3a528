//! Action registry for the Jira/Bugzilla integration
//!
//! The actions file lists every whiteboard action the webhook service can
//! dispatch to. Loading it validates each entry against the set of handler
//! modules compiled into the application, then the list as a whole:
//!
//! - each contact is an email, a non-empty list of emails, or `tbd`
//! - each `module` is registered and exposes an `init` entry point
//! - each `parameters` bag binds to that entry point's declared schema
//! - at least one action exists and tags are unique ignoring case
//!
//! The resulting [`Actions`] is immutable and safe to share between threads.
//! Handlers are initialized on first use and cached per action.
//!
//! # Example
//!
//! ```yaml
//! - action_tag: devtest
//!   contact: tbd
//!   description: DevTest whiteboard tag
//!   enabled: true
//!   parameters:
//!     whiteboard_tag: devtest
//!     jira_project_key: DevTest
//! ```

pub mod action;
pub mod builtin;
pub mod config;
pub mod contact;
pub mod error;
pub mod handler;
pub mod params;
pub mod registry;

pub use action::{ActionRecord, ActionSpec};
pub use builtin::{DefaultHandler, DEFAULT_MODULE};
pub use config::{load_actions_file, load_records, ActionsConfigLoader};
pub use contact::{Contact, EmailAddress, RawContact, UNSET_CONTACT};
pub use error::{
    ActionConfigurationError, ContactError, ParamError, RegistryError, ResolutionError,
    UnknownTagError,
};
pub use handler::{
    FnFactory, Handler, HandlerCatalog, HandlerFactory, HandlerModule, INIT_ENTRY_POINT,
};
pub use params::{ParamKind, ParamSchema, ParamSpec, Parameters};
pub use registry::{parse_records, Actions, Diagnostic, DiagnosticKind};
