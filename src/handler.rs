//! Handler factory registry
//!
//! Configuration names an implementation by a module reference string. The
//! application registers every module it ships in a [`HandlerCatalog`] at
//! startup; an action's `module` is resolved against that catalog instead of
//! being loaded dynamically.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ResolutionError;
use crate::params::{ParamSchema, Parameters};

/// Name of the entry point every module must expose
pub const INIT_ENTRY_POINT: &str = "init";

/// Ready-to-invoke action implementation
pub trait Handler: Send + Sync {
    /// Run the action against an incoming event payload
    fn handle(&self, payload: &Value) -> anyhow::Result<Value>;
}

/// The `init` entry point of a module
pub trait HandlerFactory: Send + Sync {
    /// Keyword parameters accepted by [`init`](Self::init)
    fn schema(&self) -> &ParamSchema;

    /// Build a handler. Only called once the parameters have been bound.
    fn init(&self, parameters: &Parameters) -> anyhow::Result<Arc<dyn Handler>>;
}

type InitFn = dyn Fn(&Parameters) -> anyhow::Result<Arc<dyn Handler>> + Send + Sync;

/// Factory backed by a closure
pub struct FnFactory {
    schema: ParamSchema,
    init: Box<InitFn>,
}

impl FnFactory {
    pub fn new<F>(schema: ParamSchema, init: F) -> Self
    where
        F: Fn(&Parameters) -> anyhow::Result<Arc<dyn Handler>> + Send + Sync + 'static,
    {
        Self {
            schema,
            init: Box::new(init),
        }
    }
}

impl HandlerFactory for FnFactory {
    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    fn init(&self, parameters: &Parameters) -> anyhow::Result<Arc<dyn Handler>> {
        (self.init)(parameters)
    }
}

impl fmt::Debug for FnFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// A named implementation unit
///
/// A module may be declared without an `init` entry point, e.g. while its
/// implementation is still being written. Actions pointing at it fail to load.
#[derive(Clone)]
pub struct HandlerModule {
    name: String,
    init: Option<Arc<dyn HandlerFactory>>,
}

impl HandlerModule {
    pub fn new(name: impl Into<String>, init: Arc<dyn HandlerFactory>) -> Self {
        Self {
            name: name.into(),
            init: Some(init),
        }
    }

    pub fn declared(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            init: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn init(&self) -> Option<&Arc<dyn HandlerFactory>> {
        self.init.as_ref()
    }
}

impl fmt::Debug for HandlerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerModule")
            .field("name", &self.name)
            .field("has_init", &self.init.is_some())
            .finish()
    }
}

/// Closed set of modules an action may reference
#[derive(Debug, Clone, Default)]
pub struct HandlerCatalog {
    modules: HashMap<String, HandlerModule>,
}

impl HandlerCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with the built-in whiteboard modules
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        crate::builtin::register_builtins(&mut catalog);
        catalog
    }

    /// Register a module, replacing any module with the same name
    pub fn register(&mut self, module: HandlerModule) {
        if self.modules.contains_key(module.name()) {
            tracing::debug!("Replacing handler module '{}'", module.name());
        }
        self.modules.insert(module.name().to_string(), module);
    }

    /// Register a factory as the `init` entry point of `name`
    pub fn register_factory(&mut self, name: impl Into<String>, factory: Arc<dyn HandlerFactory>) {
        self.register(HandlerModule::new(name, factory));
    }

    /// Reserve a module name that has no entry point yet
    pub fn declare(&mut self, name: impl Into<String>) {
        self.register(HandlerModule::declared(name));
    }

    pub fn contains(&self, module_ref: &str) -> bool {
        self.modules.contains_key(module_ref)
    }

    /// Registered module names, sorted
    pub fn module_refs(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Find the `init` entry point of `module_ref`
    pub fn resolve(&self, module_ref: &str) -> Result<Arc<dyn HandlerFactory>, ResolutionError> {
        let module = self
            .modules
            .get(module_ref)
            .ok_or_else(|| ResolutionError::UnknownModule {
                module: module_ref.to_string(),
            })?;

        module
            .init()
            .cloned()
            .ok_or_else(|| ResolutionError::MissingEntryPoint {
                module: module_ref.to_string(),
                entry_point: INIT_ENTRY_POINT.to_string(),
            })
    }

    /// Resolve `module_ref` and bind `parameters` against its schema.
    ///
    /// Does not call `init`.
    pub fn check(
        &self,
        module_ref: &str,
        parameters: &Parameters,
    ) -> Result<Arc<dyn HandlerFactory>, ResolutionError> {
        let factory = self.resolve(module_ref)?;
        factory
            .schema()
            .bind(parameters)
            .map_err(|source| ResolutionError::InvalidParameters {
                module: module_ref.to_string(),
                source,
            })?;
        Ok(factory)
    }
}
