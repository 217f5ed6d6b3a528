//! Parameter schemas for handler factories
//!
//! Each factory declares the keyword parameters its `init` accepts. The
//! registry binds an action's `parameters` bag against that declaration when
//! the configuration is loaded, so a typo in a YAML key fails at startup
//! rather than on the first webhook.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ParamError;

/// Parameter bag as written under `parameters:` in the configuration
pub type Parameters = Map<String, Value>;

/// Read a parameter bag, rejecting `.nan` and `.inf` values.
///
/// JSON has no non-finite numbers, so they would otherwise turn into `null`.
pub(crate) fn deserialize_parameters<'de, D>(deserializer: D) -> Result<Parameters, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_yaml::Mapping::deserialize(deserializer)?;
    if let Some((key, _)) = raw.iter().find(|(_, value)| has_non_finite(value)) {
        return Err(de::Error::custom(format!(
            "parameter `{}` holds a non-finite number",
            key.as_str().unwrap_or("?")
        )));
    }
    serde_yaml::from_value(serde_yaml::Value::Mapping(raw)).map_err(de::Error::custom)
}

fn has_non_finite(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Number(n) => n.is_nan() || n.is_infinite(),
        serde_yaml::Value::Sequence(items) => items.iter().any(has_non_finite),
        serde_yaml::Value::Mapping(map) => map.values().any(has_non_finite),
        serde_yaml::Value::Tagged(tagged) => has_non_finite(&tagged.value),
        _ => false,
    }
}

/// Accepted value shape for a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    String,
    Bool,
    Integer,
    Number,
    List,
    Mapping,
}

impl ParamKind {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::List => value.is_array(),
            Self::Mapping => value.is_object(),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::List => "list",
            Self::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

/// Shape name used in error messages
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// One declared keyword parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
}

/// Declared parameters of a factory's `init`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSchema {
    params: Vec<ParamSpec>,
    /// Catch-all for undeclared keys
    accepts_extra: bool,
}

impl ParamSchema {
    /// Schema that accepts no parameters at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema that accepts any keyword parameters
    pub fn any() -> Self {
        Self::new().allow_extra()
    }

    pub fn required(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    pub fn allow_extra(mut self) -> Self {
        self.accepts_extra = true;
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn accepts_extra(&self) -> bool {
        self.accepts_extra
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Check that `parameters` can be passed to `init` as keyword arguments.
    ///
    /// Missing required names are reported before unexpected names, and both
    /// before value kinds.
    pub fn bind(&self, parameters: &Parameters) -> Result<(), ParamError> {
        let missing: Vec<String> = self
            .params
            .iter()
            .filter(|p| p.required && !parameters.contains_key(&p.name))
            .map(|p| p.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(ParamError::Missing { names: missing });
        }

        if !self.accepts_extra {
            let unexpected: Vec<String> = parameters
                .keys()
                .filter(|key| self.get(key).is_none())
                .cloned()
                .collect();
            if !unexpected.is_empty() {
                return Err(ParamError::Unexpected { names: unexpected });
            }
        }

        for spec in &self.params {
            let Some(value) = parameters.get(&spec.name) else {
                continue;
            };
            if value.is_null() && !spec.required {
                continue;
            }
            if !spec.kind.accepts(value) {
                return Err(ParamError::WrongKind {
                    name: spec.name.clone(),
                    expected: spec.kind.to_string(),
                    found: describe(value).to_string(),
                });
            }
        }

        Ok(())
    }
}
