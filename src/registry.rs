//! Action registry
//!
//! [`Actions`] is built once from the full list of configured actions and is
//! read-only afterwards. Construction either yields a complete registry or an
//! error; there is no partially loaded state. A configuration change means
//! building a new registry and swapping it in.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::action::{ActionRecord, ActionSpec};
use crate::error::{RegistryError, UnknownTagError};
use crate::handler::HandlerCatalog;

/// Kind of non-fatal finding produced while loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Contact is still the `tbd` sentinel
    MissingContact,
}

/// Non-fatal finding about one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub tag: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validated, immutable collection of actions
#[derive(Debug)]
pub struct Actions {
    /// Entries in configuration order
    entries: Vec<Arc<ActionSpec>>,
    /// Lowercased tag → entry
    by_tag: HashMap<String, Arc<ActionSpec>>,
    diagnostics: Vec<Diagnostic>,
}

impl Actions {
    /// Build a registry from raw records.
    ///
    /// Every record is validated first (the first failing one aborts), then
    /// the list as a whole: it must be non-empty and tags must be unique
    /// ignoring case. Actions whose contact is `tbd` are reported through
    /// [`diagnostics`](Self::diagnostics) and a warning log.
    pub fn from_records(
        records: Vec<ActionRecord>,
        catalog: &HandlerCatalog,
    ) -> Result<Self, RegistryError> {
        let entries = records
            .into_iter()
            .map(|record| ActionSpec::new(record, catalog).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        if entries.is_empty() {
            return Err(RegistryError::EmptyRegistry);
        }

        let duplicated = duplicated_tags(&entries);
        if !duplicated.is_empty() {
            return Err(RegistryError::DuplicateTag { tags: duplicated });
        }

        let diagnostics: Vec<Diagnostic> = entries
            .iter()
            .filter(|action| action.contact().is_unset())
            .map(|action| Diagnostic {
                tag: action.tag().to_string(),
                kind: DiagnosticKind::MissingContact,
                message: format!("Provide contact data for `{}` action.", action.tag()),
            })
            .collect();
        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }

        let by_tag = entries
            .iter()
            .map(|action| (action.lookup_key(), Arc::clone(action)))
            .collect();

        info!(
            "Loaded {} actions ({} enabled)",
            entries.len(),
            entries.iter().filter(|a| a.enabled()).count()
        );

        Ok(Self {
            entries,
            by_tag,
            diagnostics,
        })
    }

    /// Parse a YAML sequence of action records and build the registry
    pub fn from_yaml(yaml: &str, catalog: &HandlerCatalog) -> Result<Self, RegistryError> {
        let records = parse_records(yaml)?;
        Self::from_records(records, catalog)
    }

    /// Case-insensitive lookup. `None` and unknown tags are not found.
    pub fn get(&self, tag: Option<&str>) -> Option<&ActionSpec> {
        let tag = tag.filter(|t| !t.is_empty())?;
        self.by_tag.get(&tag.to_lowercase()).map(Arc::as_ref)
    }

    /// Case-insensitive lookup that fails when the tag is not configured
    pub fn require(&self, tag: &str) -> Result<&ActionSpec, UnknownTagError> {
        self.get(Some(tag)).ok_or_else(|| UnknownTagError {
            tag: tag.to_string(),
        })
    }

    /// Like [`get`](Self::get), but returns a shared handle to the entry
    pub fn get_shared(&self, tag: Option<&str>) -> Option<Arc<ActionSpec>> {
        let tag = tag.filter(|t| !t.is_empty())?;
        self.by_tag.get(&tag.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed registry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &ActionSpec> + '_ {
        self.entries.iter().map(Arc::as_ref)
    }

    /// Lowercased tag → entry
    pub fn by_tag(&self) -> &HashMap<String, Arc<ActionSpec>> {
        &self.by_tag
    }

    /// Entries with `enabled: true`, in configuration order
    pub fn enabled(&self) -> impl Iterator<Item = &ActionSpec> + '_ {
        self.iter().filter(|action| action.enabled())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Records in configuration order, as loaded
    pub fn records(&self) -> Vec<ActionRecord> {
        self.iter().map(|action| action.record().clone()).collect()
    }

    /// Serialize the configuration back to YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.records())
    }
}

impl<'a> IntoIterator for &'a Actions {
    type Item = &'a ActionSpec;
    type IntoIter = Box<dyn Iterator<Item = &'a ActionSpec> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Parse the top-level YAML sequence without validating it
pub fn parse_records(yaml: &str) -> Result<Vec<ActionRecord>, RegistryError> {
    serde_yaml::from_str(yaml).map_err(|source| RegistryError::Parse { path: None, source })
}

/// Lowercased tags seen more than once, each listed once, in the order their
/// first repeat appears
fn duplicated_tags(entries: &[Arc<ActionSpec>]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut duplicated = Vec::new();
    for action in entries {
        let count = seen.entry(action.lookup_key()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicated.push(action.lookup_key());
        }
    }
    duplicated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::RawContact;
    use crate::error::ResolutionError;
    use crate::handler::{FnFactory, Handler};
    use crate::params::ParamSchema;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    struct Noop;

    impl Handler for Noop {
        fn handle(&self, _payload: &Value) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }
    }

    fn catalog() -> HandlerCatalog {
        let mut catalog = HandlerCatalog::with_builtins();
        catalog.register_factory(
            "tests.noop",
            Arc::new(FnFactory::new(ParamSchema::new(), |_| {
                Ok(Arc::new(Noop) as Arc<dyn Handler>)
            })),
        );
        catalog
    }

    fn action(tag: &str) -> ActionRecord {
        ActionRecord::new(
            tag,
            RawContact::One("dev@mozilla.com".to_string()),
            format!("{} action", tag),
        )
        .with_module("tests.noop")
    }

    #[test]
    fn test_two_actions() {
        let actions =
            Actions::from_records(vec![action("Foo"), action("bar")], &catalog()).unwrap();

        assert_eq!(actions.len(), 2);
        assert_eq!(actions.get(Some("foo")).map(|a| a.tag()), Some("Foo"));
        assert_eq!(actions.get(Some("bar")).map(|a| a.tag()), Some("bar"));
        assert!(actions.get(Some("baz")).is_none());
        assert!(actions.diagnostics().is_empty());
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let actions = Actions::from_records(vec![action("DevTest")], &catalog()).unwrap();
        assert_eq!(actions.get(Some("DEVTEST")), actions.get(Some("devtest")));
        assert!(actions.get(Some("devtest")).is_some());
    }

    #[test]
    fn test_lookup_none_or_empty() {
        let actions = Actions::from_records(vec![action("devtest")], &catalog()).unwrap();
        assert!(actions.get(None).is_none());
        assert!(actions.get(Some("")).is_none());
        assert!(actions.get_shared(None).is_none());
    }

    #[test]
    fn test_require_known_and_unknown_tags() {
        let actions = Actions::from_records(vec![action("DevTest")], &catalog()).unwrap();
        assert_eq!(actions.require("devtest").map(|a| a.tag()), Ok("DevTest"));

        let err = actions.require("flowstate").unwrap_err();
        assert_eq!(
            err,
            UnknownTagError {
                tag: "flowstate".to_string()
            }
        );
        assert_eq!(err.to_string(), "no action configured for tag `flowstate`");
        assert!(actions.require("").is_err());
    }

    #[test]
    fn test_non_string_contact_reported_against_its_tag() {
        for contact in ["42", "[1, 2]", "null"] {
            let yaml = format!(
                "- action_tag: devtest\n  module: tests.noop\n  contact: {}\n  description: d\n",
                contact
            );
            let err = Actions::from_yaml(&yaml, &catalog()).unwrap_err();
            assert_eq!(err.tag(), Some("devtest"), "contact `{}`", contact);
            assert!(matches!(
                err,
                RegistryError::InvalidContact {
                    source: crate::error::ContactError::InvalidType { .. },
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_named_contact_loads() {
        let yaml = r#"
- action_tag: devtest
  module: tests.noop
  contact: Dev <dev@mozilla.com>
  description: d
"#;
        let actions = Actions::from_yaml(yaml, &catalog()).unwrap();
        let contact = actions.get(Some("devtest")).unwrap().contact();
        assert_eq!(contact.addresses()[0].as_str(), "dev@mozilla.com");
        assert_eq!(
            actions.records()[0].contact,
            RawContact::One("Dev <dev@mozilla.com>".to_string())
        );
        let reloaded = Actions::from_yaml(&actions.to_yaml().unwrap(), &catalog()).unwrap();
        assert_eq!(reloaded.records(), actions.records());
    }

    #[test]
    fn test_get_shared_returns_same_entry() {
        let actions = Actions::from_records(vec![action("devtest")], &catalog()).unwrap();
        let shared = actions.get_shared(Some("DevTest")).unwrap();
        assert!(Arc::ptr_eq(&shared, &actions.by_tag()["devtest"]));
    }

    #[test]
    fn test_empty_rejected() {
        let err = Actions::from_records(vec![], &catalog()).unwrap_err();
        assert!(matches!(err, RegistryError::EmptyRegistry));
        assert_eq!(err.to_string(), "no actions configured");
    }

    #[test]
    fn test_duplicate_tags_differing_in_case() {
        let err =
            Actions::from_records(vec![action("Foo"), action("FOO")], &catalog()).unwrap_err();
        match err {
            RegistryError::DuplicateTag { tags } => assert_eq!(tags, vec!["foo".to_string()]),
            other => panic!("expected DuplicateTag, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_tags_all_reported() {
        let records = vec![
            action("a"),
            action("b"),
            action("A"),
            action("c"),
            action("B"),
            action("a"),
        ];
        match Actions::from_records(records, &catalog()).unwrap_err() {
            RegistryError::DuplicateTag { tags } => {
                assert_eq!(tags, vec!["a".to_string(), "b".to_string()])
            }
            other => panic!("expected DuplicateTag, got {:?}", other),
        }
    }

    #[test]
    fn test_first_bad_action_aborts() {
        let records = vec![
            action("good"),
            action("bad").with_module("tests.missing"),
            action("good"),
        ];
        match Actions::from_records(records, &catalog()).unwrap_err() {
            RegistryError::Action(err) => {
                assert_eq!(err.tag, "bad");
                assert!(matches!(err.cause, ResolutionError::UnknownModule { .. }));
            }
            other => panic!("expected Action error, got {:?}", other),
        }
    }

    #[test]
    fn test_unset_contact_is_a_diagnostic() {
        let mut pending = action("pending");
        pending.contact = RawContact::One("tbd".to_string());
        let actions = Actions::from_records(vec![action("ok"), pending], &catalog()).unwrap();

        assert_eq!(actions.len(), 2);
        assert_eq!(
            actions.diagnostics(),
            &[Diagnostic {
                tag: "pending".to_string(),
                kind: DiagnosticKind::MissingContact,
                message: "Provide contact data for `pending` action.".to_string(),
            }]
        );
    }

    #[test]
    fn test_iteration_keeps_configuration_order() {
        let actions = Actions::from_records(
            vec![action("zeta"), action("alpha"), action("mid").enabled(true)],
            &catalog(),
        )
        .unwrap();

        let tags: Vec<&str> = actions.iter().map(|a| a.tag()).collect();
        assert_eq!(tags, vec!["zeta", "alpha", "mid"]);

        let enabled: Vec<&str> = actions.enabled().map(|a| a.tag()).collect();
        assert_eq!(enabled, vec!["mid"]);

        let mut keys: Vec<&str> = actions.by_tag().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
        assert_eq!((&actions).into_iter().count(), 3);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
- action_tag: devtest
  contact: tbd
  description: DevTest whiteboard tag
  enabled: true
  parameters:
    whiteboard_tag: devtest
    jira_project_key: DevTest
- action_tag: flowstate
  module: tests.noop
  contact:
    - dev@mozilla.com
    - ops@mozilla.com
  description: Flowstate whiteboard tag
"#;
        let actions = Actions::from_yaml(yaml, &catalog()).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions.diagnostics().len(), 1);
        assert!(actions.get(Some("DevTest")).unwrap().enabled());
        assert!(!actions.get(Some("flowstate")).unwrap().allow_private());
    }

    #[test]
    fn test_from_yaml_rejects_non_sequence() {
        let err = Actions::from_yaml("action_tag: devtest", &catalog()).unwrap_err();
        assert!(matches!(err, RegistryError::Parse { path: None, .. }));
    }

    #[test]
    fn test_to_yaml_round_trips() {
        let actions = Actions::from_records(
            vec![action("devtest").enabled(true), action("other")],
            &catalog(),
        )
        .unwrap();
        let yaml = actions.to_yaml().unwrap();
        let reloaded = Actions::from_yaml(&yaml, &catalog()).unwrap();
        assert_eq!(reloaded.records(), actions.records());
    }
}
