//! # Atom Scripts
//!
//! A script is a JSON document that builds a space and optionally carries a
//! query against it. Atoms refer to each other by *label*; a node's label
//! defaults to its name.
//!
//! ```json
//! {
//!   "types": [{ "name": "PetNode", "parents": ["ConceptNode"] }],
//!   "atoms": [
//!     { "type": "ConceptNode", "name": "cat", "tv": [0.9, 0.8] },
//!     { "type": "ConceptNode", "name": "animal" },
//!     { "label": "isa", "type": "InheritanceLink", "outgoing": ["cat", "animal"] }
//!   ],
//!   "remove": [{ "label": "isa" }],
//!   "query": {
//!     "mode": "all",
//!     "clauses": [
//!       { "link": "InheritanceLink", "outgoing": [{ "var": "$x" }, { "ref": "animal" }] }
//!     ]
//!   }
//! }
//! ```
//!
//! Pattern terms are `{"var": name, "type"?: restriction}`,
//! `{"ref": label}`, `{"node": type, "name": name}` or
//! `{"link": type, "outgoing": [terms]}`.

use atomspace_core::{
    AtomFlags, AtomSpace, AtomSpaceError, AttentionValue, Handle, MatchMode, MatchOutcome, Pattern,
    SpaceConfig, Term, TruthValue, Type, TypeRegistry,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Maximum script file size (100 MB).
const MAX_SCRIPT_FILE_SIZE: u64 = 100 * 1024 * 1024;

// =============================================================================
// SCRIPT FORMAT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Script {
    pub types: Vec<TypeSpec>,
    pub atoms: Vec<AtomSpec>,
    pub remove: Vec<RemoveSpec>,
    pub query: Option<QuerySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtomSpec {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub atom_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub outgoing: Option<Vec<String>>,
    /// `[strength, confidence]`
    #[serde(default)]
    pub tv: Option<[f32; 2]>,
    /// `[sti, lti]`
    #[serde(default)]
    pub av: Option<[i16; 2]>,
    #[serde(default)]
    pub hypothetical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSpec {
    pub label: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(default)]
    pub mode: ModeSpec,
    pub clauses: Vec<TermSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSpec {
    First,
    #[default]
    All,
}

impl From<ModeSpec> for MatchMode {
    fn from(mode: ModeSpec) -> Self {
        match mode {
            ModeSpec::First => MatchMode::First,
            ModeSpec::All => MatchMode::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermSpec {
    Var {
        var: String,
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        restriction: Option<String>,
    },
    Ref {
        #[serde(rename = "ref")]
        label: String,
    },
    Node {
        node: String,
        name: String,
    },
    Link {
        link: String,
        outgoing: Vec<TermSpec>,
    },
}

impl Script {
    pub fn from_json(text: &str) -> Result<Self, AtomSpaceError> {
        serde_json::from_str(text)
            .map_err(|e| AtomSpaceError::SerializationError(format!("Invalid script: {}", e)))
    }

    /// Read a script file after checking that it is a regular file of
    /// reasonable size.
    pub fn from_file(path: &Path) -> Result<Self, AtomSpaceError> {
        let canonical = path.canonicalize().map_err(|e| {
            AtomSpaceError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
        })?;
        if !canonical.is_file() {
            return Err(AtomSpaceError::IoError(format!(
                "Path '{}' is not a regular file",
                path.display()
            )));
        }
        let metadata = std::fs::metadata(&canonical)
            .map_err(|e| AtomSpaceError::IoError(format!("Cannot read file metadata: {}", e)))?;
        if metadata.len() > MAX_SCRIPT_FILE_SIZE {
            return Err(AtomSpaceError::SerializationError(format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_SCRIPT_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(&canonical)
            .map_err(|e| AtomSpaceError::IoError(format!("Read file: {}", e)))?;
        Self::from_json(&text)
    }

    /// Build the space described by this script.
    pub fn load(&self, config: SpaceConfig) -> Result<LoadedScript, AtomSpaceError> {
        let mut registry = TypeRegistry::new();
        for spec in &self.types {
            let parents = spec
                .parents
                .iter()
                .map(|p| resolve_type(&registry, p))
                .collect::<Result<Vec<_>, _>>()?;
            registry.register_type(&spec.name, &parents)?;
        }

        let space = AtomSpace::with_registry(Arc::new(registry), config)?;
        let mut labels: BTreeMap<String, Handle> = BTreeMap::new();

        for spec in &self.atoms {
            let label = spec.label.clone().or_else(|| spec.name.clone()).ok_or_else(|| {
                AtomSpaceError::SerializationError(format!(
                    "{} atom without a name needs a label",
                    spec.atom_type
                ))
            })?;
            let handle = add_atom(&space, &labels, spec)?;
            // Re-stating the same atom is a merge; reusing its label for
            // another atom is not.
            match labels.get(&label) {
                Some(&existing) if existing != handle => {
                    return Err(AtomSpaceError::SerializationError(format!(
                        "duplicate atom label '{}'",
                        label
                    )));
                }
                Some(_) => {}
                None => {
                    labels.insert(label, handle);
                }
            }
        }

        for spec in &self.remove {
            let handle = lookup_label(&labels, &spec.label)?;
            space.remove(handle, spec.recursive)?;
        }
        labels.retain(|_, handle| space.contains(*handle));

        let query = match &self.query {
            Some(spec) => {
                let table = space.read();
                let clauses = spec
                    .clauses
                    .iter()
                    .map(|term| build_term(table.registry(), &labels, term))
                    .collect::<Result<Vec<_>, _>>()?;
                Some((Pattern::new(clauses), MatchMode::from(spec.mode)))
            }
            None => None,
        };

        tracing::info!(
            atoms = space.len(),
            labels = labels.len(),
            has_query = query.is_some(),
            "script loaded"
        );

        Ok(LoadedScript {
            space,
            labels,
            query,
        })
    }
}

fn resolve_type(registry: &TypeRegistry, name: &str) -> Result<Type, AtomSpaceError> {
    registry
        .type_by_name(name)
        .ok_or_else(|| AtomSpaceError::SerializationError(format!("Unknown type name '{}'", name)))
}

fn lookup_label(labels: &BTreeMap<String, Handle>, label: &str) -> Result<Handle, AtomSpaceError> {
    labels
        .get(label)
        .copied()
        .ok_or_else(|| AtomSpaceError::SerializationError(format!("Unknown atom label '{}'", label)))
}

fn add_atom(
    space: &AtomSpace,
    labels: &BTreeMap<String, Handle>,
    spec: &AtomSpec,
) -> Result<Handle, AtomSpaceError> {
    let atom_type = resolve_type(space.read().registry(), &spec.atom_type)?;
    let truth = spec
        .tv
        .map(|[strength, confidence]| TruthValue::new(strength, confidence))
        .transpose()?;
    let attention = spec.av.map(|[sti, lti]| AttentionValue::new(sti, lti));

    let handle = match (&spec.name, &spec.outgoing) {
        (Some(name), None) => space.add_node(atom_type, name, truth, attention)?,
        (None, Some(outgoing)) => {
            let members = outgoing
                .iter()
                .map(|label| lookup_label(labels, label))
                .collect::<Result<Vec<_>, _>>()?;
            space.add_link(atom_type, &members, truth, attention)?
        }
        _ => {
            return Err(AtomSpaceError::SerializationError(format!(
                "{} atom needs exactly one of 'name' or 'outgoing'",
                spec.atom_type
            )));
        }
    };

    if spec.hypothetical {
        space.set_flag(handle, AtomFlags::HYPOTHETICAL, true)?;
    }
    Ok(handle)
}

fn build_term(
    registry: &TypeRegistry,
    labels: &BTreeMap<String, Handle>,
    spec: &TermSpec,
) -> Result<Term, AtomSpaceError> {
    Ok(match spec {
        TermSpec::Var { var, restriction } => match restriction {
            Some(t) => Term::typed_var(var.clone(), resolve_type(registry, t)?),
            None => Term::var(var.clone()),
        },
        TermSpec::Ref { label } => Term::ground(lookup_label(labels, label)?),
        TermSpec::Node { node, name } => Term::node(resolve_type(registry, node)?, name.clone()),
        TermSpec::Link { link, outgoing } => Term::link(
            resolve_type(registry, link)?,
            outgoing
                .iter()
                .map(|sub| build_term(registry, labels, sub))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    })
}

// =============================================================================
// LOADED SCRIPT
// =============================================================================

/// A space built from a script, plus its labels and optional query.
#[derive(Debug)]
pub struct LoadedScript {
    pub space: AtomSpace,
    pub labels: BTreeMap<String, Handle>,
    pub query: Option<(Pattern, MatchMode)>,
}

impl LoadedScript {
    /// Run the script's query, optionally forcing a mode.
    pub fn run_query(&self, mode: Option<MatchMode>) -> Result<Option<MatchOutcome>, AtomSpaceError> {
        let Some((pattern, script_mode)) = &self.query else {
            return Ok(None);
        };
        let outcome = self.space.query(pattern, mode.unwrap_or(*script_mode))?;
        tracing::info!(
            bindings = outcome.bindings.len(),
            truncated = outcome.truncated,
            steps = outcome.steps,
            "query finished"
        );
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAT_ANIMAL: &str = r#"{
        "atoms": [
            { "type": "ConceptNode", "name": "cat" },
            { "type": "ConceptNode", "name": "animal" },
            { "label": "isa", "type": "InheritanceLink", "outgoing": ["cat", "animal"] }
        ],
        "query": {
            "clauses": [
                { "link": "InheritanceLink", "outgoing": [{ "var": "$x" }, { "ref": "animal" }] }
            ]
        }
    }"#;

    #[test]
    fn parses_term_shapes() {
        let script = Script::from_json(CAT_ANIMAL).expect("parse");
        let query = script.query.expect("query");
        assert_eq!(query.mode, ModeSpec::All);
        assert!(matches!(query.clauses[0], TermSpec::Link { .. }));
    }

    #[test]
    fn loads_and_queries() {
        let loaded = Script::from_json(CAT_ANIMAL)
            .expect("parse")
            .load(SpaceConfig::default())
            .expect("load");
        assert_eq!(loaded.space.len(), 3);
        let outcome = loaded.run_query(None).expect("query").expect("has query");
        assert_eq!(outcome.bindings.len(), 1);
        assert_eq!(outcome.bindings[0].get("$x"), loaded.labels.get("cat"));
    }

    #[test]
    fn unknown_label_is_reported() {
        let text = r#"{ "atoms": [{ "type": "ListLink", "outgoing": ["ghost"] }] }"#;
        let result = Script::from_json(text).expect("parse").load(SpaceConfig::default());
        assert!(matches!(result, Err(AtomSpaceError::SerializationError(_))));
    }

    #[test]
    fn node_and_outgoing_are_exclusive() {
        let text = r#"{ "atoms": [{ "type": "ConceptNode", "name": "a", "outgoing": [] }] }"#;
        let result = Script::from_json(text).expect("parse").load(SpaceConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn label_reused_for_another_atom_is_rejected() {
        let text = r#"{ "atoms": [
            { "type": "ConceptNode", "name": "cat" },
            { "type": "ConceptNode", "name": "animal" },
            { "label": "cat", "type": "InheritanceLink", "outgoing": ["cat", "animal"] }
        ] }"#;
        let result = Script::from_json(text).expect("parse").load(SpaceConfig::default());
        assert!(matches!(
            result,
            Err(AtomSpaceError::SerializationError(msg)) if msg.contains("duplicate atom label 'cat'")
        ));
    }

    #[test]
    fn restating_an_atom_keeps_its_label() {
        let text = r#"{ "atoms": [
            { "type": "ConceptNode", "name": "cat" },
            { "type": "ConceptNode", "name": "cat", "tv": [0.5, 0.5] }
        ] }"#;
        let loaded = Script::from_json(text)
            .expect("parse")
            .load(SpaceConfig::default())
            .expect("load");
        assert_eq!(loaded.space.len(), 1);
        assert_eq!(loaded.labels.len(), 1);
    }
}
