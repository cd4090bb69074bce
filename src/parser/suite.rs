//! Suite expansion
//!
//! A suite lists other documents (scripts or suites) and is flattened into the
//! scripts they contain, in order. With `shareState` the scripts run as a chain
//! in one execution context.

use super::{base_directory, ScriptParser};
use crate::error::{Result, ScriptError, StructureError};
use crate::script::Script;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const LOCAL: &str = "local";

/// Scripts referenced by a suite document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    #[serde(rename = "scripts")]
    pub entries: Vec<SuiteEntry>,

    #[serde(default, rename = "shareState")]
    pub share_state: bool,
}

/// One `{where, path}` reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteEntry {
    #[serde(rename = "where")]
    pub location: String,
    pub path: String,
}

impl Suite {
    pub(crate) fn from_json(object: &Map<String, Value>, context: &str) -> Result<Self> {
        let scripts = object.get("scripts").ok_or_else(|| {
            ScriptError::malformed(context, StructureError::MissingField("scripts".to_string()))
        })?;
        let entries: Vec<SuiteEntry> = serde_json::from_value(scripts.clone())
            .map_err(|e| ScriptError::malformed(context, e.into()))?;
        let share_state = match object.get("shareState") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ScriptError::malformed(
                    context,
                    StructureError::WrongType {
                        field: "shareState".to_string(),
                        expected: "a boolean",
                    },
                ))
            }
        };
        Ok(Self {
            entries,
            share_state,
        })
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.path.as_str())
    }
}

impl ScriptParser {
    /// Parse every script a suite references and chain them if requested.
    ///
    /// Fails as a whole if any referenced document fails.
    pub(crate) fn expand_suite(
        &self,
        suite: &Suite,
        suite_file: Option<&Path>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Vec<Script>> {
        let mut scripts = Vec::new();

        for entry in &suite.entries {
            if entry.location != LOCAL {
                return Err(ScriptError::NotImplemented {
                    name: format!("suite location \"{}\"", entry.location),
                });
            }

            let path = locate(&entry.path, suite_file)?;
            let canonical = path.canonicalize().map_err(|source| ScriptError::Io {
                path: path.clone(),
                source,
            })?;
            if stack.contains(&canonical) {
                return Err(ScriptError::malformed(
                    format!("suite {}", path.display()),
                    StructureError::SuiteCycle(canonical),
                ));
            }

            stack.push(canonical);
            let parsed = self.parse_file_tracked(&path, stack);
            stack.pop();
            scripts.extend(parsed?);
        }

        chain_contexts(&mut scripts, suite.share_state);
        log::info!(
            "Expanded suite into {} scripts (shared state: {})",
            scripts.len(),
            suite.share_state
        );
        Ok(scripts)
    }
}

/// Find a suite entry as given, then next to the suite file.
fn locate(path: &str, suite_file: Option<&Path>) -> Result<PathBuf> {
    let direct = PathBuf::from(path);
    if direct.exists() {
        return Ok(direct);
    }

    if let Some(suite_file) = suite_file {
        let relative = base_directory(Some(suite_file)).join(path);
        if relative.exists() {
            return Ok(relative);
        }
    }

    Err(ScriptError::ScriptNotFound { path: direct })
}

/// First script opens the context, last one closes it, the rest reuse it.
pub(crate) fn chain_contexts(scripts: &mut [Script], share_state: bool) {
    if !share_state || scripts.len() < 2 {
        return;
    }
    let last = scripts.len() - 1;
    for (index, script) in scripts.iter_mut().enumerate() {
        script.reuse_context = index > 0;
        script.close_context = index == last;
    }
}
