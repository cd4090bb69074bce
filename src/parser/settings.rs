//! Parser configuration

use crate::data::substitution::{DEFAULT_END_TOKEN, DEFAULT_START_TOKEN};
use crate::data::VariableResolver;
use crate::error::{Result, ScriptError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Accepted format versions and placeholder syntax
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserSettings {
    pub variable_start: String,
    pub variable_end: String,
    pub min_format_version: u64,
    pub max_format_version: u64,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            variable_start: DEFAULT_START_TOKEN.to_string(),
            variable_end: DEFAULT_END_TOKEN.to_string(),
            min_format_version: 1,
            max_format_version: 2,
        }
    }
}

impl ParserSettings {
    /// Only format version 1, as accepted by the first script reader
    pub fn legacy() -> Self {
        Self {
            max_format_version: 1,
            ..Self::default()
        }
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: ParserSettings = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| {
                ScriptError::malformed(format!("settings {}", path.display()), e.into())
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_format_version > self.max_format_version {
            return Err(ScriptError::InvalidConfig(format!(
                "format version range {}..={} is empty",
                self.min_format_version, self.max_format_version
            )));
        }
        self.variable_resolver().map(|_| ())
    }

    pub fn accepts_format(&self, version: u64) -> bool {
        (self.min_format_version..=self.max_format_version).contains(&version)
    }

    pub(crate) fn variable_resolver(&self) -> Result<VariableResolver> {
        VariableResolver::new(self.variable_start.clone(), self.variable_end.clone())
    }
}
