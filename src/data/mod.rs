//! Data-driven scripts
//!
//! Data sources are external collaborators producing rows of variable bindings.
//! The core only resolves them by name and feeds their rows to the
//! [`VariableResolver`].

pub mod substitution;

pub use substitution::VariableResolver;

use crate::catalog::{Catalog, Plugin};
use crate::error::{Result, ScriptError};
use crate::script::DataRow;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Producer of ordered variable rows
pub trait DataSource: Send + Sync {
    /// Produce rows for a script.
    ///
    /// `base_dir` is the directory of the script file, for sources that read
    /// files relative to it.
    fn rows(&self, config: &HashMap<String, String>, base_dir: &Path)
        -> anyhow::Result<Vec<DataRow>>;
}

/// Source name → data source, resolved once per name
pub struct DataSourceRegistry {
    catalog: Arc<Catalog>,
    cache: Mutex<HashMap<String, Arc<dyn DataSource>>>,
}

impl DataSourceRegistry {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the source registered for `name` ("csv" → "Csv").
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn DataSource>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(source) = cache.get(name) {
            return Ok(source.clone());
        }

        let identifier = normalize(name);
        let source = match self.catalog.instantiate(&identifier) {
            Some(Plugin::DataSource(source)) => source,
            Some(_) => {
                return Err(ScriptError::TypeMismatch {
                    name: identifier,
                    expected: "DataSource",
                })
            }
            None => {
                return Err(ScriptError::NotImplemented {
                    name: name.to_string(),
                })
            }
        };

        cache.insert(name.to_string(), source.clone());
        Ok(source)
    }

    /// Resolve `name` and fetch its rows
    pub fn rows(
        &self,
        name: &str,
        config: &HashMap<String, String>,
        base_dir: &Path,
    ) -> Result<Vec<DataRow>> {
        let source = self.resolve(name)?;
        let rows = source
            .rows(config, base_dir)
            .map_err(|e| ScriptError::DataSourceFailed {
                source_name: name.to_string(),
                source: e.into(),
            })?;
        log::debug!("Data source {} produced {} rows", name, rows.len());
        Ok(rows)
    }
}

impl fmt::Debug for DataSourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&String> = cache.keys().collect();
        names.sort();
        f.debug_struct("DataSourceRegistry")
            .field("catalog", &self.catalog)
            .field("resolved", &names)
            .finish()
    }
}

/// First letter upper-cased, the rest lower-cased.
fn normalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
