//! Step Type Registry
//!
//! Resolves step type names to shared execution units. Names carrying one of
//! the `assert`, `verify`, `waitFor` or `store` prefixes are decomposed into a
//! composition over a [`Getter`](super::Getter) registered under the rest of
//! the name, so `verifyTitle` and `storeTitle` both reuse the `Title` getter.

use super::{Composition, StepUnit};
use crate::catalog::{Catalog, Plugin};
use crate::error::{Result, ScriptError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const COMPOSITIONS: [Composition; 4] = [
    Composition::Assert,
    Composition::Verify,
    Composition::WaitFor,
    Composition::Store,
];

/// Name → execution unit, populated on first use and cached afterwards
#[derive(Debug)]
pub struct StepTypeRegistry {
    catalog: Arc<Catalog>,
    cache: Mutex<HashMap<String, Arc<StepUnit>>>,
}

impl StepTypeRegistry {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a step type name.
    ///
    /// Repeated calls for the same name return the same `Arc`.
    ///
    /// # Errors
    /// * `NotImplemented` if no plugin is registered for the derived identifier
    /// * `TypeMismatch` if the plugin lacks the required capability
    pub fn resolve(&self, name: &str) -> Result<Arc<StepUnit>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(unit) = cache.get(name) {
            return Ok(unit.clone());
        }

        let (composition, identifier) = decompose(name);
        log::debug!(
            "Resolving step type {} as {} ({:?})",
            name,
            identifier,
            composition
        );

        let plugin = self
            .catalog
            .instantiate(&identifier)
            .ok_or_else(|| ScriptError::NotImplemented {
                name: name.to_string(),
            })?;

        let unit = match (composition, plugin) {
            (Some(kind), Plugin::Getter(getter)) => StepUnit::Composed { kind, getter },
            (None, Plugin::Step(step_type)) => StepUnit::Raw(step_type),
            (composition, _) => {
                return Err(ScriptError::TypeMismatch {
                    name: identifier,
                    expected: if composition.is_some() {
                        "Getter"
                    } else {
                        "StepType"
                    },
                })
            }
        };

        let unit = Arc::new(unit);
        cache.insert(name.to_string(), unit.clone());
        Ok(unit)
    }

    /// Number of names resolved so far
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Split a step type name into its composition (if any) and the catalog identifier.
pub(crate) fn decompose(name: &str) -> (Option<Composition>, String) {
    let identifier = capitalize(name);
    let composition = COMPOSITIONS.into_iter().find(|kind| {
        let prefix = kind.prefix();
        name.starts_with(prefix) && !(*kind == Composition::Store && name == prefix)
    });

    match composition {
        Some(kind) => (Some(kind), identifier[kind.prefix().len()..].to_string()),
        None => (None, identifier),
    }
}

pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
