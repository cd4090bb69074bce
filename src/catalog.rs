//! Plugin Catalog
//!
//! Explicit name → factory table backing the step type and data source
//! registries. Plugins are registered at startup under their capitalized
//! identifier ("Get", "Title", "Csv", ...). A catalog may chain to a fallback
//! catalog that is consulted when a name is not registered locally.

use crate::data::DataSource;
use crate::steps::{Getter, StepType};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A freshly instantiated plugin, tagged by capability
#[derive(Clone)]
pub enum Plugin {
    Step(Arc<dyn StepType>),
    Getter(Arc<dyn Getter>),
    DataSource(Arc<dyn DataSource>),
}

impl Plugin {
    pub fn capability(&self) -> &'static str {
        match self {
            Plugin::Step(_) => "StepType",
            Plugin::Getter(_) => "Getter",
            Plugin::DataSource(_) => "DataSource",
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plugin::{}", self.capability())
    }
}

type Factory = Box<dyn Fn() -> Plugin + Send + Sync>;

#[derive(Default)]
pub struct Catalog {
    factories: HashMap<String, Factory>,
    fallback: Option<Arc<Catalog>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult `fallback` for identifiers this catalog does not register
    pub fn with_fallback(mut self, fallback: Arc<Catalog>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Register a factory under `identifier`, replacing any earlier one
    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Plugin + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        if self.factories.contains_key(&identifier) {
            log::warn!("Replacing plugin registered as {}", identifier);
        }
        self.factories.insert(identifier, Box::new(factory));
        self
    }

    pub fn register_step<T>(&mut self, identifier: impl Into<String>) -> &mut Self
    where
        T: StepType + Default + 'static,
    {
        self.register(identifier, || Plugin::Step(Arc::new(T::default())))
    }

    pub fn register_getter<T>(&mut self, identifier: impl Into<String>) -> &mut Self
    where
        T: Getter + Default + 'static,
    {
        self.register(identifier, || Plugin::Getter(Arc::new(T::default())))
    }

    pub fn register_data_source<T>(&mut self, identifier: impl Into<String>) -> &mut Self
    where
        T: DataSource + Default + 'static,
    {
        self.register(identifier, || Plugin::DataSource(Arc::new(T::default())))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
            || self
                .fallback
                .as_ref()
                .is_some_and(|fallback| fallback.contains(identifier))
    }

    /// Build a new plugin instance, or `None` if nothing is registered
    pub fn instantiate(&self, identifier: &str) -> Option<Plugin> {
        match self.factories.get(identifier) {
            Some(factory) => Some(factory()),
            None => self
                .fallback
                .as_ref()
                .and_then(|fallback| fallback.instantiate(identifier)),
        }
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("Catalog")
            .field("plugins", &names)
            .field("fallback", &self.fallback)
            .finish()
    }
}
