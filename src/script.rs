//! Script Types
//!
//! The object graph produced by the parser: scripts, their steps and locators.

use crate::steps::StepUnit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One row of variable bindings supplied by a data source
pub type DataRow = HashMap<String, String>;

/// A parsed script, ready to hand to an execution layer
#[derive(Debug, Clone)]
pub struct Script {
    name: Option<String>,
    steps: Vec<Step>,
    data_rows: Vec<DataRow>,
    pub(crate) close_context: bool,
    pub(crate) reuse_context: bool,
}

impl Script {
    pub(crate) fn new(name: Option<String>) -> Self {
        Self {
            name,
            steps: Vec::new(),
            data_rows: Vec::new(),
            close_context: true,
            reuse_context: false,
        }
    }

    pub(crate) fn set_data_rows(&mut self, rows: Vec<DataRow>) {
        self.data_rows = rows;
    }

    pub(crate) fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Path the script was loaded from, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Rows consulted left to right when substituting variables
    pub fn data_rows(&self) -> &[DataRow] {
        &self.data_rows
    }

    /// Whether the execution context should be closed once this script finishes
    pub fn close_context(&self) -> bool {
        self.close_context
    }

    /// Whether this script continues in the context left open by the previous script
    pub fn reuse_context(&self) -> bool {
        self.reuse_context
    }
}

/// A single step with its resolved execution unit and parameters
#[derive(Debug, Clone)]
pub struct Step {
    type_name: String,
    unit: Arc<StepUnit>,
    negated: bool,
    string_params: HashMap<String, String>,
    locator_params: HashMap<String, Locator>,
}

impl Step {
    pub fn new(type_name: impl Into<String>, unit: Arc<StepUnit>, negated: bool) -> Self {
        Self {
            type_name: type_name.into(),
            unit,
            negated,
            string_params: HashMap::new(),
            locator_params: HashMap::new(),
        }
    }

    /// Store a literal parameter, displacing any locator under the same name
    pub fn with_string_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.locator_params.remove(&name);
        self.string_params.insert(name, value.into());
        self
    }

    /// Store a locator parameter, displacing any literal under the same name
    pub fn with_locator_param(mut self, name: impl Into<String>, locator: Locator) -> Self {
        let name = name.into();
        self.string_params.remove(&name);
        self.locator_params.insert(name, locator);
        self
    }

    /// Step type name as written in the document (e.g. "verifyTitle")
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn unit(&self) -> &Arc<StepUnit> {
        &self.unit
    }

    pub fn negated(&self) -> bool {
        self.negated
    }

    pub fn string_param(&self, name: &str) -> Option<&str> {
        self.string_params.get(name).map(String::as_str)
    }

    pub fn locator_param(&self, name: &str) -> Option<&Locator> {
        self.locator_params.get(name)
    }

    pub fn string_params(&self) -> &HashMap<String, String> {
        &self.string_params
    }

    pub fn locator_params(&self) -> &HashMap<String, Locator> {
        &self.locator_params
    }
}

/// Element locator: a strategy such as "id" or "xpath" plus its value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    #[serde(rename = "type")]
    strategy: String,
    value: String,
}

impl Locator {
    pub fn new(strategy: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            value: value.into(),
        }
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{RunContext, StepType};

    struct Noop;

    impl StepType for Noop {
        fn run(&self, _ctx: &mut dyn RunContext) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_param_maps_are_exclusive() {
        let unit = Arc::new(StepUnit::Raw(Arc::new(Noop)));
        let step = Step::new("clickElement", unit, false)
            .with_string_param("locator", "literal")
            .with_locator_param("locator", Locator::new("id", "submit"));

        assert_eq!(step.string_param("locator"), None);
        assert_eq!(
            step.locator_param("locator"),
            Some(&Locator::new("id", "submit"))
        );

        let step = step.with_string_param("locator", "again");
        assert!(step.locator_params().is_empty());
        assert_eq!(step.string_param("locator"), Some("again"));
    }

    #[test]
    fn test_locator_uses_document_field_names() {
        let locator: Locator =
            serde_json::from_value(serde_json::json!({"type": "css", "value": "#main"})).unwrap();
        assert_eq!(locator.strategy(), "css");
        assert_eq!(locator.value(), "#main");

        let json = serde_json::to_value(&locator).unwrap();
        assert_eq!(json, serde_json::json!({"type": "css", "value": "#main"}));
    }

    #[test]
    fn test_new_script_is_independent() {
        let script = Script::new(None);
        assert!(script.close_context());
        assert!(!script.reuse_context());
        assert!(script.steps().is_empty());
    }
}
