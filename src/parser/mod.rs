//! Script Document Parser
//!
//! Turns Selenium Builder style JSON documents into [`Script`]s. Suite
//! documents are expanded into the scripts they reference (see [`suite`]).
//!
//! ```json
//! {
//!   "seleniumVersion": "2",
//!   "formatVersion": 2,
//!   "data": {"source": "csv", "configs": {"csv": {"path": "users.csv"}}},
//!   "steps": [
//!     {"type": "get", "url": "https://example.com/${user}"},
//!     {"type": "verifyText", "locator": {"type": "id", "value": "name"}, "text": "${user}"}
//!   ]
//! }
//! ```

pub mod settings;
pub mod suite;

pub use settings::ParserSettings;
pub use suite::{Suite, SuiteEntry};

use crate::data::{DataSourceRegistry, VariableResolver};
use crate::error::{Result, ScriptError, StructureError};
use crate::script::{DataRow, Locator, Script, Step};
use crate::steps::StepTypeRegistry;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SELENIUM_VERSION: &str = "2";

/// A parsed top-level document
#[derive(Debug)]
pub enum Document {
    Script(Script),
    Suite(Suite),
}

/// Parses scripts and suites, resolving step types and data sources by name
#[derive(Debug, Clone)]
pub struct ScriptParser {
    settings: ParserSettings,
    resolver: VariableResolver,
    step_types: Arc<StepTypeRegistry>,
    data_sources: Arc<DataSourceRegistry>,
}

impl ScriptParser {
    /// Create a parser with default settings
    pub fn new(step_types: Arc<StepTypeRegistry>, data_sources: Arc<DataSourceRegistry>) -> Self {
        Self {
            settings: ParserSettings::default(),
            resolver: VariableResolver::default(),
            step_types,
            data_sources,
        }
    }

    pub fn with_settings(mut self, settings: ParserSettings) -> Result<Self> {
        settings.validate()?;
        self.resolver = settings.variable_resolver()?;
        self.settings = settings;
        Ok(self)
    }

    /// Change the placeholder delimiters (default `${` and `}`)
    pub fn with_variable_tokens(
        mut self,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Result<Self> {
        self.resolver = VariableResolver::new(start, end)?;
        self.settings.variable_start = self.resolver.start_token().to_string();
        self.settings.variable_end = self.resolver.end_token().to_string();
        Ok(self)
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    pub fn step_types(&self) -> &StepTypeRegistry {
        &self.step_types
    }

    /// Parse a script or suite document.
    ///
    /// A script yields one entry; a suite yields the flattened scripts it
    /// references. `source` is the file the document came from; suite paths
    /// and data files are resolved relative to its directory.
    pub fn parse(&self, document: &Value, source: Option<&Path>) -> Result<Vec<Script>> {
        let mut stack = Vec::new();
        self.parse_tracked(document, source, &mut stack)
    }

    pub fn parse_str(&self, json: &str, source: Option<&Path>) -> Result<Vec<Script>> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| ScriptError::malformed(describe(source), e.into()))?;
        self.parse(&document, source)
    }

    pub fn parse_reader<R: Read>(&self, reader: R, source: Option<&Path>) -> Result<Vec<Script>> {
        let document: Value = serde_json::from_reader(reader)
            .map_err(|e| ScriptError::malformed(describe(source), e.into()))?;
        self.parse(&document, source)
    }

    /// Load and parse a script or suite file
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Script>> {
        let mut stack = Vec::new();
        self.parse_file_tracked(path, &mut stack)
    }

    /// Parse a single script.
    ///
    /// # Errors
    /// * `SuiteDetected` if the document is a suite; the error carries the
    ///   referenced paths so the caller can process them
    pub fn parse_script(&self, document: &Value, source: Option<&Path>) -> Result<Script> {
        match self.parse_document(document, source)? {
            Document::Script(script) => Ok(script),
            Document::Suite(suite) => Err(ScriptError::SuiteDetected {
                paths: suite.paths().map(str::to_string).collect(),
            }),
        }
    }

    /// Check versions and build either a script or an unexpanded suite
    pub fn parse_document(&self, document: &Value, source: Option<&Path>) -> Result<Document> {
        let context = describe(source);
        let object = document.as_object().ok_or_else(|| {
            ScriptError::malformed(
                &context,
                StructureError::WrongType {
                    field: "document".to_string(),
                    expected: "an object",
                },
            )
        })?;

        self.check_versions(object, &context)?;

        match object.get("type").and_then(Value::as_str) {
            Some("suite") => Ok(Document::Suite(Suite::from_json(object, &context)?)),
            _ => Ok(Document::Script(self.build_script(object, source, &context)?)),
        }
    }

    pub(crate) fn parse_file_tracked(
        &self,
        path: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Vec<Script>> {
        let document: Value = {
            let file = File::open(path).map_err(|source| ScriptError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_reader(BufReader::new(file))
                .map_err(|e| ScriptError::malformed(describe(Some(path)), e.into()))?
        };
        self.parse_tracked(&document, Some(path), stack)
    }

    fn parse_tracked(
        &self,
        document: &Value,
        source: Option<&Path>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Vec<Script>> {
        match self.parse_document(document, source)? {
            Document::Script(script) => Ok(vec![script]),
            Document::Suite(suite) => self.expand_suite(&suite, source, stack),
        }
    }

    fn check_versions(&self, object: &Map<String, Value>, context: &str) -> Result<()> {
        let selenium = required(object, "seleniumVersion", context)?;
        if selenium.as_str() != Some(SELENIUM_VERSION) {
            return Err(ScriptError::UnsupportedVersion {
                field: "Selenium version",
                found: display_value(selenium),
            });
        }

        let format = required(object, "formatVersion", context)?;
        // Integral floats count as integers; other numbers are simply unsupported
        let version = match format {
            Value::Number(n) => integral(n.as_i64(), n.as_f64()),
            Value::String(s) => {
                let s = s.trim();
                match (s.parse::<i64>(), s.parse::<f64>()) {
                    (Ok(v), _) => Some(v),
                    (Err(_), Ok(f)) => integral(None, Some(f)),
                    _ => return Err(wrong_type(context, "formatVersion", "an integer")),
                }
            }
            _ => return Err(wrong_type(context, "formatVersion", "an integer")),
        };

        let accepted = version
            .and_then(|v| u64::try_from(v).ok())
            .is_some_and(|v| self.settings.accepts_format(v));
        if !accepted {
            return Err(ScriptError::UnsupportedVersion {
                field: "Selenium script format version",
                found: display_value(format),
            });
        }
        Ok(())
    }

    fn build_script(
        &self,
        object: &Map<String, Value>,
        source: Option<&Path>,
        context: &str,
    ) -> Result<Script> {
        let steps = required(object, "steps", context)?
            .as_array()
            .ok_or_else(|| wrong_type(context, "steps", "an array"))?;

        let mut script = Script::new(source.map(|p| p.display().to_string()));

        // Rows must be attached before any step parameter is substituted
        if let Some(data) = object.get("data") {
            script.set_data_rows(self.load_data(data, source, context)?);
        }

        for (index, step) in steps.iter().enumerate() {
            let step = self.build_step(step, index, script.data_rows(), context)?;
            script.push_step(step);
        }

        log::info!(
            "Parsed {} with {} steps and {} data rows",
            context,
            script.steps().len(),
            script.data_rows().len()
        );
        Ok(script)
    }

    fn load_data(
        &self,
        data: &Value,
        source: Option<&Path>,
        context: &str,
    ) -> Result<Vec<DataRow>> {
        let data = data
            .as_object()
            .ok_or_else(|| wrong_type(context, "data", "an object"))?;
        let source_name = required(data, "source", context)?
            .as_str()
            .ok_or_else(|| wrong_type(context, "data.source", "a string"))?;

        let mut config = HashMap::new();
        let configs = match data.get("configs") {
            None | Some(Value::Null) => None,
            Some(Value::Object(configs)) => Some(configs),
            Some(_) => return Err(wrong_type(context, "data.configs", "an object")),
        };
        let source_config = configs.and_then(|configs| configs.get(source_name));
        if let Some(source_config) = source_config {
            let field = format!("data.configs.{}", source_name);
            let source_config = source_config
                .as_object()
                .ok_or_else(|| wrong_type(context, &field, "an object"))?;
            for (key, value) in source_config {
                let value = scalar_text(value)
                    .ok_or_else(|| wrong_type(context, &format!("{}.{}", field, key), "a string"))?;
                config.insert(key.clone(), value);
            }
        }

        self.data_sources
            .rows(source_name, &config, &base_directory(source))
    }

    fn build_step(
        &self,
        value: &Value,
        index: usize,
        rows: &[DataRow],
        context: &str,
    ) -> Result<Step> {
        let field = format!("steps[{}]", index);
        let object = value
            .as_object()
            .ok_or_else(|| wrong_type(context, &field, "an object"))?;

        let type_name = required(object, "type", context)
            .map_err(|_| missing(context, &format!("{}.type", field)))?
            .as_str()
            .ok_or_else(|| wrong_type(context, &format!("{}.type", field), "a string"))?;
        let negated = match object.get("negated") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(wrong_type(
                    context,
                    &format!("{}.negated", field),
                    "a boolean",
                ))
            }
        };

        let unit = self.step_types.resolve(type_name)?;
        let mut step = Step::new(type_name, unit, negated);

        for (key, param) in object {
            if key == "type" || key == "negated" {
                continue;
            }
            let param_field = format!("{}.{}", field, key);
            step = match param {
                Value::Object(locator) => {
                    let strategy = locator.get("type").and_then(Value::as_str);
                    let locator_value = locator.get("value").and_then(Value::as_str);
                    match (strategy, locator_value) {
                        (Some(strategy), Some(locator_value)) => {
                            step.with_locator_param(key, Locator::new(strategy, locator_value))
                        }
                        _ => {
                            return Err(wrong_type(
                                context,
                                &param_field,
                                "a locator with string `type` and `value`",
                            ))
                        }
                    }
                }
                other => {
                    let literal = scalar_text(other).ok_or_else(|| {
                        wrong_type(context, &param_field, "a string or a locator")
                    })?;
                    step.with_string_param(key, self.resolver.resolve(&literal, rows)?)
                }
            };
        }

        Ok(step)
    }
}

fn describe(source: Option<&Path>) -> String {
    match source {
        Some(path) => format!("script {}", path.display()),
        None => "script".to_string(),
    }
}

/// Directory data sources and suite entries are resolved against.
pub(crate) fn base_directory(source: Option<&Path>) -> PathBuf {
    match source.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn required<'a>(object: &'a Map<String, Value>, field: &str, context: &str) -> Result<&'a Value> {
    object.get(field).ok_or_else(|| missing(context, field))
}

fn missing(context: &str, field: &str) -> ScriptError {
    ScriptError::malformed(context, StructureError::MissingField(field.to_string()))
}

fn wrong_type(context: &str, field: &str, expected: &'static str) -> ScriptError {
    ScriptError::malformed(
        context,
        StructureError::WrongType {
            field: field.to_string(),
            expected,
        },
    )
}

/// Literal text of a string, number or boolean value
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integral(int: Option<i64>, float: Option<f64>) -> Option<i64> {
    int.or_else(|| {
        float
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
