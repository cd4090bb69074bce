use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading scripts and suites.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Unsupported {field}: \"{found}\"")]
    UnsupportedVersion { field: &'static str, found: String },

    #[error("Could not parse {context}")]
    MalformedScript {
        context: String,
        #[source]
        source: StructureError,
    },

    #[error("Step type or source \"{name}\" is not implemented")]
    NotImplemented { name: String },

    #[error("\"{name}\" does not implement {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("Script file {} not found", path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("No variable binding for '{name}' found")]
    MissingBinding { name: String },

    /// Not a failure: the document is a suite and must go through suite expansion.
    #[error("Document is a suite referencing {} script(s)", paths.len())]
    SuiteDetected { paths: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Data source \"{source_name}\" failed")]
    DataSourceFailed {
        source_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Structural defect in a JSON document.
#[derive(Error, Debug)]
pub enum StructureError {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` must be {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("JSON syntax error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("suite {} references itself", .0.display())]
    SuiteCycle(PathBuf),
}

impl ScriptError {
    pub(crate) fn malformed(context: impl Into<String>, source: StructureError) -> Self {
        ScriptError::MalformedScript {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;

/// Errors raised while running a resolved step unit.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Assertion failed: got \"{actual}\"")]
    AssertionFailed { actual: String },

    #[error("Missing step parameter: {0}")]
    MissingParameter(String),

    #[error(transparent)]
    Plugin(#[from] anyhow::Error),
}
