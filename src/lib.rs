pub mod catalog;
pub mod data;
pub mod error;
pub mod parser;
pub mod script;
pub mod steps;

//  Re-export commonly used items
pub use catalog::{Catalog, Plugin};
pub use data::{DataSource, DataSourceRegistry, VariableResolver};
pub use error::{Result, ScriptError, StepError, StructureError};
pub use parser::{Document, ParserSettings, ScriptParser, Suite, SuiteEntry};
pub use script::{DataRow, Locator, Script, Step};
pub use steps::{Composition, Getter, RunContext, StepType, StepTypeRegistry, StepUnit, WaitPolicy};
