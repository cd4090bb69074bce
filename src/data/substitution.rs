//! Variable substitution for literal step parameters.

use crate::error::{Result, ScriptError};
use crate::script::DataRow;

pub const DEFAULT_START_TOKEN: &str = "${";
pub const DEFAULT_END_TOKEN: &str = "}";

/// Replaces `${name}` placeholders with the first binding found in a script's rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableResolver {
    start: String,
    end: String,
}

impl Default for VariableResolver {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_TOKEN.to_string(),
            end: DEFAULT_END_TOKEN.to_string(),
        }
    }
}

impl VariableResolver {
    /// Use custom placeholder delimiters. Both must be non-empty.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self> {
        let (start, end) = (start.into(), end.into());
        if start.is_empty() {
            return Err(ScriptError::InvalidConfig(
                "Invalid start token for a variable found".to_string(),
            ));
        }
        if end.is_empty() {
            return Err(ScriptError::InvalidConfig(
                "Invalid end token for a variable found".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start_token(&self) -> &str {
        &self.start
    }

    pub fn end_token(&self) -> &str {
        &self.end
    }

    /// Substitute every placeholder in `value`.
    ///
    /// Rows are searched in order and the first row binding the name wins.
    /// Replacement text is not scanned again. A start token without a matching
    /// end token is kept as literal text.
    pub fn resolve(&self, value: &str, rows: &[DataRow]) -> Result<String> {
        let mut resolved = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find(&self.start) {
            let after_start = &rest[start + self.start.len()..];
            let Some(end) = after_start.find(&self.end) else {
                break;
            };

            let name = &after_start[..end];
            let binding = rows
                .iter()
                .find_map(|row| row.get(name))
                .ok_or_else(|| ScriptError::MissingBinding {
                    name: name.to_string(),
                })?;

            resolved.push_str(&rest[..start]);
            resolved.push_str(binding);
            rest = &after_start[end + self.end.len()..];
        }

        resolved.push_str(rest);
        Ok(resolved)
    }
}
