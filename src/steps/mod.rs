//! Step Execution Units
//!
//! A step type name resolves to a [`StepUnit`]: either a plain [`StepType`]
//! implementation, or a [`Getter`] wrapped in one of the four compositions
//! (assert, verify, waitFor, store).

pub mod registry;

pub use registry::StepTypeRegistry;

use crate::error::StepError;
use crate::script::Step;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Execution state a step unit runs against
pub trait RunContext {
    /// The step currently being executed
    fn current_step(&self) -> &Step;

    /// Bind a variable for later steps
    fn set_variable(&mut self, name: &str, value: String);

    fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::default()
    }
}

/// A directly executable step (e.g. "get", "clickElement")
pub trait StepType: Send + Sync {
    /// Run the step. `Ok(false)` reports a soft failure.
    fn run(&self, ctx: &mut dyn RunContext) -> anyhow::Result<bool>;
}

/// Extracts a value from execution state (e.g. "Title" for "verifyTitle")
pub trait Getter: Send + Sync {
    fn get(&self, ctx: &mut dyn RunContext) -> anyhow::Result<String>;

    /// Step parameter holding the expected value.
    ///
    /// `None` means the getter yields a boolean ("true"/"false") that is the
    /// outcome itself.
    fn cmp_param_name(&self) -> Option<&str>;
}

/// How long a waitFor step keeps polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            attempts: 60,
            interval: Duration::from_millis(500),
        }
    }
}

/// Prefix-derived wrapper around a getter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Composition {
    Assert,
    Verify,
    WaitFor,
    Store,
}

impl Composition {
    pub fn prefix(self) -> &'static str {
        match self {
            Composition::Assert => "assert",
            Composition::Verify => "verify",
            Composition::WaitFor => "waitFor",
            Composition::Store => "store",
        }
    }
}

/// Resolved execution unit, shared by every step of the same type
pub enum StepUnit {
    Raw(Arc<dyn StepType>),
    Composed {
        kind: Composition,
        getter: Arc<dyn Getter>,
    },
}

impl StepUnit {
    pub fn composition(&self) -> Option<Composition> {
        match self {
            StepUnit::Raw(_) => None,
            StepUnit::Composed { kind, .. } => Some(*kind),
        }
    }

    /// Execute the unit against the context's current step
    pub fn run(&self, ctx: &mut dyn RunContext) -> Result<bool, StepError> {
        match self {
            StepUnit::Raw(step_type) => Ok(step_type.run(ctx)?),
            StepUnit::Composed { kind, getter } => {
                let negated = ctx.current_step().negated();
                match kind {
                    Composition::Assert => {
                        let (holds, actual) = evaluate(getter.as_ref(), ctx)?;
                        if holds == negated {
                            return Err(StepError::AssertionFailed { actual });
                        }
                        Ok(true)
                    }
                    Composition::Verify => {
                        let (holds, _) = evaluate(getter.as_ref(), ctx)?;
                        Ok(holds != negated)
                    }
                    Composition::WaitFor => {
                        let policy = ctx.wait_policy();
                        let attempts = policy.attempts.max(1);
                        for attempt in 0..attempts {
                            if attempt > 0 {
                                std::thread::sleep(policy.interval);
                            }
                            let (holds, _) = evaluate(getter.as_ref(), ctx)?;
                            if holds != negated {
                                return Ok(true);
                            }
                        }
                        log::warn!(
                            "Gave up waiting for {} after {} attempts",
                            ctx.current_step().type_name(),
                            attempts
                        );
                        Ok(false)
                    }
                    Composition::Store => {
                        let value = getter.get(ctx)?;
                        let variable = ctx
                            .current_step()
                            .string_param("variable")
                            .ok_or_else(|| StepError::MissingParameter("variable".to_string()))?
                            .to_string();
                        ctx.set_variable(&variable, value);
                        Ok(true)
                    }
                }
            }
        }
    }
}

/// Fetch via the getter and compare against the expected parameter.
fn evaluate(getter: &dyn Getter, ctx: &mut dyn RunContext) -> Result<(bool, String), StepError> {
    let actual = getter.get(ctx)?;
    let holds = match getter.cmp_param_name() {
        Some(param) => {
            let expected = ctx
                .current_step()
                .string_param(param)
                .ok_or_else(|| StepError::MissingParameter(param.to_string()))?;
            actual == expected
        }
        None => actual.eq_ignore_ascii_case("true"),
    };
    Ok((holds, actual))
}

impl fmt::Debug for StepUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepUnit::Raw(_) => f.write_str("StepUnit::Raw"),
            StepUnit::Composed { kind, .. } => write!(f, "StepUnit::Composed({:?})", kind),
        }
    }
}
