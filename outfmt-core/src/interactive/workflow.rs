//! Guided multi-step workflows
//!
//! A workflow walks the user through a sequence of named steps, confirming
//! each one before running it. Optional steps may be skipped; required
//! steps may not. Each step can carry a validation closure that runs after
//! the action to verify its effect.

use super::{LineSource, ScriptedLineSource};
use crate::error::OutputError;
use parking_lot::Mutex;
use std::io::Write;
use thiserror::Error;

type StepFn = Box<dyn Fn() -> Result<(), OutputError> + Send>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow step '{step}' failed")]
    StepFailed {
        step: String,
        #[source]
        source: OutputError,
    },
    #[error("required workflow step '{step}' was skipped")]
    StepSkipped { step: String },
    #[error("workflow aborted by user")]
    Aborted,
}

pub struct WorkflowStep {
    name: String,
    required: bool,
    action: StepFn,
    validation: Option<StepFn>,
}

impl WorkflowStep {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> Result<(), OutputError> + Send + 'static,
    {
        Self {
            name: name.into(),
            required: true,
            action: Box::new(action),
            validation: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Runs after the action; a failure here fails the step.
    pub fn with_validation<F>(mut self, validation: F) -> Self
    where
        F: Fn() -> Result<(), OutputError> + Send + 'static,
    {
        self.validation = Some(Box::new(validation));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Runs steps in order, prompting before each one. Answers: `y`/empty to
/// run, `n` to skip, `q` to abort the whole workflow.
pub struct GuidedWorkflow {
    name: String,
    steps: Vec<WorkflowStep>,
    input: Mutex<Box<dyn LineSource>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl GuidedWorkflow {
    pub fn new(
        name: impl Into<String>,
        input: impl LineSource + 'static,
        output: impl Write + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            input: Mutex::new(Box::new(input)),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Non-interactive runner: every step is confirmed automatically.
    pub fn unattended(name: impl Into<String>, output: impl Write + Send + 'static) -> Self {
        // An exhausted script reads as end of input, which confirms.
        Self::new(name, ScriptedLineSource::default(), output)
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn run(&self) -> Result<(), WorkflowError> {
        let mut input = self.input.lock();
        let mut output = self.output.lock();
        let total = self.steps.len();
        let _ = writeln!(output, "workflow: {} ({total} steps)", self.name);

        for (i, step) in self.steps.iter().enumerate() {
            let tag = if step.required { "required" } else { "optional" };
            let _ = write!(
                output,
                "step {}/{}: {} ({tag}) - run? [Y/n/q]: ",
                i + 1,
                total,
                step.name
            );
            let _ = output.flush();
            let answer = match input.read_line() {
                Ok(Some(line)) => line.trim().to_ascii_lowercase(),
                Ok(None) | Err(_) => String::new(),
            };
            match answer.as_str() {
                "q" | "quit" | "abort" => return Err(WorkflowError::Aborted),
                "n" | "no" | "skip" => {
                    if step.required {
                        return Err(WorkflowError::StepSkipped {
                            step: step.name.clone(),
                        });
                    }
                    let _ = writeln!(output, "skipped: {}", step.name);
                    continue;
                }
                _ => {}
            }
            Self::run_step(step, output.as_mut())?;
        }
        let _ = writeln!(output, "workflow complete: {}", self.name);
        Ok(())
    }

    fn run_step(step: &WorkflowStep, output: &mut dyn Write) -> Result<(), WorkflowError> {
        let outcome = (step.action)().and_then(|()| match &step.validation {
            Some(validation) => validation(),
            None => Ok(()),
        });
        match outcome {
            Ok(()) => {
                let _ = writeln!(output, "done: {}", step.name);
                Ok(())
            }
            Err(source) if step.required => Err(WorkflowError::StepFailed {
                step: step.name.clone(),
                source,
            }),
            Err(source) => {
                let _ = writeln!(output, "optional step {} failed: {source}", step.name);
                Ok(())
            }
        }
    }
}
