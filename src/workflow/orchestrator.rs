use std::sync::Arc;

use crate::agent::prompt::PromptSet;
use crate::agent::{PlanningAgent, Stage, SummaryAgent, TranspileAgent};
use crate::error::Result;
use crate::llm::ModelClient;
use crate::validate::Validator;
use crate::workflow::state::WorkflowState;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Summarizing,
    Planning,
    Translating,
    Done,
}

/// Decision taken after every translate/repair attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Continue,
    Terminate,
}

/// Retry while the last candidate failed and budget remains.
pub fn route(state: &WorkflowState, max_iterations: u32) -> Route {
    if !state.last_validation.is_ok() && state.iteration_count < max_iterations {
        Route::Continue
    } else {
        Route::Terminate
    }
}

impl Phase {
    /// Transition taken once the stage for `self` has run.
    pub fn next(self, state: &WorkflowState, max_iterations: u32) -> Phase {
        match self {
            Phase::Summarizing => Phase::Planning,
            Phase::Planning => Phase::Translating,
            Phase::Translating => match route(state, max_iterations) {
                Route::Continue => Phase::Translating,
                Route::Terminate => Phase::Done,
            },
            Phase::Done => Phase::Done,
        }
    }
}

/// Drives a [`WorkflowState`] through summary, planning and the bounded
/// translate/repair loop.
pub struct Orchestrator {
    summary: Box<dyn Stage>,
    planning: Box<dyn Stage>,
    transpile: Box<dyn Stage>,
    max_iterations: u32,
}

impl Orchestrator {
    /// `max_iterations` below 1 is raised to 1: the first translation always runs.
    pub fn new(
        summary: Box<dyn Stage>,
        planning: Box<dyn Stage>,
        transpile: Box<dyn Stage>,
        max_iterations: u32,
    ) -> Self {
        Self {
            summary,
            planning,
            transpile,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Wire the standard agents around shared collaborators.
    pub fn with_agents(
        model: Arc<dyn ModelClient>,
        validator: Arc<dyn Validator>,
        prompts: Arc<PromptSet>,
        max_iterations: u32,
    ) -> Result<Self> {
        let summary = SummaryAgent::new(Arc::clone(&model), Arc::clone(&prompts));
        let planning = PlanningAgent::new(Arc::clone(&model), Arc::clone(&prompts));
        let transpile = TranspileAgent::new(model, validator, prompts)?;

        Ok(Self::new(
            Box::new(summary),
            Box::new(planning),
            Box::new(transpile),
            max_iterations,
        ))
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    fn stage_for(&self, phase: Phase) -> Option<&dyn Stage> {
        match phase {
            Phase::Summarizing => Some(self.summary.as_ref()),
            Phase::Planning => Some(self.planning.as_ref()),
            Phase::Translating => Some(self.transpile.as_ref()),
            Phase::Done => None,
        }
    }

    /// Run to completion. Exhausting the retry budget is not an error: the
    /// returned state carries the failing validation for the caller to
    /// inspect. Collaborator errors abort the run.
    pub async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let mut phase = Phase::Summarizing;

        tracing::info!(max_iterations = self.max_iterations, "Starting workflow");

        while let Some(stage) = self.stage_for(phase) {
            stage.run(&mut state).await?;
            let next = phase.next(&state, self.max_iterations);
            tracing::debug!(from = ?phase, to = ?next, "Phase transition");
            phase = next;
        }

        tracing::info!(
            iterations = state.iteration_count,
            code = state.last_validation.code,
            "Workflow finished"
        );

        Ok(state)
    }
}
