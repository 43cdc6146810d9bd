use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::prompt::PromptSet;
use crate::agent::{preview, Stage};
use crate::error::{AppError, Result};
use crate::llm::ModelClient;
use crate::workflow::state::WorkflowState;

/// Turns the summary into a step-by-step migration plan.
pub struct PlanningAgent {
    model: Arc<dyn ModelClient>,
    prompts: Arc<PromptSet>,
}

impl PlanningAgent {
    pub fn new(model: Arc<dyn ModelClient>, prompts: Arc<PromptSet>) -> Self {
        Self { model, prompts }
    }
}

#[async_trait]
impl Stage for PlanningAgent {
    fn name(&self) -> &str {
        "planning"
    }

    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        if state.summary.is_empty() {
            return Err(AppError::Stage(
                "Planning requires a summary of the source".to_string(),
            ));
        }

        tracing::info!(stage = self.name(), "Starting migration planning");

        let system = self.prompts.fill(&self.prompts.planning_system, &[]);
        let user = self.prompts.fill(
            &self.prompts.planning_user,
            &[
                ("summary", state.summary.as_str()),
                ("source_code", state.source_code.as_str()),
            ],
        );

        let plan = self.model.generate(&system, &user).await?;

        tracing::info!(stage = self.name(), chars = plan.len(), "Plan generated");
        tracing::debug!(preview = %preview(&plan, 200), "Plan preview");

        state.plan = plan;
        Ok(())
    }
}
