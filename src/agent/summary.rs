use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::prompt::PromptSet;
use crate::agent::{preview, Stage};
use crate::error::{AppError, Result};
use crate::llm::ModelClient;
use crate::workflow::state::WorkflowState;

/// Produces a technical summary of the source program.
pub struct SummaryAgent {
    model: Arc<dyn ModelClient>,
    prompts: Arc<PromptSet>,
}

impl SummaryAgent {
    pub fn new(model: Arc<dyn ModelClient>, prompts: Arc<PromptSet>) -> Self {
        Self { model, prompts }
    }
}

#[async_trait]
impl Stage for SummaryAgent {
    fn name(&self) -> &str {
        "summary"
    }

    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        if state.source_code.trim().is_empty() {
            return Err(AppError::Stage("No source code to summarize".to_string()));
        }

        tracing::info!(stage = self.name(), "Starting code summarization");

        let system = self.prompts.fill(&self.prompts.summary_system, &[]);
        let user = self.prompts.fill(
            &self.prompts.summary_user,
            &[("source_code", state.source_code.as_str())],
        );

        let summary = self.model.generate(&system, &user).await?;

        tracing::info!(stage = self.name(), chars = summary.len(), "Summary generated");
        tracing::debug!(preview = %preview(&summary, 200), "Summary preview");

        state.summary = summary;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedModel;
    use crate::config::WorkflowConfig;

    fn prompts() -> Arc<PromptSet> {
        Arc::new(PromptSet::from_config(&WorkflowConfig::default()))
    }

    #[tokio::test]
    async fn test_writes_summary_from_source() {
        let model = Arc::new(ScriptedModel::new(["**Overview** - a calculator"]));
        let agent = SummaryAgent::new(model.clone(), prompts());
        let mut state = WorkflowState::new("public class Calculator {}");

        agent.run(&mut state).await.unwrap();

        assert_eq!(state.summary, "**Overview** - a calculator");
        assert!(model.user_message(0).contains("public class Calculator {}"));
        assert!(state.plan.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_empty_source() {
        let model = Arc::new(ScriptedModel::new(["unused"]));
        let agent = SummaryAgent::new(model.clone(), prompts());
        let mut state = WorkflowState::new("  ");

        let err = agent.run(&mut state).await.unwrap_err();
        assert!(matches!(err, AppError::Stage(_)));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = Arc::new(ScriptedModel::failing(AppError::ModelTimeout(300)));
        let agent = SummaryAgent::new(model, prompts());
        let mut state = WorkflowState::new("class A {}");

        let err = agent.run(&mut state).await.unwrap_err();
        assert!(matches!(err, AppError::ModelTimeout(300)));
        assert!(state.summary.is_empty());
    }
}
