use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::extract::CodeExtractor;
use crate::agent::prompt::PromptSet;
use crate::agent::{preview, Stage};
use crate::error::Result;
use crate::llm::ModelClient;
use crate::validate::Validator;
use crate::workflow::state::WorkflowState;

/// Produces the candidate translation, or repairs it once validation has
/// failed, then validates the result.
pub struct TranspileAgent {
    model: Arc<dyn ModelClient>,
    validator: Arc<dyn Validator>,
    prompts: Arc<PromptSet>,
    extractor: CodeExtractor,
}

impl TranspileAgent {
    pub fn new(
        model: Arc<dyn ModelClient>,
        validator: Arc<dyn Validator>,
        prompts: Arc<PromptSet>,
    ) -> Result<Self> {
        let extractor = CodeExtractor::new(&prompts.fence_tag)?;
        Ok(Self {
            model,
            validator,
            prompts,
            extractor,
        })
    }

    async fn initial_translation(&self, state: &mut WorkflowState) -> Result<()> {
        let system = self.prompts.fill(&self.prompts.transpile_system, &[]);
        let user = self.prompts.fill(
            &self.prompts.transpile_user,
            &[
                ("plan", state.plan.as_str()),
                ("source_code", state.source_code.as_str()),
            ],
        );

        let response = self.model.generate(&system, &user).await?;
        state.candidate_code = self.extractor.extract(&response);

        tracing::debug!(chars = state.candidate_code.len(), "Generated candidate code");
        Ok(())
    }

    async fn repair(&self, state: &mut WorkflowState) -> Result<()> {
        let (category, user) = self.prompts.repair_request(
            state.last_validation.code,
            &state.last_validation.message,
            &state.candidate_code,
        );
        let system = self.prompts.fill(&self.prompts.transpile_system, &[]);

        tracing::debug!(category = %category, "Selected repair template");

        let response = self.model.generate(&system, &user).await?;
        state.candidate_code = self.extractor.extract(&response);

        tracing::debug!(chars = state.candidate_code.len(), "Generated repair attempt");
        Ok(())
    }
}

#[async_trait]
impl Stage for TranspileAgent {
    fn name(&self) -> &str {
        "transpile"
    }

    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        if state.iteration_count > 0 {
            tracing::warn!(
                stage = self.name(),
                iteration = state.iteration_count,
                "Retry attempt, repairing candidate"
            );
            self.repair(state).await?;
        } else {
            tracing::info!(stage = self.name(), "Starting initial translation");
            self.initial_translation(state).await?;
        }

        let validation = self.validator.validate(&state.candidate_code).await?;
        state.last_validation = validation;
        state.iteration_count += 1;

        let attempt = state.iteration_count;
        if state.last_validation.is_ok() {
            tracing::info!(stage = self.name(), attempt, "Candidate validated");
            state.note(&format!("attempt {attempt}: ok"));
        } else {
            let label = match state.last_validation.category() {
                Some(category) => category.to_string(),
                None => format!("code {}", state.last_validation.code),
            };
            tracing::error!(
                stage = self.name(),
                attempt,
                error = %preview(&state.last_validation.message, 200),
                "Validation failed"
            );
            state.note(&format!("attempt {attempt}: {label}"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{MarkerValidator, ScriptedModel};
    use crate::config::WorkflowConfig;
    use crate::error::AppError;
    use crate::workflow::state::ValidationResult;

    fn agent(model: Arc<ScriptedModel>, validator: Arc<MarkerValidator>) -> TranspileAgent {
        let prompts = Arc::new(PromptSet::from_config(&WorkflowConfig::default()));
        TranspileAgent::new(model, validator, prompts).unwrap()
    }

    fn planned_state() -> WorkflowState {
        let mut state = WorkflowState::new("class A { int x; }");
        state.summary = "A holds x".to_string();
        state.plan = "1. make a class".to_string();
        state
    }

    #[tokio::test]
    async fn test_first_invocation_translates_from_plan() {
        let model = Arc::new(ScriptedModel::new([
            "Sure!\n```python\nclass A:\n    x: int = 0\n```\nDone.",
        ]));
        let validator = Arc::new(MarkerValidator::new("BROKEN"));
        let agent = agent(model.clone(), validator.clone());
        let mut state = planned_state();

        agent.run(&mut state).await.unwrap();

        assert_eq!(state.candidate_code, "class A:\n    x: int = 0");
        assert_eq!(state.iteration_count, 1);
        assert!(state.last_validation.is_ok());
        assert_eq!(state.scratchpad, "attempt 1: ok");

        let user = model.user_message(0);
        assert!(user.contains("1. make a class"));
        assert!(user.contains("class A { int x; }"));
        assert_eq!(validator.checked.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repair_mode_embeds_trace_and_candidate() {
        let model = Arc::new(ScriptedModel::new(["```python\nx = 1\n```"]));
        let validator = Arc::new(MarkerValidator::new("BROKEN"));
        let agent = agent(model.clone(), validator);

        let mut state = planned_state();
        state.candidate_code = "x = BROKEN".to_string();
        state.last_validation = ValidationResult {
            code: 1,
            message: "SyntaxError: invalid syntax (line 1)".to_string(),
        };
        state.iteration_count = 1;

        agent.run(&mut state).await.unwrap();

        let user = model.user_message(0);
        assert!(user.contains("failed to compile"));
        assert!(user.contains("SyntaxError: invalid syntax (line 1)"));
        assert!(user.contains("```python\nx = BROKEN\n```"));
        assert!(!user.contains("1. make a class"));

        assert_eq!(state.candidate_code, "x = 1");
        assert_eq!(state.iteration_count, 2);
        assert!(state.last_validation.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_code_uses_compile_template() {
        let model = Arc::new(ScriptedModel::new(["```python\nx = 1\n```"]));
        let agent = agent(model.clone(), Arc::new(MarkerValidator::new("BROKEN")));

        let mut state = planned_state();
        state.candidate_code = "x = 2".to_string();
        state.last_validation = ValidationResult {
            code: 7,
            message: "mystery".to_string(),
        };
        state.iteration_count = 1;

        agent.run(&mut state).await.unwrap();
        assert!(model.user_message(0).contains("failed to compile"));
    }

    #[tokio::test]
    async fn test_empty_response_is_a_validation_failure() {
        let model = Arc::new(ScriptedModel::new(["```python\n   \n```"]));
        let validator = Arc::new(MarkerValidator::new("BROKEN"));
        let agent = agent(model, validator.clone());
        let mut state = planned_state();

        agent.run(&mut state).await.unwrap();

        assert!(state.candidate_code.is_empty());
        assert_eq!(state.last_validation, ValidationResult::empty_input());
        assert_eq!(state.iteration_count, 1);
        assert!(validator.checked.lock().unwrap().is_empty());
        assert_eq!(state.scratchpad, "attempt 1: compile error");
    }

    #[tokio::test]
    async fn test_model_failure_leaves_counter_untouched() {
        let model = Arc::new(ScriptedModel::failing(AppError::Model(
            "API returned 500".to_string(),
        )));
        let agent = agent(model, Arc::new(MarkerValidator::new("BROKEN")));
        let mut state = planned_state();

        assert!(agent.run(&mut state).await.is_err());
        assert_eq!(state.iteration_count, 0);
    }
}
