use crate::workflow::state::WorkflowState;

/// Final verdict of a run, derived from the state it ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The last candidate validated cleanly.
    Translated { iterations: u32 },
    /// The retry budget ran out with the candidate still failing.
    Unresolved {
        iterations: u32,
        code: i32,
        message: String,
    },
}

impl RunOutcome {
    pub fn from_state(state: &WorkflowState) -> Self {
        if state.last_validation.is_ok() {
            RunOutcome::Translated {
                iterations: state.iteration_count,
            }
        } else {
            RunOutcome::Unresolved {
                iterations: state.iteration_count,
                code: state.last_validation.code,
                message: state.last_validation.message.clone(),
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Translated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::state::{ErrorCategory, ValidationResult};

    #[test]
    fn test_outcome_from_state() {
        let mut state = WorkflowState::new("x");
        state.iteration_count = 3;
        state.last_validation = ValidationResult::failed(ErrorCategory::Compile, "bad");
        assert_eq!(
            RunOutcome::from_state(&state),
            RunOutcome::Unresolved {
                iterations: 3,
                code: 1,
                message: "bad".to_string()
            }
        );

        state.last_validation = ValidationResult::ok();
        assert!(RunOutcome::from_state(&state).is_success());
    }
}
