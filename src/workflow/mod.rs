pub mod orchestrator;
pub mod state;
pub mod types;

pub use orchestrator::{route, Orchestrator, Phase, Route};
pub use state::{ErrorCategory, ValidationResult, WorkflowState};
pub use types::RunOutcome;
