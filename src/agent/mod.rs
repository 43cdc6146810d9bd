pub mod extract;
pub mod planning;
pub mod prompt;
pub mod summary;
pub mod transpile;

use async_trait::async_trait;

use crate::error::Result;
use crate::workflow::state::WorkflowState;

pub use planning::PlanningAgent;
pub use summary::SummaryAgent;
pub use transpile::TranspileAgent;

/// One step of the translation workflow. Each agent reads the fields it
/// needs from the state and writes its own.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, state: &mut WorkflowState) -> Result<()>;
}

/// First `max` characters of `text`, for debug logs.
pub(crate) fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
