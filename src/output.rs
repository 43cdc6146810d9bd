use std::path::Path;

use crate::error::{AppError, Result};
use crate::format::Formatter;
use crate::workflow::{RunOutcome, WorkflowState};

/// Read the program to translate.
pub async fn read_source(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Source file not found: {}", path.display()),
        )));
    }

    let source = tokio::fs::read_to_string(path).await?;
    tracing::info!(chars = source.len(), path = %path.display(), "Read source file");
    Ok(source)
}

/// Write the translated program, creating parent directories as needed.
pub async fn save_to_disk(code: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(path, code).await?;
    tracing::info!(path = %path.display(), "Saved translated code");
    Ok(())
}

/// Settle a finished run. Only a translated candidate is formatted and
/// written to `target`; an unresolved run leaves it untouched.
pub async fn finish(
    state: &WorkflowState,
    formatter: &dyn Formatter,
    target: &Path,
) -> Result<RunOutcome> {
    let outcome = RunOutcome::from_state(state);
    if outcome.is_success() {
        let code = formatter.format(&state.candidate_code).await;
        save_to_disk(&code, target).await?;
    }
    Ok(outcome)
}
