use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::ToolsConfig;
use crate::error::{AppError, Result};
use crate::validate::Validator;
use crate::workflow::state::{ErrorCategory, ValidationResult};

/// Reads the candidate back and runs `compile()` on it without writing
/// bytecode, printing only the exception summary on failure.
const CHECK_SCRIPT: &str = r#"import sys, traceback
path = sys.argv[1]
try:
    with open(path, encoding="utf-8") as f:
        compile(f.read(), path, "exec")
except (SyntaxError, ValueError) as e:
    sys.stderr.write("".join(traceback.format_exception_only(type(e), e)))
    sys.exit(1)
"#;

/// Compiles candidates with the configured Python interpreter.
///
/// Each call writes to its own temp file, which is removed when the handle
/// drops, so concurrent runs never collide and nothing is left behind.
pub struct PyCompileValidator {
    python: String,
    timeout: Duration,
    scratch_dir: Option<PathBuf>,
}

impl PyCompileValidator {
    pub fn new(python: &str, timeout: Duration) -> Self {
        Self {
            python: python.to_string(),
            timeout,
            scratch_dir: None,
        }
    }

    /// Create scratch files under `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(
            &config.python,
            Duration::from_secs(config.check_timeout_secs),
        )
    }
}

#[async_trait]
impl Validator for PyCompileValidator {
    async fn check(&self, code: &str) -> Result<ValidationResult> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("polyglot-").suffix(".py");
        let file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tokio::fs::write(file.path(), code).await?;

        let child = Command::new(&self.python)
            .arg("-c")
            .arg(CHECK_SCRIPT)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                AppError::Validator(format!(
                    "Compile check did not finish within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::Validator(format!("Failed to run {}: {e}", self.python)))?;

        if output.status.success() {
            tracing::debug!("Compilation check passed");
            return Ok(ValidationResult::ok());
        }

        let path = file.path().to_string_lossy();
        let mut message = String::from_utf8_lossy(&output.stderr).into_owned();
        if message.trim().is_empty() {
            message = String::from_utf8_lossy(&output.stdout).into_owned();
        }
        let message = message.replace(&*path, "<candidate>").trim().to_string();

        tracing::warn!(
            error = %message.chars().take(200).collect::<String>(),
            "Compilation error"
        );

        Ok(ValidationResult::failed(ErrorCategory::Compile, message))
    }
}
