use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::ToolsConfig;

/// Best-effort code beautifier. Never fails: on any problem the input is
/// returned unchanged.
#[async_trait]
pub trait Formatter: Send + Sync {
    async fn format(&self, code: &str) -> String;
}

/// Leaves code untouched.
pub struct PassthroughFormatter;

#[async_trait]
impl Formatter for PassthroughFormatter {
    async fn format(&self, code: &str) -> String {
        code.to_string()
    }
}

/// Pipes code through `black`.
pub struct BlackFormatter {
    command: String,
    line_length: u32,
    target_version: String,
    timeout: Duration,
}

impl BlackFormatter {
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            command: config.formatter.clone(),
            line_length: config.line_length,
            target_version: config.target_version.clone(),
            timeout: Duration::from_secs(config.format_timeout_secs),
        }
    }

    async fn run(&self, code: &str) -> std::result::Result<String, String> {
        let mut child = Command::new(&self.command)
            .arg("--quiet")
            .arg("--line-length")
            .arg(self.line_length.to_string())
            .arg("--target-version")
            .arg(&self.target_version)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to run {}: {e}", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(code.as_bytes())
                .await
                .map_err(|e| format!("failed to write to formatter: {e}"))?;
        }

        // Dropping the timed-out future kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| format!("formatter timed out after {:?}", self.timeout))?
            .map_err(|e| format!("formatter did not finish: {e}"))?;

        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }

        String::from_utf8(output.stdout).map_err(|e| format!("formatter output is not UTF-8: {e}"))
    }
}

#[async_trait]
impl Formatter for BlackFormatter {
    async fn format(&self, code: &str) -> String {
        match self.run(code).await {
            Ok(formatted) => {
                tracing::debug!("Code formatted with {}", self.command);
                formatted
            }
            Err(e) => {
                tracing::warn!(error = %e, "Formatting failed, keeping original code");
                code.to_string()
            }
        }
    }
}
