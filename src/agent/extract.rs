use regex::Regex;

use crate::error::{AppError, Result};

/// Pulls the code payload out of a model response.
pub struct CodeExtractor {
    fence: Regex,
}

impl CodeExtractor {
    /// Match fenced blocks whose info string is `tag` (case-insensitive).
    pub fn new(tag: &str) -> Result<Self> {
        let pattern = format!(r"(?is)```{}[ \t]*\r?\n(.*?)```", regex::escape(tag));
        let fence = Regex::new(&pattern)
            .map_err(|e| AppError::Config(format!("Invalid fence tag {tag:?}: {e}")))?;
        Ok(Self { fence })
    }

    /// Inner text of the first tagged block, trimmed. Without a tagged block
    /// the whole response is used and validation sorts out the rest.
    pub fn extract(&self, response: &str) -> String {
        if let Some(block) = self.fence.captures(response).and_then(|c| c.get(1)) {
            tracing::debug!("Extracted code from fenced block");
            return block.as_str().trim().to_string();
        }

        tracing::warn!("No fenced block found, using full response as code");
        response.trim().to_string()
    }
}
