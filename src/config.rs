use serde::Deserialize;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Any endpoint speaking the OpenAI chat-completions protocol.
    #[default]
    OpenAi,
    Anthropic,
}

impl std::str::FromStr for Provider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => Err(AppError::Config(format!("Unknown model provider: {other}"))),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Manual Debug impl to avoid leaking the API key
impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model_name(),
            base_url: None,
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelConfig {
    /// Endpoint to talk to, falling back to the provider's public API.
    pub fn endpoint(&self) -> &str {
        match (&self.base_url, self.provider) {
            (Some(url), _) => url,
            (None, Provider::OpenAi) => DEFAULT_OPENAI_BASE_URL,
            (None, Provider::Anthropic) => DEFAULT_ANTHROPIC_BASE_URL,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_source_language")]
    pub source_language: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Info string the model is asked to tag its code fence with.
    #[serde(default = "default_fence_tag")]
    pub fence_tag: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            fence_tag: default_fence_tag(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ToolsConfig {
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_formatter")]
    pub formatter: String,
    #[serde(default = "default_line_length")]
    pub line_length: u32,
    #[serde(default = "default_target_version")]
    pub target_version: String,
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,
    #[serde(default = "default_format_timeout_secs")]
    pub format_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            formatter: default_formatter(),
            line_length: default_line_length(),
            target_version: default_target_version(),
            check_timeout_secs: default_check_timeout_secs(),
            format_timeout_secs: default_format_timeout_secs(),
        }
    }
}

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

fn default_model_name() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_iterations() -> u32 {
    3
}

fn default_source_language() -> String {
    "Java".to_string()
}

fn default_target_language() -> String {
    "Python".to_string()
}

fn default_fence_tag() -> String {
    "python".to_string()
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_formatter() -> String {
    "black".to_string()
}

fn default_line_length() -> u32 {
    88
}

fn default_target_version() -> String {
    "py312".to_string()
}

fn default_check_timeout_secs() -> u64 {
    60
}

fn default_format_timeout_secs() -> u64 {
    30
}

/// Settings given on the command line. They win over the file and
/// `POLYGLOT__*` variables, and are applied before the provider-specific
/// key and endpoint variables are consulted.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<Provider>,
    pub model_name: Option<String>,
    pub max_iterations: Option<u32>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(provider) = self.provider {
            config.model.provider = provider;
        }
        if let Some(name) = &self.model_name {
            config.model.name = name.clone();
        }
        if let Some(max_iterations) = self.max_iterations {
            config.workflow.max_iterations = max_iterations;
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&str>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("polyglot").required(false));
        }

        // Environment variable overrides with POLYGLOT_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("POLYGLOT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let config: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(config.resolve(overrides, |var| std::env::var(var).ok()))
    }

    fn resolve(
        mut self,
        overrides: &ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        overrides.apply(&mut self);
        self.apply_conventional_env(lookup);
        self
    }

    /// Fill the key and endpoint from the variables the provider SDKs use
    /// when nothing more specific was configured.
    fn apply_conventional_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.model.api_key.is_empty() {
            let var = match self.model.provider {
                Provider::OpenAi => "OPEN_API_KEY",
                Provider::Anthropic => "ANTHROPIC_API_KEY",
            };
            if let Some(key) = lookup(var) {
                self.model.api_key = key;
            }
        }

        if self.model.base_url.is_none() && self.model.provider == Provider::OpenAi {
            self.model.base_url = lookup("OPEN_BASE_URL");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.api_key.is_empty() {
            return Err(AppError::Config(
                "No API key configured (set model.api_key, POLYGLOT__MODEL__API_KEY, \
                 OPEN_API_KEY or ANTHROPIC_API_KEY)"
                    .to_string(),
            ));
        }
        if self.workflow.max_iterations == 0 {
            return Err(AppError::Config(
                "workflow.max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
