use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "openai-compatible" or "anthropic"
    pub provider: String,
    pub model: String,
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>, // For OpenAI-compatible APIs
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-HTTP-call timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Attempts per generation call, counted separately for transport and schema failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Append a correction block to the prompt after an invalid response
    #[serde(default = "default_true")]
    pub tighten_on_retry: bool,
    /// Upper bound on one whole learning plan request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_min_items")]
    pub min_lessons: usize,
    #[serde(default = "default_max_items")]
    pub max_lessons: usize,
    #[serde(default = "default_min_items")]
    pub min_quiz_questions: usize,
    #[serde(default = "default_max_items")]
    pub max_quiz_questions: usize,
    #[serde(default = "default_options_per_question")]
    pub options_per_question: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            tighten_on_retry: true,
            request_timeout_secs: default_request_timeout(),
            min_lessons: default_min_items(),
            max_lessons: default_max_items(),
            min_quiz_questions: default_min_items(),
            max_quiz_questions: default_max_items(),
            options_per_question: default_options_per_question(),
        }
    }
}

impl GenerationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "seek=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_http_timeout() -> u64 {
    60
}

fn default_max_attempts() -> usize {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    180
}

fn default_min_items() -> usize {
    3
}

fn default_max_items() -> usize {
    5
}

fn default_options_per_question() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load config from the working directory or user config directory
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        // If explicit path provided, use it
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path)
                .with_context(|| format!("failed to load config from {}", config_path));
        }

        if let Ok(config) = Self::load_from_path("seek.toml") {
            debug!("Loaded config from ./seek.toml");
            return Ok(config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("seek").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the environment, in production)
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("SEEK_MODEL") {
            debug!("Env override: model = {}", model);
            self.llm.model = model;
        }
        if let Some(v) = lookup("SEEK_TEMPERATURE") {
            self.llm.temperature = parse_env("SEEK_TEMPERATURE", &v)?;
        }
        if let Some(v) = lookup("SEEK_MAX_TOKENS") {
            self.llm.max_tokens = parse_env("SEEK_MAX_TOKENS", &v)?;
        }
        if let Some(v) = lookup("MIN_LESSONS") {
            self.generation.min_lessons = parse_env("MIN_LESSONS", &v)?;
        }
        if let Some(v) = lookup("MAX_LESSONS") {
            self.generation.max_lessons = parse_env("MAX_LESSONS", &v)?;
        }
        if let Some(v) = lookup("MIN_QUIZ_QUESTIONS") {
            self.generation.min_quiz_questions = parse_env("MIN_QUIZ_QUESTIONS", &v)?;
        }
        if let Some(v) = lookup("MAX_QUIZ_QUESTIONS") {
            self.generation.max_quiz_questions = parse_env("MAX_QUIZ_QUESTIONS", &v)?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot honor
    pub fn validate(&self) -> Result<()> {
        let g = &self.generation;
        if g.max_attempts == 0 {
            bail!("generation.max_attempts must be at least 1");
        }
        if g.min_lessons == 0 || g.min_lessons > g.max_lessons {
            bail!(
                "lesson bounds must satisfy 1 <= min_lessons <= max_lessons (got {}..={})",
                g.min_lessons,
                g.max_lessons
            );
        }
        if g.min_quiz_questions == 0 || g.min_quiz_questions > g.max_quiz_questions {
            bail!(
                "quiz bounds must satisfy 1 <= min_quiz_questions <= max_quiz_questions (got {}..={})",
                g.min_quiz_questions,
                g.max_quiz_questions
            );
        }
        if g.options_per_question < 2 {
            bail!(
                "generation.options_per_question must be at least 2 (got {})",
                g.options_per_question
            );
        }
        if g.request_timeout_secs == 0 {
            bail!("generation.request_timeout_secs must be positive");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!(
                "llm.temperature must be within 0.0..=2.0 (got {})",
                self.llm.temperature
            );
        }
        if self.llm.max_tokens == 0 {
            bail!("llm.max_tokens must be positive");
        }
        Ok(())
    }

    /// Get API key from environment variable specified in config
    pub fn get_api_key(&self) -> Result<String> {
        match &self.llm.api_key_env {
            Some(env_var) => {
                // Special case: "none" means no API key needed (e.g., Ollama)
                if env_var.to_lowercase() == "none" {
                    return Ok(String::new());
                }

                // openai-compatible: local models don't need keys, gateways do
                if self.llm.provider == "openai-compatible" {
                    return Ok(env::var(env_var).unwrap_or_default());
                }

                env::var(env_var).map_err(|_| {
                    anyhow::anyhow!("API key not found in environment variable: {}", env_var)
                })
            }
            None => Ok(String::new()), // No API key needed
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow::anyhow!("invalid value for {}: '{}'", key, value))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: "openai".to_string(),
                model: "gpt-4o".to_string(),
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                base_url: None,
                temperature: default_temperature(),
                max_tokens: default_max_tokens(),
                timeout_secs: default_http_timeout(),
            },
            generation: GenerationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
