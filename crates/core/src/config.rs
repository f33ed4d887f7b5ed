//! Configuration management for docsift.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - Config file (`.docsift/config.yaml` in the workspace, or `DOCSIFT_CONFIG`)
//! - Environment variables
//! - Command-line flags (`AppConfig::with_overrides`)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the embedding layer knows how to build.
pub const KNOWN_PROVIDERS: [&str; 4] = ["openai", "gemini", "ollama", "mock"];

/// Upper bound on texts sent to a provider in one call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docsift/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active embedding provider (e.g., "openai", "gemini", "ollama", "mock")
    pub provider: String,

    /// Model override for the active provider
    pub model: Option<String>,

    /// API key override, takes precedence over per-provider env vars
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Chunking defaults
    pub chunking: ChunkingConfig,

    /// Search defaults
    pub search: SearchConfig,

    /// Embedding batching and provider definitions
    pub embedding: EmbeddingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            request_timeout_secs: 30,
        }
    }
}

/// Chunking defaults.
///
/// `chars_per_token` is a heuristic. No tokenizer is involved, so a budget of
/// `max_tokens` only approximates the real token count and drifts for
/// non-Latin scripts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub chars_per_token: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            chars_per_token: 4,
        }
    }
}

/// Search defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    pub default_limit: usize,
    /// Minimum score applied when a request gives no threshold
    pub default_threshold: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            default_threshold: None,
        }
    }
}

/// Embedding batching and provider definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingConfig {
    /// Texts per provider call
    pub batch_size: usize,

    /// Pause between consecutive batches, to stay under provider rate limits
    pub batch_delay_ms: u64,

    /// Named provider definitions
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            batch_delay_ms: 100,
            providers: HashMap::new(),
        }
    }
}

/// Provider-specific configuration, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    #[serde(rename = "openai")]
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        dimensions: Option<usize>,
    },
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        dimensions: Option<usize>,
    },
    Ollama {
        endpoint: String,
        model: String,
        dimensions: Option<usize>,
        timeout: Option<u64>,
    },
    Mock {
        dimensions: Option<usize>,
    },
}

impl ProviderConfig {
    /// Built-in definition used when the config file names no such provider.
    pub fn builtin(provider: &str) -> Option<Self> {
        match provider {
            "openai" => Some(Self::OpenAI {
                api_key_env: "OPENAI_API_KEY".to_string(),
                model: "text-embedding-3-small".to_string(),
                endpoint: None,
                dimensions: None,
            }),
            "gemini" => Some(Self::Gemini {
                api_key_env: "GEMINI_API_KEY".to_string(),
                model: "text-embedding-004".to_string(),
                endpoint: None,
                dimensions: None,
            }),
            "ollama" => Some(Self::Ollama {
                endpoint: "http://localhost:11434".to_string(),
                model: "nomic-embed-text".to_string(),
                dimensions: None,
                timeout: Some(30),
            }),
            "mock" => Some(Self::Mock { dimensions: None }),
            _ => None,
        }
    }

    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } => model,
            Self::Gemini { model, .. } => model,
            Self::Ollama { model, .. } => model,
            Self::Mock { .. } => "trigram-v1",
        }
    }

    /// Replace the model, keeping every other setting.
    pub fn with_model(mut self, new_model: &str) -> Self {
        match &mut self {
            Self::OpenAI { model, .. } | Self::Gemini { model, .. } | Self::Ollama { model, .. } => {
                *model = new_model.to_string();
            }
            Self::Mock { .. } => {}
        }
        self
    }

    /// Environment variable holding the API key, for hosted providers.
    pub fn api_key_env(&self) -> Option<&str> {
        match self {
            Self::OpenAI { api_key_env, .. } | Self::Gemini { api_key_env, .. } => {
                Some(api_key_env)
            }
            Self::Ollama { .. } | Self::Mock { .. } => None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    server: Option<ServerConfig>,
    chunking: Option<ChunkingConfig>,
    search: Option<SearchConfig>,
    embedding: Option<EmbeddingSection>,
    logging: Option<LoggingConfig>,
}

/// `embedding:` section, which also names the active provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingSection {
    active_provider: Option<String>,
    #[serde(flatten)]
    settings: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "mock".to_string(), // Works offline without keys
            model: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            server: ServerConfig::default(),
            chunking: ChunkingConfig::default(),
            search: SearchConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file, and the environment.
    ///
    /// Environment variables:
    /// - `DOCSIFT_WORKSPACE`: Override workspace path
    /// - `DOCSIFT_CONFIG`: Path to config file
    /// - `DOCSIFT_PROVIDER`: Active embedding provider
    /// - `DOCSIFT_MODEL`: Model for the active provider
    /// - `DOCSIFT_API_KEY`: API key for the active provider
    /// - `DOCSIFT_HOST` / `DOCSIFT_PORT`: Server bind address
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docsift_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like `load`, but an explicit workspace or config file wins over
    /// `DOCSIFT_WORKSPACE` and `DOCSIFT_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace = workspace.or_else(|| env_path("DOCSIFT_WORKSPACE"));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("DOCSIFT_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.docsift_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Environment variables override the YAML config.
    fn apply_env(&mut self) -> AppResult<()> {
        if let Ok(provider) = std::env::var("DOCSIFT_PROVIDER") {
            self.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCSIFT_MODEL") {
            self.model = Some(model);
        }

        if let Ok(key) = std::env::var("DOCSIFT_API_KEY") {
            self.api_key = Some(key);
        }

        if let Ok(host) = std::env::var("DOCSIFT_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("DOCSIFT_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid DOCSIFT_PORT '{}': {}", port, e)))?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Loaded config file {:?}", path);
        Ok(self.merge_file(file))
    }

    fn merge_file(&self, file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(server) = file.server {
            result.server = server;
        }

        if let Some(chunking) = file.chunking {
            result.chunking = chunking;
        }

        if let Some(search) = file.search {
            result.search = search;
        }

        if let Some(embedding) = file.embedding {
            if let Some(active) = embedding.active_provider {
                result.provider = active;
            }
            result.embedding = embedding.settings;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        result
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = Some(model);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docsift directory.
    pub fn docsift_dir(&self) -> PathBuf {
        self.workspace.join(".docsift")
    }

    /// Resolve the definition for a provider: the config file first, then built-ins.
    ///
    /// The model override only applies to the active provider.
    pub fn provider_config(&self, provider: &str) -> AppResult<ProviderConfig> {
        let config = self
            .embedding
            .providers
            .get(provider)
            .cloned()
            .or_else(|| ProviderConfig::builtin(provider))
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Unknown provider: {}. Supported: {}",
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                ))
            })?;

        match (&self.model, provider == self.provider) {
            (Some(model), true) => Ok(config.with_model(model)),
            _ => Ok(config),
        }
    }

    /// Resolve the API key for a provider.
    ///
    /// `DOCSIFT_API_KEY` only applies to the active provider; every provider
    /// falls back to the env var named in its definition.
    pub fn resolve_api_key(&self, provider: &str) -> AppResult<Option<String>> {
        if provider == self.provider {
            if let Some(ref key) = self.api_key {
                return Ok(Some(key.clone()));
            }
        }

        let provider_config = self.provider_config(provider)?;
        Ok(provider_config
            .api_key_env()
            .and_then(|env_var| std::env::var(env_var).ok()))
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider_config = self.provider_config(&self.provider)?;

        if self.embedding.batch_size == 0 || self.embedding.batch_size > MAX_BATCH_SIZE {
            return Err(AppError::Config(format!(
                "embedding.batchSize must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.embedding.batch_size
            )));
        }

        if self.chunking.max_tokens == 0 || self.chunking.chars_per_token == 0 {
            return Err(AppError::Config(
                "chunking.maxTokens and chunking.charsPerToken must be positive".to_string(),
            ));
        }

        if self.search.default_limit == 0 {
            return Err(AppError::Config(
                "search.defaultLimit must be positive".to_string(),
            ));
        }

        if let Some(env_var) = provider_config.api_key_env() {
            if self.resolve_api_key(&self.provider)?.is_none() {
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    env_var
                )));
            }
        }

        Ok(())
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var).ok().map(PathBuf::from)
}
