//! Configuration management for the docchat service.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - YAML config file (`docchat.yaml`, or the path in `DOCCHAT_CONFIG`)
//! - Environment variables (a `.env` file is loaded first)
//! - Command-line flags (applied via [`AppConfig::with_overrides`])

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "docchat.yaml";

/// Providers the service knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["gemini", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file the settings were merged from, if any
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    pub server: ServerConfig,
    pub corpus: CorpusConfig,
    pub provider: ProviderConfig,
    pub retrieval: RetrievalConfig,
    pub memory: MemoryConfig,
    pub humanizer: HumanizerConfig,
    pub prompt: PromptConfig,

    /// Log filter override
    pub log_level: Option<String>,

    /// Disable colored output
    pub no_color: bool,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Where the markdown corpus lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Root directory, searched recursively
    #[serde(rename = "documentsDir")]
    pub documents_dir: PathBuf,

    /// File extensions (without the dot) eligible for indexing
    pub extensions: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("data/documents"),
            extensions: vec!["md".to_string()],
        }
    }
}

/// Embedding and generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name ("gemini" or "mock")
    pub name: String,

    /// API credential, only ever read from the environment
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Optional custom endpoint
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,

    #[serde(rename = "chatModel")]
    pub chat_model: String,

    #[serde(rename = "embeddingModel")]
    pub embedding_model: String,

    /// Dimensions produced by the mock embedding provider
    #[serde(rename = "embeddingDimensions")]
    pub embedding_dimensions: usize,

    pub temperature: f32,

    #[serde(rename = "topP")]
    pub top_p: f32,

    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: Option<u32>,

    /// Time budget for a single embedding or generation call
    #[serde(rename = "requestTimeoutSecs")]
    pub request_timeout_secs: u64,

    /// Retries for retryable provider failures (429, 5xx, network)
    #[serde(rename = "maxRetries")]
    pub max_retries: u32,

    /// Texts per batch embedding request during indexing
    #[serde(rename = "embedBatchSize")]
    pub embed_batch_size: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "gemini".to_string(),
            api_key: None,
            base_url: None,
            chat_model: "gemini-2.0-flash".to_string(),
            embedding_model: "models/embedding-001".to_string(),
            embedding_dimensions: 384,
            temperature: 0.7,
            top_p: 0.9,
            max_output_tokens: None,
            request_timeout_secs: 60,
            max_retries: 2,
            embed_batch_size: 100,
        }
    }
}

/// Chunking and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum chunk length in characters
    #[serde(rename = "chunkSize")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(rename = "chunkOverlap")]
    pub chunk_overlap: usize,

    /// Chunks returned per query
    #[serde(rename = "topK")]
    pub top_k: usize,

    /// Optional similarity cutoff
    #[serde(rename = "minScore")]
    pub min_score: Option<f32>,

    /// Rewrite follow-up questions into standalone ones before retrieval
    #[serde(rename = "condenseQuestion")]
    pub condense_question: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            min_score: None,
            condense_question: false,
        }
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Turns kept per session (0 = unbounded)
    #[serde(rename = "historyWindow")]
    pub history_window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { history_window: 20 }
    }
}

/// Response humanizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizerConfig {
    /// Probability of prepending an opening phrase
    #[serde(rename = "openingProbability")]
    pub opening_probability: f64,

    /// Fixed RNG seed (entropy when absent)
    pub seed: Option<u64>,

    /// YAML file overriding the phrase lists
    #[serde(rename = "policyFile")]
    pub policy_file: Option<PathBuf>,
}

impl Default for HumanizerConfig {
    fn default() -> Self {
        Self {
            opening_probability: 0.5,
            seed: None,
            policy_file: None,
        }
    }
}

/// Prompt template settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// YAML prompt definition replacing the built-in template
    #[serde(rename = "promptFile")]
    pub prompt_file: Option<PathBuf>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    server: Option<ServerConfig>,
    corpus: Option<CorpusConfig>,
    provider: Option<ProviderConfig>,
    retrieval: Option<RetrievalConfig>,
    memory: Option<MemoryConfig>,
    humanizer: Option<HumanizerConfig>,
    prompt: Option<PromptConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub documents_dir: Option<PathBuf>,
    pub provider: Option<String>,
    pub chat_model: Option<String>,
    pub embedding_model: Option<String>,
    pub top_k: Option<usize>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            server: ServerConfig::default(),
            corpus: CorpusConfig::default(),
            provider: ProviderConfig::default(),
            retrieval: RetrievalConfig::default(),
            memory: MemoryConfig::default(),
            humanizer: HumanizerConfig::default(),
            prompt: PromptConfig::default(),
            log_level: None,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `DOCCHAT_CONFIG`: Path to config file
    /// - `GOOGLE_API_KEY`: Provider credential
    /// - `DOCCHAT_PROVIDER`: Provider name
    /// - `DOCCHAT_DOCUMENTS_DIR`: Corpus root
    /// - `RUST_LOG`: Log filter
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Corpus: {:?}", config.corpus.documents_dir);
    /// ```
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        // A missing .env file is not an error
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let explicit = config_file.or_else(|| std::env::var("DOCCHAT_CONFIG").ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                Self::from_file(&path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOCCHAT_PROVIDER") {
            config.provider.name = provider;
        }

        if let Ok(dir) = std::env::var("DOCCHAT_DOCUMENTS_DIR") {
            config.corpus.documents_dir = PathBuf::from(dir);
        }

        config.provider.api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Build a configuration from defaults merged with a YAML file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        Self::default().merge_yaml(path)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(server) = config_file.server {
            result.server = server;
        }
        if let Some(corpus) = config_file.corpus {
            result.corpus = corpus;
        }
        if let Some(provider) = config_file.provider {
            // The credential never comes from the file
            let api_key = result.provider.api_key.take();
            result.provider = provider;
            result.provider.api_key = api_key;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(memory) = config_file.memory {
            result.memory = memory;
        }
        if let Some(humanizer) = config_file.humanizer {
            result.humanizer = humanizer;
        }
        if let Some(prompt) = config_file.prompt {
            result.prompt = prompt;
        }
        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(dir) = overrides.documents_dir {
            self.corpus.documents_dir = dir;
        }
        if let Some(provider) = overrides.provider {
            self.provider.name = provider;
        }
        if let Some(model) = overrides.chat_model {
            self.provider.chat_model = model;
        }
        if let Some(model) = overrides.embedding_model {
            self.provider.embedding_model = model;
        }
        if let Some(top_k) = overrides.top_k {
            self.retrieval.top_k = top_k;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = Some(level);
        }
        if overrides.verbose && self.log_level.is_none() {
            self.log_level = Some("debug".to_string());
        }
        if overrides.no_color {
            self.no_color = true;
        }
        self
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate configuration before the service starts.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.name.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "gemini" && self.provider.api_key.is_none() {
            return Err(AppError::Config(format!(
                "{} not found in environment or .env file",
                API_KEY_ENV
            )));
        }

        let retrieval = &self.retrieval;
        if retrieval.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }
        if retrieval.chunk_overlap >= retrieval.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                retrieval.chunk_overlap, retrieval.chunk_size
            )));
        }
        if retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be positive".to_string()));
        }

        if !(0.0..=1.0).contains(&self.humanizer.opening_probability) {
            return Err(AppError::Config(format!(
                "openingProbability must be within [0, 1], got {}",
                self.humanizer.opening_probability
            )));
        }

        if self.provider.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "requestTimeoutSecs must be positive".to_string(),
            ));
        }

        if self.provider.embed_batch_size == 0 {
            return Err(AppError::Config("embedBatchSize must be positive".to_string()));
        }

        if self.corpus.extensions.is_empty() {
            return Err(AppError::Config(
                "At least one corpus extension is required".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gemini_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("test-key".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider.name, "gemini");
        assert_eq!(config.retrieval.chunk_size, 1000);
        assert_eq!(config.retrieval.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.humanizer.opening_probability, 0.5);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_validate_requires_api_key_for_gemini() {
        let config = AppConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains(API_KEY_ENV));

        assert!(gemini_config().validate().is_ok());
    }

    #[test]
    fn test_validate_mock_needs_no_key() {
        let mut config = AppConfig::default();
        config.provider.name = "mock".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = gemini_config();
        config.provider.name = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_overlap_must_be_smaller_than_chunk() {
        let mut config = gemini_config();
        config.retrieval.chunk_overlap = config.retrieval.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_probability_range() {
        let mut config = gemini_config();
        config.humanizer.opening_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_merges_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("docchat.yaml");
        std::fs::write(
            &path,
            r#"
server:
  port: 9001
retrieval:
  topK: 6
  chunkSize: 500
  chunkOverlap: 50
memory:
  historyWindow: 8
humanizer:
  seed: 42
logging:
  level: debug
  color: false
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.memory.history_window, 8);
        assert_eq!(config.humanizer.seed, Some(42));
        assert_eq!(config.humanizer.opening_probability, 0.5);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.no_color);
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        std::fs::write(&path, "server: [not, a, map").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(ConfigOverrides {
            port: Some(3000),
            provider: Some("mock".to_string()),
            top_k: Some(2),
            verbose: true,
            ..Default::default()
        });

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.provider.name, "mock");
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }
}
