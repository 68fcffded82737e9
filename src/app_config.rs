use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (Qt locale, e.g. "en_US")
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (Qt locale, e.g. "fr_FR")
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Target languages for the batch command when none are given on the command line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_languages: Vec<String>,

    /// Suffix appended to the input file stem to name the output file.
    /// `{lang}` is replaced by the target language code.
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batching config
    #[serde(default)]
    pub batch: BatchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    // @returns: Environment variable holding the API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Completion token limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                timeout_secs: default_timeout_secs(),
                max_tokens: default_max_tokens(),
            },
            TranslationProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_timeout_secs(),
                max_tokens: default_max_tokens(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Retry count for failed batches
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Delay in milliseconds between consecutive provider requests
    #[serde(default)]
    pub rate_limit_delay_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum number of batch requests in flight
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Description of the application being translated, added to every prompt
    #[serde(default)]
    pub application_context: String,

    /// Preferred translations of terms, keyed by target language code
    #[serde(default)]
    pub glossary: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            rate_limit_delay_ms: 0,
            temperature: default_temperature(),
            concurrent_requests: default_concurrent_requests(),
            application_context: String::new(),
            glossary: BTreeMap::new(),
        }
    }
}

/// How the units of one file are split into requests
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Everything in one request
    #[default]
    Single,
    /// Requests of at most `batch_size` units
    Multi,
}

/// Batching configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    #[serde(default)]
    pub mode: BatchMode,

    /// Units per request in multi-batch mode
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::default(),
            batch_size: default_batch_size(),
        }
    }
}

impl BatchConfig {
    /// Chunk length to use, `None` meaning a single unbounded batch
    pub fn effective_batch_size(&self) -> Option<usize> {
        match self.mode {
            BatchMode::Single => None,
            BatchMode::Multi => Some(self.batch_size),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en_US".to_string()
}

fn default_target_language() -> String {
    "es_ES".to_string()
}

fn default_output_suffix() -> String {
    "_translated".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_batch_size() -> usize {
    10
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

/// Environment variables read by [`Config::apply_env_overrides`]
pub const ENV_SOURCE_LANG: &str = "TS_TRANSLATOR_SOURCE_LANG";
pub const ENV_TARGET_LANG: &str = "TS_TRANSLATOR_TARGET_LANG";
pub const ENV_PROVIDER: &str = "TS_TRANSLATOR_LLM_PROVIDER";
pub const ENV_MODEL: &str = "TS_TRANSLATOR_LLM_MODEL";
pub const ENV_TEMPERATURE: &str = "TS_TRANSLATOR_TEMPERATURE";
pub const ENV_BATCH_SIZE: &str = "TS_TRANSLATOR_BATCH_SIZE";
pub const ENV_MAX_RETRIES: &str = "TS_TRANSLATOR_MAX_RETRIES";
pub const ENV_OUTPUT_SUFFIX: &str = "TS_TRANSLATOR_OUTPUT_SUFFIX";

/// Settings accepted by the `init` command.
///
/// Fields left `None` keep their default value.
#[derive(Debug, Clone, Default)]
pub struct InitSettings {
    /// First entry becomes `target_language`; all of them go to
    /// `target_languages` when there are several
    pub target_languages: Vec<String>,
    pub source_language: Option<String>,
    pub provider: Option<TranslationProvider>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub batch_size: Option<usize>,
    pub multi_batch: bool,
    pub max_retries: Option<u32>,
    pub output_suffix: Option<String>,
}

impl Config {
    /// Build a fresh configuration from `init` settings.
    ///
    /// Language codes are normalized. The API key is not required here.
    pub fn from_init(settings: &InitSettings) -> Result<Self> {
        let mut config = Config::default();

        let targets = settings
            .target_languages
            .iter()
            .map(|code| crate::language_utils::normalize_locale_code(code))
            .collect::<Result<Vec<_>>>()?;
        if let Some(first) = targets.first() {
            config.target_language = first.clone();
        }
        if targets.len() > 1 {
            config.target_languages = targets;
        }
        if let Some(source) = &settings.source_language {
            config.source_language = crate::language_utils::normalize_locale_code(source)?;
        }
        if let Some(provider) = &settings.provider {
            config.translation.provider = provider.clone();
        }
        if let Some(model) = &settings.model {
            config.translation.active_provider_config_mut().model = model.clone();
        }
        if let Some(temperature) = settings.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(anyhow!("Temperature must be between 0.0 and 2.0, got {}", temperature));
            }
            config.translation.common.temperature = temperature;
        }
        if let Some(batch_size) = settings.batch_size {
            if batch_size == 0 {
                return Err(anyhow!("Batch size must be at least 1"));
            }
            config.batch.batch_size = batch_size;
        }
        if settings.multi_batch {
            config.batch.mode = BatchMode::Multi;
        }
        if let Some(max_retries) = settings.max_retries {
            config.translation.common.retry_count = max_retries;
        }
        if let Some(suffix) = &settings.output_suffix {
            config.output_suffix = suffix.clone();
        }

        Ok(config)
    }

    /// Default location of the configuration file: `~/.ts_translator_config.json`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ts_translator_config.json")
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Apply `TS_TRANSLATOR_*` and API key variables from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = lookup(ENV_SOURCE_LANG) {
            self.source_language = value;
        }
        if let Some(value) = lookup(ENV_TARGET_LANG) {
            self.target_language = value;
        }
        if let Some(value) = lookup(ENV_PROVIDER) {
            self.translation.provider = value.parse()?;
        }
        if let Some(value) = lookup(ENV_MODEL) {
            self.translation.active_provider_config_mut().model = value;
        }
        if let Some(value) = lookup(ENV_TEMPERATURE) {
            self.translation.common.temperature = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {}", ENV_TEMPERATURE, value))?;
        }
        if let Some(value) = lookup(ENV_BATCH_SIZE) {
            self.batch.batch_size = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {}", ENV_BATCH_SIZE, value))?;
        }
        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            self.translation.common.retry_count = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {}", ENV_MAX_RETRIES, value))?;
        }
        if let Some(value) = lookup(ENV_OUTPUT_SUFFIX) {
            self.output_suffix = value;
        }

        // API keys only fill in what the file left empty
        for provider in [TranslationProvider::OpenAI, TranslationProvider::Anthropic] {
            if let Some(key) = lookup(provider.api_key_env_var()) {
                let provider_config = self.translation.provider_config_mut(&provider);
                if provider_config.api_key.is_empty() {
                    provider_config.api_key = key;
                }
            }
        }

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;
        for code in &self.target_languages {
            crate::language_utils::get_language_name(code)?;
        }

        if self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider (set it in the config file or {})",
                self.translation.provider.display_name(),
                self.translation.provider.api_key_env_var()
            ));
        }

        if self.batch.batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }

        let temperature = self.translation.common.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0, got {}", temperature));
        }

        if self.translation.common.concurrent_requests == 0 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            target_languages: Vec::new(),
            output_suffix: default_output_suffix(),
            translation: TranslationConfig::default(),
            batch: BatchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable provider configuration, created with defaults when missing
    pub fn provider_config_mut(&mut self, provider_type: &TranslationProvider) -> &mut ProviderConfig {
        let provider_str = provider_type.to_lowercase_string();
        let position = match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(position) => position,
            None => {
                self.available_providers.push(ProviderConfig::new(provider_type.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[position]
    }

    /// Mutable configuration of the active provider
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider = self.provider.clone();
        self.provider_config_mut(&provider)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::OpenAI => default_openai_model(),
            TranslationProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::OpenAI => default_openai_endpoint(),
            TranslationProvider::Anthropic => default_anthropic_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Get the completion token limit for the active provider
    pub fn get_max_tokens(&self) -> u32 {
        self.get_active_provider_config()
            .map(|p| p.max_tokens)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_max_tokens)
    }

    /// Glossary entries for `target_language`, matched on the exact code
    /// first and on the bare language second
    pub fn glossary_for(&self, target_language: &str) -> Option<&BTreeMap<String, String>> {
        self.common.glossary.get(target_language).or_else(|| {
            let language = target_language.split(['_', '-']).next().unwrap_or(target_language);
            self.common.glossary.get(language)
        })
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: TranslationProvider::default(),
            available_providers: Vec::new(),
            common: TranslationCommonConfig::default(),
        };

        // Add default providers
        config.available_providers.push(ProviderConfig::new(TranslationProvider::OpenAI));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::Anthropic));

        config
    }
}
