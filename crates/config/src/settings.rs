//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{analytics, chat, endpoints, retry, tax, timeouts};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Outbound API client configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Chat widget configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Analytics reporting
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Tax schedule used by the tax calculators
    #[serde(default)]
    pub tax: TaxSettings,

    /// Local state storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_client()?;
        self.validate_chat()?;
        self.validate_tax()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_client(&self) -> Result<(), ConfigError> {
        let client = &self.client;

        if client.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("client.base_url".to_string()));
        }

        if !client.base_url.starts_with("http://") && !client.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "client.base_url".to_string(),
                message: format!("Must be an http(s) URL, got '{}'", client.base_url),
            });
        }

        validate_retry("client", client.timeout_ms, client.max_attempts)?;

        if self.environment.is_strict() && client.base_url.starts_with("http://localhost") {
            tracing::warn!(
                base_url = %client.base_url,
                "Client base URL points at localhost outside development"
            );
        }

        Ok(())
    }

    fn validate_chat(&self) -> Result<(), ConfigError> {
        let chat = &self.chat;

        validate_retry("chat", chat.timeout_ms, chat.max_attempts)?;

        if chat.context_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chat.context_window".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if chat.max_message_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chat.max_message_chars".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if chat.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chat.max_sessions".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if chat.session_idle_timeout_secs == 0 || chat.session_cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chat.session_idle_timeout_secs".to_string(),
                message: "Idle timeout and cleanup interval must be at least 1s".to_string(),
            });
        }

        Ok(())
    }

    fn validate_tax(&self) -> Result<(), ConfigError> {
        let tax = &self.tax;

        if !(0.0..=100.0).contains(&tax.cess_percent) {
            return Err(ConfigError::InvalidValue {
                field: "tax.cess_percent".to_string(),
                message: format!("Must be between 0 and 100, got {}", tax.cess_percent),
            });
        }

        if !tax.deduction_cap.is_finite() || tax.deduction_cap < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "tax.deduction_cap".to_string(),
                message: format!("Must be a non-negative amount, got {}", tax.deduction_cap),
            });
        }

        let slabs = tax.effective_slabs();
        if slabs.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tax.slabs".to_string(),
                message: "At least one slab is required".to_string(),
            });
        }

        let mut previous = 0.0;
        for (index, slab) in slabs.iter().enumerate() {
            let field = format!("tax.slabs[{}]", index);
            let is_last = index + 1 == slabs.len();

            if !(0.0..=100.0).contains(&slab.rate_percent) {
                return Err(ConfigError::InvalidValue {
                    field,
                    message: format!("Rate must be between 0 and 100, got {}", slab.rate_percent),
                });
            }

            match slab.upto {
                Some(upto) if upto <= previous => {
                    return Err(ConfigError::InvalidValue {
                        field,
                        message: format!(
                            "Slab bounds must be strictly ascending ({} after {})",
                            upto, previous
                        ),
                    });
                },
                Some(upto) => previous = upto,
                None if !is_last => {
                    return Err(ConfigError::InvalidValue {
                        field,
                        message: "Only the last slab may be unbounded".to_string(),
                    });
                },
                None => {},
            }
        }

        if slabs.last().and_then(|s| s.upto).is_some() {
            return Err(ConfigError::InvalidValue {
                field: "tax.slabs".to_string(),
                message: "The last slab must be unbounded".to_string(),
            });
        }

        Ok(())
    }
}

fn validate_retry(section: &str, timeout_ms: u64, max_attempts: u32) -> Result<(), ConfigError> {
    if timeout_ms == 0 {
        return Err(ConfigError::InvalidValue {
            field: format!("{}.timeout_ms", section),
            message: "Timeout must be at least 1ms".to_string(),
        });
    }

    if max_attempts == 0 {
        return Err(ConfigError::InvalidValue {
            field: format!("{}.max_attempts", section),
            message: "Must be at least 1".to_string(),
        });
    }

    if max_attempts > 10 {
        tracing::warn!(
            section,
            max_attempts,
            "High retry count; worst-case latency grows linearly with attempts"
        );
    }

    Ok(())
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

/// Outbound API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL; relative endpoints are joined onto it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-attempt timeout (ms)
    #[serde(default = "default_client_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per logical request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit (ms)
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_base_url() -> String {
    std::env::var("FINLIT_API_BASE_URL")
        .unwrap_or_else(|_| endpoints::API_BASE_DEFAULT.to_string())
}

fn default_client_timeout_ms() -> u64 {
    timeouts::CLIENT_REQUEST_MS
}

fn default_max_attempts() -> u32 {
    retry::MAX_ATTEMPTS
}

fn default_backoff_ms() -> u64 {
    retry::BACKOFF_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_client_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Chat widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Chat completion endpoint (relative to `client.base_url` or absolute)
    #[serde(default = "default_chat_endpoint")]
    pub endpoint: String,

    /// Per-attempt timeout (ms)
    #[serde(default = "default_chat_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per question
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit (ms)
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Trailing exchanges forwarded as context
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Longest accepted user message (chars)
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Optional YAML file overriding the built-in fallback rules
    #[serde(default)]
    pub fallback_rules_path: Option<String>,

    /// Persist history in local storage
    #[serde(default = "default_true")]
    pub persist_history: bool,

    /// Live sessions held in memory; new ids are refused beyond this
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time before a session is evicted (seconds)
    #[serde(default = "default_session_idle_timeout_secs")]
    pub session_idle_timeout_secs: u64,

    /// Sweep interval for idle sessions (seconds)
    #[serde(default = "default_session_cleanup_interval_secs")]
    pub session_cleanup_interval_secs: u64,
}

fn default_chat_endpoint() -> String {
    endpoints::CHAT_PATH.to_string()
}

fn default_chat_timeout_ms() -> u64 {
    timeouts::CHAT_REQUEST_MS
}

fn default_context_window() -> usize {
    chat::CONTEXT_WINDOW
}

fn default_max_message_chars() -> usize {
    chat::MAX_MESSAGE_CHARS
}

fn default_max_sessions() -> usize {
    chat::MAX_SESSIONS
}

fn default_session_idle_timeout_secs() -> u64 {
    chat::SESSION_IDLE_TIMEOUT_SECS
}

fn default_session_cleanup_interval_secs() -> u64 {
    chat::SESSION_CLEANUP_INTERVAL_SECS
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: default_chat_endpoint(),
            timeout_ms: default_chat_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            context_window: default_context_window(),
            max_message_chars: default_max_message_chars(),
            fallback_rules_path: None,
            persist_history: true,
            max_sessions: default_max_sessions(),
            session_idle_timeout_secs: default_session_idle_timeout_secs(),
            session_cleanup_interval_secs: default_session_cleanup_interval_secs(),
        }
    }
}

/// Analytics reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Feature flag; disabled reporters drop every event
    #[serde(default)]
    pub enabled: bool,

    /// Ingestion endpoint
    #[serde(default = "default_analytics_endpoint")]
    pub endpoint: String,

    /// Identical events inside this window are dropped (ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_analytics_endpoint() -> String {
    endpoints::ANALYTICS_EVENTS_PATH.to_string()
}

fn default_debounce_ms() -> u64 {
    analytics::DEBOUNCE_MS
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_analytics_endpoint(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Tax regime preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaxRegime {
    /// Regime with 80C-style deductions
    #[default]
    Old,
    /// Simplified regime without most deductions
    New,
}

/// One slab of a marginal tax schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxSlabConfig {
    /// Upper bound of the slab (inclusive); `None` for the top slab
    #[serde(default)]
    pub upto: Option<f64>,
    /// Marginal rate in percent
    pub rate_percent: f64,
}

/// Tax schedule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxSettings {
    /// Preset used when `slabs` is empty
    #[serde(default)]
    pub regime: TaxRegime,

    /// Custom slabs, overriding the regime preset
    #[serde(default)]
    pub slabs: Vec<TaxSlabConfig>,

    /// Cess applied on top of computed tax (percent)
    #[serde(default = "default_cess_percent")]
    pub cess_percent: f64,

    /// Statutory ceiling on deductible investment
    #[serde(default = "default_deduction_cap")]
    pub deduction_cap: f64,
}

fn default_cess_percent() -> f64 {
    tax::CESS_PERCENT
}

fn default_deduction_cap() -> f64 {
    tax::DEDUCTION_80C_CAP
}

impl TaxSettings {
    /// Slabs in effect: custom slabs if configured, else the regime preset
    pub fn effective_slabs(&self) -> Vec<TaxSlabConfig> {
        if !self.slabs.is_empty() {
            return self.slabs.clone();
        }

        let preset = match self.regime {
            TaxRegime::Old => tax::OLD_REGIME_SLABS,
            TaxRegime::New => tax::NEW_REGIME_SLABS,
        };
        preset
            .iter()
            .map(|&(upto, rate_percent)| TaxSlabConfig { upto, rate_percent })
            .collect()
    }
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            regime: TaxRegime::default(),
            slabs: Vec::new(),
            cess_percent: default_cess_percent(),
            deduction_cap: default_deduction_cap(),
        }
    }
}

/// Local state storage
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// JSON file holding local state; in-memory when unset
    #[serde(default)]
    pub path: Option<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (overridden by RUST_LOG)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info,finlit=debug".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (FINLIT__ prefix, e.g. FINLIT__CLIENT__BASE_URL)
/// 2. config/{env}.yaml|toml (if env specified)
/// 3. config/default.yaml|toml
/// 4. Built-in defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("FINLIT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    Ok(settings)
}
