//! Configuration management for session-keeper.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::error::SessionError;
use crate::session::{
    ContainerRegistry, ExpirationPolicy, JsonFileStore, MemoryStore, SessionDataContainer,
    SessionStore, Sweeper, DEFAULT_RESOLUTION_SECS, DEFAULT_TIMEOUT_SECS,
};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Session containers.
    pub sessions: SessionsSection,
    /// Background sweep settings.
    pub sweep: SweepSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            graceful_shutdown: true,
        }
    }
}

/// Session container layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    /// Container used for every namespace without its own entry.
    pub default: ContainerSection,
    /// Containers dedicated to specific namespaces.
    pub namespaces: BTreeMap<String, ContainerSection>,
}

/// One container's policy and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSection {
    /// Inactivity timeout in seconds (0 = never expire).
    pub timeout_secs: u64,
    /// Last-access resolution in seconds.
    pub resolution_secs: u64,
    /// Sweep on access, at most once per resolution window.
    pub implicit_sweep: bool,
    /// Backing store.
    pub storage: StorageSection,
}

impl Default for ContainerSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            resolution_secs: DEFAULT_RESOLUTION_SECS,
            implicit_sweep: false,
            storage: StorageSection::Memory,
        }
    }
}

impl ContainerSection {
    /// Build a container named `name` from this section.
    pub fn build(&self, name: &str) -> Result<SessionDataContainer, SessionError> {
        let policy = ExpirationPolicy::new(self.timeout_secs, self.resolution_secs)?;
        let store: Arc<dyn SessionStore> = match &self.storage {
            StorageSection::Memory => Arc::new(MemoryStore::new()),
            StorageSection::File { path } => Arc::new(JsonFileStore::open(path)?),
        };

        Ok(SessionDataContainer::with_store(name, store)
            .with_policy(policy)
            .with_implicit_sweep(self.implicit_sweep))
    }
}

/// Backing store selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageSection {
    /// Process memory only.
    #[default]
    Memory,
    /// JSON snapshot file.
    File {
        /// Snapshot location.
        path: PathBuf,
    },
}

/// Background sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSection {
    /// Run the periodic sweeper.
    pub enabled: bool,
    /// Seconds between sweeps.
    pub interval_secs: u64,
    /// Seconds between flushes of durable stores.
    pub flush_interval_secs: u64,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
            flush_interval_secs: 60,
        }
    }
}

impl SweepSection {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    /// Start the background task for `registry`.
    ///
    /// Durable stores are flushed on schedule even with sweeping disabled.
    pub fn spawn(&self, registry: Arc<ContainerRegistry>) -> Sweeper {
        if self.enabled {
            Sweeper::spawn(registry, self.interval(), self.flush_interval())
        } else {
            Sweeper::spawn_flush_only(registry, self.flush_interval())
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SESSION_KEEPER_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("SESSION_KEEPER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(timeout) = std::env::var("SESSION_KEEPER_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                self.sessions.default.timeout_secs = timeout;
            }
        }

        if let Ok(resolution) = std::env::var("SESSION_KEEPER_RESOLUTION") {
            if let Ok(resolution) = resolution.parse() {
                self.sessions.default.resolution_secs = resolution;
            }
        }

        if let Ok(level) = std::env::var("SESSION_KEEPER_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(timeout) = args.timeout {
            self.sessions.default.timeout_secs = timeout;
        }

        if let Some(resolution) = args.resolution {
            self.sessions.default.resolution_secs = resolution;
        }

        if args.no_sweep {
            self.sweep.enabled = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Config::default();

        // Load from config file if specified
        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        // Apply environment variable overrides
        config.apply_env();

        // Apply CLI argument overrides (highest priority)
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }

        Ok(server_config)
    }

    /// Build every configured container and the namespace routing.
    ///
    /// Policies are validated here, so a bad timeout/resolution pair stops
    /// startup instead of surfacing on first access.
    pub fn build_registry(&self) -> Result<ContainerRegistry, ConfigError> {
        let default = self
            .sessions
            .default
            .build("default")
            .map_err(|e| ConfigError::Session("default".to_string(), e))?;

        let mut registry = ContainerRegistry::new(Arc::new(default));
        for (namespace, section) in &self.sessions.namespaces {
            let container = section
                .build(namespace)
                .map_err(|e| ConfigError::Session(namespace.clone(), e))?;
            registry.register(namespace.clone(), Arc::new(container));
        }

        Ok(registry)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// A container could not be built (bad policy or unreadable store).
    Session(String, SessionError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::Session(name, e) => write!(f, "container '{}': {}", name, e),
        }
    }
}

impl std::error::Error for ConfigError {}
