//! Runtime configuration: a TOML file plus `SEMDB_*` environment overrides.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{Metric, SimilarityEngine};
use crate::service::{CorpusService, DEFAULT_K};
use crate::store::{FileStore, MemoryStore, StoreError, VectorStore};

pub const ENV_HOST: &str = "SEMDB_HOST";
pub const ENV_PORT: &str = "SEMDB_PORT";
pub const ENV_STORE_PATH: &str = "SEMDB_STORE_PATH";
pub const ENV_LOG: &str = "SEMDB_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `tracing_subscriber` filter used when `RUST_LOG` is unset.
    pub log: String,
    /// Expected vector length; enforced on add when set.
    pub dimension: Option<usize>,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Only used by the file backend.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_k: usize,
    pub metric: Metric,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log: "info".to_string(),
            dimension: None,
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { host: "127.0.0.1".to_string(), port: 7878 }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig { backend: Backend::Memory, path: PathBuf::from("semdb.db") }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { default_k: DEFAULT_K, metric: Metric::Cosine }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {var}: '{value}'")]
    InvalidOverride { var: &'static str, value: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Service(#[from] crate::Error),
}

impl Config {
    /// Reads `path` if given, otherwise starts from defaults.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Config::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies the process environment on top of this config.
    pub fn with_env(self) -> Result<Config, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides from `lookup`. Setting the store path also selects
    /// the file backend.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, ConfigError> {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidOverride { var: ENV_PORT, value: port })?;
        }
        if let Some(path) = lookup(ENV_STORE_PATH) {
            self.store.backend = Backend::File;
            self.store.path = PathBuf::from(path);
        }
        if let Some(log) = lookup(ENV_LOG) {
            self.log = log;
        }
        Ok(self)
    }

    pub fn open_store(&self) -> Result<Arc<dyn VectorStore>, ConfigError> {
        let store: Arc<dyn VectorStore> = match self.store.backend {
            Backend::Memory => Arc::new(MemoryStore::new()),
            Backend::File => Arc::new(FileStore::open(&self.store.path)?),
        };
        Ok(store)
    }

    pub fn build_service(&self) -> Result<CorpusService, ConfigError> {
        let store = self.open_store()?;
        let mut service = CorpusService::new(store, SimilarityEngine::new(self.search.metric))
            .with_default_k(self.search.default_k)?;
        if let Some(dimension) = self.dimension {
            service = service.with_dimension(dimension)?;
        }
        Ok(service)
    }
}
