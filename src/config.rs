use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::search::tavily::TAVILY_API_URL;
use crate::utils;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TAVILY_API_KEY not found in {path} or the environment")]
    MissingApiKey { path: String },
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
    #[error("error reading {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub search_api_key: String,
    pub search_endpoint: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Reads the env file, then the process environment, which wins on conflicts.
    pub fn load() -> Result<Self, ConfigError> {
        let path = utils::env_file_path();
        let file_vars = read_env_file(&path)?;
        Self::from_vars(&path.display().to_string(), &file_vars, |key| {
            std::env::var(key).ok()
        })
    }

    pub fn from_vars<F>(
        origin: &str,
        file_vars: &HashMap<String, String>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            env(key)
                .or_else(|| file_vars.get(key).cloned())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let search_api_key = lookup("TAVILY_API_KEY").ok_or_else(|| ConfigError::MissingApiKey {
            path: origin.to_string(),
        })?;
        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            search_api_key,
            search_endpoint: lookup("TAVILY_ENDPOINT").unwrap_or_else(|| TAVILY_API_URL.to_string()),
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.exists() {
        warn!("env file {} not found, using process environment", path.display());
        return Ok(HashMap::new());
    }
    let env_err = |source| ConfigError::EnvFile {
        path: path.display().to_string(),
        source,
    };
    dotenvy::from_path_iter(path)
        .map_err(env_err)?
        .map(|item| item.map_err(env_err))
        .collect()
}
