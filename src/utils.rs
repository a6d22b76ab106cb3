use std::path::PathBuf;

pub const DEFAULT_ENV_FILE: &str = ".env.local";

/// Env file holding the service secrets; `ENV_FILE` overrides the default.
pub fn env_file_path() -> PathBuf {
    std::env::var("ENV_FILE")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE))
}
