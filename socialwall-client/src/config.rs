use crate::render::AvatarPolicy;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".socialwall")
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct Env {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Where the local profile is stored.
    #[serde(default = "default_data_dir")]
    pub socialwall_data_dir: PathBuf,
    #[serde(default)]
    pub socialwall_avatar_policy: AvatarPolicy,
}

/// Reads `.env` if there is one, then the process environment.
pub fn get_env() -> Result<Env, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(ConfigError::from)
}
