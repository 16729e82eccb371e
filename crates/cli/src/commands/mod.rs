//! Command implementations.

pub mod points;
pub mod seed;

use secrecy::ExposeSecret;
use thiserror::Error;

use clique_recicle_core::DraftError;
use clique_recicle_web::config::{ConfigError, SupabaseConfig};
use clique_recicle_web::gateway::{AccessToken, GatewayError, SupabaseClient};

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// Writes go around row-level security and need the service role key.
    #[error("Missing environment variable: SUPABASE_SERVICE_ROLE_KEY")]
    MissingServiceRoleKey,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("could not read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("seed entry {index} ({name}): {source}")]
    InvalidEntry {
        index: usize,
        name: String,
        #[source]
        source: DraftError,
    },

    #[error("backend: {0}")]
    Gateway(#[from] GatewayError),
}

/// Client for the configured Supabase project.
fn connect() -> Result<(SupabaseClient, SupabaseConfig), CommandError> {
    let config = SupabaseConfig::from_env()?;
    let client = SupabaseClient::new(&config)?;
    Ok((client, config))
}

/// Bearer token for privileged writes.
fn service_token(config: &SupabaseConfig) -> Result<AccessToken, CommandError> {
    config
        .service_role_key
        .as_ref()
        .map(|key| AccessToken::new(key.expose_secret()))
        .ok_or(CommandError::MissingServiceRoleKey)
}
