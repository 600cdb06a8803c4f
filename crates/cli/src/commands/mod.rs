//! Subcommand implementations.

pub mod asset;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use thiserror::Error;

use vitrine_server::db::RepositoryError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record store read or write failed.
    #[error("Record store error: {0}")]
    Repository(#[from] RepositoryError),

    /// No media host id can be derived from the URL.
    #[error("No asset id in URL: {0}")]
    Unresolvable(String),
}

/// Database URL, preferring `VITRINE_DATABASE_URL` over `DATABASE_URL`.
fn database_url() -> Result<SecretString, CliError> {
    dotenvy::dotenv().ok();

    std::env::var("VITRINE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("VITRINE_DATABASE_URL"))
}
