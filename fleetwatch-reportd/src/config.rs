//! Report worker configuration

/// Report worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string, handed down by the supervising server
    pub database_url: String,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - DATABASE_URL (required; the server sets it when spawning a worker)
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;

        Ok(Self { database_url })
    }
}
