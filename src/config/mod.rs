use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub production: bool,
}

impl Config {
    /// Reads configuration from the environment. A missing `JWT_SECRET` or
    /// `DATABASE_URL` is fatal: tokens signed with an ad hoc secret would be
    /// unverifiable by other processes.
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let token_expiration = env::var("TOKEN_EXPIRATION_HOURS")
            .ok()
            .and_then(|v| v.trim_end_matches('h').parse::<u64>().ok())
            .unwrap_or(2);

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            token_expiration_secs: token_expiration * 3600,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            production: env::var("APP_ENV").map(|v| v == "production").unwrap_or(false),
        })
    }

    pub fn token_expiration(&self) -> Duration {
        Duration::from_secs(self.token_expiration_secs)
    }
}
