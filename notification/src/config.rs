use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub bus_type: String,
    pub nats_url: String,
    pub host: String,
    pub port: u16,
    /// Selects `NotificationDedup` wiring: `inmemory` (default, loses its
    /// memory on restart) or `persistent` (backed by Postgres).
    pub dedup_backend: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            bus_type: env::var("BUS_TYPE").unwrap_or_else(|_| "inmemory".to_string()),
            nats_url: env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "8093".to_string()).parse()?,
            dedup_backend: env::var("DEDUP_BACKEND").unwrap_or_else(|_| "inmemory".to_string()),
        })
    }
}
