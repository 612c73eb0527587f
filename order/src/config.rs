use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub bus_type: String,
    pub nats_url: String,
    pub host: String,
    pub port: u16,
    pub saga_timeout_ms: u64,
    pub saga_max_retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            bus_type: env::var("BUS_TYPE").unwrap_or_else(|_| "inmemory".to_string()),
            nats_url: env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "8090".to_string()).parse()?,
            saga_timeout_ms: env::var("SAGA_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()?,
            saga_max_retries: env::var("SAGA_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
        })
    }
}
