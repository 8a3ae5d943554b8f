//! Environment-driven configuration. No config-file parser and no CLI flag
//! parsing — both remain out of scope (spec.md §1) — this just reads the
//! handful of env vars the service needs, the same shape
//! `twzrd-aggregator-rs::main` uses for `HOST`/`PORT`/`DATABASE_URL`.

use crate::errors::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub node_url: String,
    pub node_api_key: String,
    pub wallet_pass: String,
    pub explorer_url: String,
    pub oracle_address: String,
    pub roulette_ergo_tree: String,
    pub house_address: String,

    pub kv_url: String,
    pub bus_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let node_url = require("NODE_URL")?;
        let node_api_key = require("NODE_API_KEY")?;
        let wallet_pass = require("WALLET_PASS")?;
        let explorer_url = require("EXPLORER_URL")?;
        let oracle_address = require("ORACLE_ADDRESS")?;
        let roulette_ergo_tree = require("ROULETTE_ERGO_TREE")?;
        let house_address = require("HOUSE_ADDRESS")?;

        let kv_url = std::env::var("KV_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
        let bus_url =
            std::env::var("BUS_URL").unwrap_or_else(|_| "nats://127.0.0.1:4222".into());

        Ok(Self {
            host,
            port,
            node_url,
            node_api_key,
            wallet_pass,
            explorer_url,
            oracle_address,
            roulette_ergo_tree,
            house_address,
            kv_url,
            bus_url,
        })
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}
