// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub ton_wallet: String,
    pub ton_api_key: String,
    pub ton_testnet: bool,
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// Missing `TELEGRAM_BOT_TOKEN` or `DATABASE_URL` is fatal: the process
    /// refuses to run. Everything else has a default.
    pub fn from_env() -> Self {
        dotenv().ok();

        let telegram_bot_token =
            env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN must be set");

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let ton_wallet = env::var("TON_WALLET").unwrap_or_default();

        let ton_api_key = env::var("TON_API_KEY").unwrap_or_default();

        let ton_testnet = env::var("TON_TESTNET")
            .map(|v| v == "true")
            .unwrap_or(false);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        Self {
            telegram_bot_token,
            database_url,
            ton_wallet,
            ton_api_key,
            ton_testnet,
            rust_log,
            port,
        }
    }
}
