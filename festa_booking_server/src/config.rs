use std::env;

use log::*;
use paymob_tools::PaymobConfig;

const DEFAULT_FBS_HOST: &str = "127.0.0.1";
const DEFAULT_FBS_PORT: u16 = 8460;
const DEFAULT_FBS_DATABASE_URL: &str = "sqlite://data/festa.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Endpoints and credentials for the Paymob payment gateway.
    pub paymob: PaymobConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FBS_HOST.to_string(),
            port: DEFAULT_FBS_PORT,
            database_url: DEFAULT_FBS_DATABASE_URL.to_string(),
            paymob: PaymobConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FBS_HOST").ok().unwrap_or_else(|| DEFAULT_FBS_HOST.into());
        let port = env::var("FBS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for FBS_PORT. {e} Using the default, {DEFAULT_FBS_PORT}, instead."
                    );
                    DEFAULT_FBS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FBS_PORT);
        let database_url = env::var("FBS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ FBS_DATABASE_URL is not set. Using the default, {DEFAULT_FBS_DATABASE_URL}, instead.");
            DEFAULT_FBS_DATABASE_URL.to_string()
        });
        let paymob = PaymobConfig::new_from_env_or_default();
        Self { host, port, database_url, paymob }
    }
}
