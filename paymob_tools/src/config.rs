use std::time::Duration;

use festa_common::Secret;
use log::*;

pub const DEFAULT_PAYMOB_BASE_URL: &str = "https://accept.paymob.com/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct PaymobConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub integration_id: String,
    pub iframe_id: String,
    pub timeout: Duration,
}

impl Default for PaymobConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PAYMOB_BASE_URL.to_string(),
            api_key: Secret::new(String::new()),
            integration_id: "0".to_string(),
            iframe_id: "0".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl PaymobConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("PAYMOB_BASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ PAYMOB_BASE_URL not set, using {DEFAULT_PAYMOB_BASE_URL}");
            DEFAULT_PAYMOB_BASE_URL.to_string()
        });
        let base_url = base_url.trim_end_matches('/').to_string();
        let api_key = Secret::new(std::env::var("PAYMOB_API_KEY").unwrap_or_else(|_| {
            error!("🪛️ PAYMOB_API_KEY is not set. Paymob will reject every call until it is configured.");
            String::new()
        }));
        let integration_id = std::env::var("PAYMOB_INTEGRATION_ID").unwrap_or_else(|_| {
            warn!("🪛️ PAYMOB_INTEGRATION_ID not set, using (probably useless) default");
            "0".to_string()
        });
        let iframe_id = std::env::var("PAYMOB_IFRAME_ID").unwrap_or_else(|_| {
            warn!("🪛️ PAYMOB_IFRAME_ID not set, using (probably useless) default");
            "0".to_string()
        });
        let timeout = std::env::var("PAYMOB_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| {
                info!("🪛️ PAYMOB_TIMEOUT_SECS not set, using {DEFAULT_TIMEOUT_SECS}s");
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            });
        Self { base_url, api_key, integration_id, iframe_id, timeout }
    }
}
