use anyhow::{Context, Result, bail};
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub aggregator_url: String,
    pub aggregator_api_key: String,
    pub geo_url: String,
    pub crm_url: String,
    pub crm_token: String,
    pub mail_url: String,
    pub mail_token: String,
    pub mail_from: String,
    pub admin_email: String,
    pub http_timeout_secs: u64,
    pub mail_timeout_secs: u64,
    pub notify_max_attempts: u32,
    pub notify_backoff_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `TERMINAL_API_URL`: Optional - Shipping aggregator base URL (default: "https://api.terminal.africa/v1")
    /// - `TERMINAL_API_KEY`: Required - Shipping aggregator API key
    /// - `GEO_API_URL`: Optional - Geography service base URL (default: aggregator URL)
    /// - `CRM_API_URL`: Required - CRM records base URL
    /// - `CRM_API_TOKEN`: Required - CRM OAuth token
    /// - `MAIL_API_URL`: Required - Transactional mail base URL
    /// - `MAIL_API_TOKEN`: Required - Mail service token
    /// - `MAIL_FROM_ADDRESS`: Required - From address for outbound mail
    /// - `ADMIN_EMAIL`: Required - Recipient of administrative notifications
    /// - `HTTP_TIMEOUT_SECS`: Optional - Aggregator/CRM/geo timeout (default: 30)
    /// - `MAIL_TIMEOUT_SECS`: Optional - Mail timeout, uploads included (default: 60)
    /// - `NOTIFY_MAX_ATTEMPTS`: Optional - Notification retry bound (default: 3)
    /// - `NOTIFY_BACKOFF_MS`: Optional - Linear backoff unit in ms (default: 500)
    pub fn from_env() -> Result<Self> {
        let aggregator_url = optional("TERMINAL_API_URL", "https://api.terminal.africa/v1");
        let aggregator_api_key = required("TERMINAL_API_KEY")?;
        let geo_url = optional("GEO_API_URL", &aggregator_url);
        let crm_url = required("CRM_API_URL")?;
        let crm_token = required("CRM_API_TOKEN")?;
        let mail_url = required("MAIL_API_URL")?;
        let mail_token = required("MAIL_API_TOKEN")?;
        let mail_from = required("MAIL_FROM_ADDRESS")?;
        let admin_email = required("ADMIN_EMAIL")?;
        let http_timeout_secs = numeric("HTTP_TIMEOUT_SECS", 30)?;
        let mail_timeout_secs = numeric("MAIL_TIMEOUT_SECS", 60)?;
        let notify_max_attempts = numeric("NOTIFY_MAX_ATTEMPTS", 3)? as u32;
        let notify_backoff_ms = numeric("NOTIFY_BACKOFF_MS", 500)?;

        if notify_max_attempts == 0 {
            bail!("NOTIFY_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Config {
            aggregator_url,
            aggregator_api_key,
            geo_url,
            crm_url,
            crm_token,
            mail_url,
            mail_token,
            mail_from,
            admin_email,
            http_timeout_secs,
            mail_timeout_secs,
            notify_max_attempts,
            notify_backoff_ms,
        })
    }
}

fn required(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{} not set", name))?;

    if value.trim().is_empty() {
        bail!("{} cannot be empty", name);
    }

    Ok(value)
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn numeric(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{} must be a positive integer", name)),
        _ => Ok(default),
    }
}
