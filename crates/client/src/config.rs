//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `WOOLERY_API_URL` - Backend base URL (default: <http://localhost:5001>)
//! - `STRIPE_PUBLISHABLE_KEY` - Stripe publishable key (`pk_...`), needed to pay
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `WOOLERY_DATA_DIR` - Directory the cart is saved in (default: `.woolery`)
//! - `WOOLERY_STOREFRONT_URL` - Storefront base URL; payments return to
//!   `<url>/completion` (default: <http://localhost:3000>)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5001";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_DATA_DIR: &str = ".woolery";
const DEFAULT_STOREFRONT_URL: &str = "http://localhost:3000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL
    pub api_url: Url,
    /// Publishable key for confirming payments; absent disables paying
    pub publishable_key: Option<String>,
    /// Stripe API base URL
    pub stripe_api_base: String,
    /// Directory holding the saved cart
    pub data_dir: PathBuf,
    /// Storefront base URL
    pub storefront_url: Url,
}

impl ClientConfig {
    /// Load configuration from environment variables, reading `.env` first.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a URL or key is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let url = |key: &str, default: &str| {
            let raw = get(key).unwrap_or_else(|| default.to_string());
            Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        };

        let publishable_key = get("STRIPE_PUBLISHABLE_KEY");
        if let Some(key) = &publishable_key
            && !key.starts_with("pk_")
        {
            return Err(ConfigError::InvalidEnvVar(
                "STRIPE_PUBLISHABLE_KEY".to_string(),
                "must start with 'pk_'".to_string(),
            ));
        }

        Ok(Self {
            api_url: url("WOOLERY_API_URL", DEFAULT_API_URL)?,
            publishable_key,
            stripe_api_base: get("STRIPE_API_BASE")
                .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            data_dir: get("WOOLERY_DATA_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
            storefront_url: url("WOOLERY_STOREFRONT_URL", DEFAULT_STOREFRONT_URL)?,
        })
    }

    /// Where the payment processor sends the shopper after payment.
    #[must_use]
    pub fn return_url(&self) -> String {
        format!(
            "{}/completion",
            self.storefront_url.as_str().trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:5001/");
        assert!(config.publishable_key.is_none());
        assert_eq!(config.data_dir, PathBuf::from(".woolery"));
        assert_eq!(config.return_url(), "http://localhost:3000/completion");
    }

    #[test]
    fn test_return_url_follows_storefront() {
        let config = load(&[("WOOLERY_STOREFRONT_URL", "https://shop.example/")]).unwrap();
        assert_eq!(config.return_url(), "https://shop.example/completion");
    }

    #[test]
    fn test_secret_key_rejected_as_publishable() {
        let err = load(&[("STRIPE_PUBLISHABLE_KEY", "sk_test_abc")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STRIPE_PUBLISHABLE_KEY"));
    }

    #[test]
    fn test_invalid_api_url() {
        let err = load(&[("WOOLERY_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "WOOLERY_API_URL"));
    }
}
