//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STRIPE_SECRET_KEY` - Stripe secret API key (`sk_...`)
//!
//! ## Optional
//! - `WOOLERY_HOST` - Bind address (default: 127.0.0.1)
//! - `WOOLERY_PORT` - Listen port, falls back to `PORT` (default: 5001)
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `WOOLERY_CURRENCY` - ISO currency code charged (default: usd)
//! - `WOOLERY_UNKNOWN_PRODUCT_POLICY` - `reject` (default) or `zero`
//! - `WOOLERY_ALLOWED_ORIGIN` - Storefront origin allowed by CORS (default: any)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry performance sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::pricing::UnknownProductPolicy;

const DEFAULT_PORT: &str = "5001";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Backend application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Stripe API configuration
    pub stripe: StripeConfig,
    /// Lowercase ISO 4217 code every intent is created in
    pub currency: String,
    /// How to price items whose id is not in the catalog
    pub unknown_product_policy: UnknownProductPolicy,
    /// Storefront origin allowed by CORS; `None` allows any origin
    pub allowed_origin: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Sentry performance tracing sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Stripe API configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (server-side only)
    pub secret_key: SecretString,
    /// API base URL, overridable for test doubles
    pub api_base: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the Stripe secret key fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env
            .or_default("WOOLERY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("WOOLERY_HOST".to_string(), e.to_string()))?;
        let port = env
            .optional("WOOLERY_PORT")
            .or_else(|| env.optional("PORT"))
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("WOOLERY_PORT".to_string(), e.to_string()))?;

        let stripe = StripeConfig {
            secret_key: env.stripe_key("STRIPE_SECRET_KEY", "sk_")?,
            api_base: env
                .or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        };

        let currency = env.or_default("WOOLERY_CURRENCY", "usd").to_lowercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidEnvVar(
                "WOOLERY_CURRENCY".to_string(),
                format!("'{currency}' is not a three-letter ISO 4217 code"),
            ));
        }

        let unknown_product_policy = env
            .or_default("WOOLERY_UNKNOWN_PRODUCT_POLICY", "reject")
            .parse::<UnknownProductPolicy>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("WOOLERY_UNKNOWN_PRODUCT_POLICY".to_string(), e)
            })?;

        let sentry_traces_sample_rate = env
            .or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_TRACES_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            stripe,
            currency,
            unknown_product_policy,
            allowed_origin: env.optional("WOOLERY_ALLOWED_ORIGIN"),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the usual required/optional/default accessors.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable, treating an empty value as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Load and validate a Stripe API key.
    fn stripe_key(&self, key: &str, prefix: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        if !value.starts_with(prefix) {
            return Err(ConfigError::InsecureSecret(
                key.to_string(),
                format!("must start with '{prefix}'"),
            ));
        }
        let secret = SecretString::from(value);
        validate_secret_strength(secret.expose_secret(), key)?;
        Ok(secret)
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are long random strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key from the Stripe dashboard."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "sk_test_51Hq9XkLmN0pQrStUvWxYz2AbCdEfGh";

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("sk_test_your-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("sk_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STRIPE_SECRET_KEY", TEST_KEY)]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5001");
        assert_eq!(config.currency, "usd");
        assert_eq!(config.unknown_product_policy, UnknownProductPolicy::Reject);
        assert_eq!(config.stripe.api_base, "https://api.stripe.com");
        assert!(config.allowed_origin.is_none());
    }

    #[test]
    fn test_port_falls_back_to_generic_port() {
        let config = load(&[("STRIPE_SECRET_KEY", TEST_KEY), ("PORT", "8080")]).unwrap();
        assert_eq!(config.port, 8080);

        let config = load(&[
            ("STRIPE_SECRET_KEY", TEST_KEY),
            ("PORT", "8080"),
            ("WOOLERY_PORT", "9090"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_missing_secret_key() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "STRIPE_SECRET_KEY"));
    }

    #[test]
    fn test_publishable_key_rejected_as_secret() {
        let err = load(&[("STRIPE_SECRET_KEY", "pk_test_51Hq9XkLmN0pQrStUvWxYz2AbCd")]).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_invalid_policy_and_currency() {
        let err = load(&[
            ("STRIPE_SECRET_KEY", TEST_KEY),
            ("WOOLERY_UNKNOWN_PRODUCT_POLICY", "ignore"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = load(&[("STRIPE_SECRET_KEY", TEST_KEY), ("WOOLERY_CURRENCY", "dollars")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_stripe_config_debug_redacts_secret() {
        let config = load(&[("STRIPE_SECRET_KEY", TEST_KEY)]).unwrap();
        let debug_output = format!("{:?}", config.stripe);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("api.stripe.com"));
        assert!(!debug_output.contains(TEST_KEY));
    }
}
