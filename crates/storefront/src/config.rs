//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_API_BASE` - Checkout API base URL (default: `https://api.seattletrading.org`)
//! - `STOREFRONT_ORIGIN` - Public origin of the storefront (default: `http://127.0.0.1:5500`)
//! - `STOREFRONT_CONFIRMATION_URL` - Order confirmation page (default: `{origin}/thank-you.html`)
//! - `STOREFRONT_STORAGE_DIR` - Directory for persisted client state (default: `.seattle-trading`)
//! - `STOREFRONT_CATALOG_PATH` - Product catalog JSON (default: `crates/storefront/data/catalog.json`)
//! - `STOREFRONT_REQUEST_TIMEOUT_SECS` - Checkout API request timeout
//! - `STRIPE_PUBLISHABLE_KEY` - Payment provider publishable key (`pk_...`); required to pay
//! - `STRIPE_API_BASE` - Payment provider API base (default: `https://api.stripe.com`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE: &str = "https://api.seattletrading.org";
const DEFAULT_ORIGIN: &str = "http://127.0.0.1:5500";
const DEFAULT_CONFIRMATION_PAGE: &str = "thank-you.html";
const DEFAULT_STORAGE_DIR: &str = ".seattle-trading";
const DEFAULT_CATALOG_PATH: &str = "crates/storefront/data/catalog.json";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

const PUBLISHABLE_KEY_PREFIX: &str = "pk_";
const SECRET_KEY_PREFIXES: &[&str] = &["sk_", "rk_"];
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
    #[error("Insecure key in {0}: {1}")]
    InsecureKey(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Checkout API settings
    pub api: ApiConfig,
    /// Public origin of the storefront
    pub origin: Url,
    /// Page the buyer lands on after a confirmed payment
    pub confirmation_url: Url,
    /// Directory holding persisted client state
    pub storage_dir: PathBuf,
    /// Product catalog file
    pub catalog_path: PathBuf,
    /// Payment provider settings, if a publishable key is configured
    pub stripe: Option<StripeConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Checkout API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are joined onto it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

/// Payment provider configuration.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct StripeConfig {
    /// Publishable key (`pk_test_...` or `pk_live_...`)
    pub publishable_key: SecretString,
    /// API base URL
    pub api_base: Url,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("publishable_key", &"[REDACTED]")
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

impl StripeConfig {
    /// Whether the key is a test-mode key.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.publishable_key.expose_secret().starts_with("pk_test_")
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the payment key
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api = ApiConfig {
            base_url: get_url(&env, "STOREFRONT_API_BASE", DEFAULT_API_BASE)?,
            timeout: get_timeout(&env, "STOREFRONT_REQUEST_TIMEOUT_SECS")?,
        };

        let origin = get_url(&env, "STOREFRONT_ORIGIN", DEFAULT_ORIGIN)?;
        let confirmation_url = match get_optional_env(&env, "STOREFRONT_CONFIRMATION_URL") {
            Some(raw) => parse_url("STOREFRONT_CONFIRMATION_URL", &raw)?,
            None => origin.join(DEFAULT_CONFIRMATION_PAGE).map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_ORIGIN".to_string(), e.to_string())
            })?,
        };

        let storage_dir =
            PathBuf::from(get_env_or_default(&env, "STOREFRONT_STORAGE_DIR", DEFAULT_STORAGE_DIR));
        let catalog_path =
            PathBuf::from(get_env_or_default(&env, "STOREFRONT_CATALOG_PATH", DEFAULT_CATALOG_PATH));

        let stripe = StripeConfig::from_lookup(&env)?;

        Ok(Self {
            api,
            origin,
            confirmation_url,
            storage_dir,
            catalog_path,
            stripe,
            sentry_dsn: get_optional_env(&env, "SENTRY_DSN"),
            sentry_environment: get_optional_env(&env, "SENTRY_ENVIRONMENT"),
        })
    }

    /// The payment provider configuration, or an error naming the missing key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no publishable key is set.
    pub fn require_stripe(&self) -> Result<&StripeConfig, ConfigError> {
        self.stripe
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("STRIPE_PUBLISHABLE_KEY".to_string()))
    }
}

impl StripeConfig {
    fn from_lookup<F>(env: &F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(key) = get_optional_env(env, "STRIPE_PUBLISHABLE_KEY") else {
            return Ok(None);
        };
        validate_publishable_key(&key, "STRIPE_PUBLISHABLE_KEY")?;

        Ok(Some(Self {
            publishable_key: SecretString::from(key),
            api_base: get_url(env, "STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE)?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable. Blank values count as unset.
fn get_optional_env<F>(env: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get a variable with a default value.
fn get_env_or_default<F>(env: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Get a URL variable with a default value.
fn get_url<F>(env: &F, key: &str, default: &str) -> Result<Url, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_url(key, &get_env_or_default(env, key, default))
}

/// Get an optional timeout in whole seconds. Zero disables the timeout.
fn get_timeout<F>(env: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = get_optional_env(env, key) else {
        return Ok(None);
    };
    let secs = raw
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
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

/// Validate that a key is publishable, not a placeholder, and looks random.
fn validate_publishable_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    if SECRET_KEY_PREFIXES.iter().any(|p| key.starts_with(p)) {
        return Err(ConfigError::InsecureKey(
            var_name.to_string(),
            "is a secret key; only publishable keys (pk_...) may be used client-side".to_string(),
        ));
    }
    if !key.starts_with(PUBLISHABLE_KEY_PREFIX) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must start with '{PUBLISHABLE_KEY_PREFIX}'"),
        ));
    }

    let lower = key.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureKey(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(key);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureKey(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
