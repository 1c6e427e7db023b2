//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use url::Url;

/// Which payment processor the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    /// Stripe REST API
    Stripe,
    /// In-memory processor for local development
    Sandbox,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `BROKER_SLUG` (required): slug of the organization that owns the platform
/// - `ACTOR_HEADER` (optional): header carrying the authenticated username,
///   defaults to `x-forwarded-user`
/// - `PROCESSOR_BACKEND` (optional): `stripe` or `sandbox`, defaults to `sandbox`
/// - `STRIPE_SECRET_KEY` / `STRIPE_PUB_KEY`: required when the backend is `stripe`
/// - `STRIPE_API_BASE` (optional): defaults to `https://api.stripe.com`
/// - `PROCESSOR_TIMEOUT_SECS` (optional): defaults to 30
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub broker_slug: String,

    #[serde(default = "default_actor_header")]
    pub actor_header: String,

    #[serde(default = "default_processor")]
    pub processor_backend: ProcessorKind,

    pub stripe_secret_key: Option<String>,

    pub stripe_pub_key: Option<String>,

    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: Url,

    #[serde(default = "default_timeout")]
    pub processor_timeout_secs: u64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_actor_header() -> String {
    "x-forwarded-user".to_string()
}

fn default_processor() -> ProcessorKind {
    ProcessorKind::Sandbox
}

fn default_stripe_api_base() -> Url {
    Url::parse("https://api.stripe.com").expect("static URL is valid")
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, BROKER_SLUG)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are automatically converted: broker_slug -> BROKER_SLUG
        envy::from_env::<Config>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config: Config = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/billing"),
            ("BROKER_SLUG", "cowork"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.actor_header, "x-forwarded-user");
        assert_eq!(config.processor_backend, ProcessorKind::Sandbox);
        assert_eq!(config.stripe_api_base.as_str(), "https://api.stripe.com/");
        assert_eq!(config.processor_timeout_secs, 30);
        assert!(config.stripe_secret_key.is_none());
    }

    #[test]
    fn stripe_settings_are_read() {
        let config: Config = envy::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/billing"),
            ("BROKER_SLUG", "cowork"),
            ("PROCESSOR_BACKEND", "stripe"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_PUB_KEY", "pk_test_123"),
            ("STRIPE_API_BASE", "http://127.0.0.1:12111"),
            ("PROCESSOR_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.processor_backend, ProcessorKind::Stripe);
        assert_eq!(config.stripe_secret_key.as_deref(), Some("sk_test_123"));
        assert_eq!(config.stripe_api_base.port(), Some(12111));
        assert_eq!(config.processor_timeout_secs, 5);
    }

    #[test]
    fn missing_broker_is_an_error() {
        let result = envy::from_iter::<_, Config>(vars(&[(
            "DATABASE_URL",
            "postgres://localhost/billing",
        )]));
        assert!(result.is_err());
    }
}
