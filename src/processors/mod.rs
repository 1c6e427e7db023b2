//! Payment processor backends.
//!
//! Every call the billing endpoints make to the outside world goes through
//! the [`ProcessorBackend`] trait. Calls are single-shot: nothing here retries.

pub mod sandbox;
pub mod stripe;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, ProcessorKind};
use crate::models::billing::{BankAccount, Card, CardToken, CardUpdate, PaymentContext};
use crate::models::organization::Organization;

pub use sandbox::SandboxBackend;
pub use stripe::{StripeBackend, StripeConfig};

/// Failure reported by a processor backend.
///
/// `Rejected` means the processor looked at the request and refused it
/// (declined card, expired token, unknown payment method). That is the
/// caller's problem. Every other variant is ours.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// The processor refused the operation. The message is safe to show to
    /// the client.
    #[error("{0}")]
    Rejected(String),

    /// The processor could not be reached or the request timed out.
    #[error("processor unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The processor answered with something we do not understand, or
    /// refused our own credentials.
    #[error("unexpected processor response: {0}")]
    Unexpected(String),
}

/// Interface all payment processors implement.
///
/// The broker (platform owner) is passed explicitly to every call so that a
/// backend can decide which processor account to act on.
#[async_trait]
pub trait ProcessorBackend: Send + Sync {
    /// Short name used in logs and the health check.
    fn name(&self) -> &'static str;

    /// Deposit account summary of `provider`.
    ///
    /// Only called when `provider.processor_deposit_key` is set.
    async fn retrieve_bank(
        &self,
        provider: &Organization,
        broker: &Organization,
    ) -> Result<BankAccount, ProcessorError>;

    /// Default payment method of `organization`, or an empty card.
    async fn retrieve_card(
        &self,
        organization: &Organization,
        broker: &Organization,
    ) -> Result<Card, ProcessorError>;

    /// Attach the payment method behind `token` and make it the default,
    /// creating a processor customer if `organization` has none yet.
    ///
    /// `actor` is the authenticated username, recorded for audit only.
    async fn create_or_update_card(
        &self,
        organization: &Organization,
        token: &CardToken,
        actor: &str,
        broker: &Organization,
    ) -> Result<CardUpdate, ProcessorError>;

    /// Remove the payment method on file. Succeeds when there is none.
    async fn delete_card(
        &self,
        organization: &Organization,
        broker: &Organization,
    ) -> Result<(), ProcessorError>;

    /// Metadata a client needs to start a Strong Customer Authentication flow
    /// for replacing the card of `organization`.
    async fn get_payment_context(
        &self,
        organization: &Organization,
        provider: &Organization,
        broker: &Organization,
    ) -> Result<PaymentContext, ProcessorError>;
}

/// Build the processor backend selected by configuration.
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn ProcessorBackend>> {
    match config.processor_backend {
        ProcessorKind::Sandbox => Ok(Arc::new(SandboxBackend::new())),
        ProcessorKind::Stripe => {
            let secret_key = config.stripe_secret_key.clone().ok_or_else(|| {
                anyhow::anyhow!("STRIPE_SECRET_KEY is required when PROCESSOR_BACKEND=stripe")
            })?;
            let pub_key = config.stripe_pub_key.clone().ok_or_else(|| {
                anyhow::anyhow!("STRIPE_PUB_KEY is required when PROCESSOR_BACKEND=stripe")
            })?;
            let backend = StripeBackend::new(StripeConfig {
                secret_key,
                pub_key,
                base_url: config.stripe_api_base.clone(),
                timeout_secs: config.processor_timeout_secs,
            })?;
            Ok(Arc::new(backend))
        }
    }
}
