//! Billing operations on an organization.
//!
//! These are the organization-level operations behind the billing endpoints:
//! - Retrieve the deposit account of a provider
//! - Retrieve, update and delete the card on file of a subscriber
//! - Fetch the payment context needed to start a card replacement
//!
//! Every operation is a single pass to the processor. Nothing is retried and
//! nothing but the processor customer reference is stored locally.

use crate::{
    error::AppError,
    models::billing::{BankAccount, Card, CardToken, PaymentContext},
    models::organization::Organization,
    processors::{ProcessorBackend, ProcessorError},
    services::organization_store::OrganizationStore,
};

/// Deposit account summary of a provider.
///
/// Providers without a deposit account get the `N/A` placeholder and the
/// processor is not called.
pub async fn retrieve_bank(
    processor: &dyn ProcessorBackend,
    provider: &Organization,
    broker: &Organization,
) -> Result<BankAccount, ProcessorError> {
    if provider.processor_deposit_key.is_none() {
        return Ok(BankAccount::not_available());
    }
    processor.retrieve_bank(provider, broker).await
}

/// Card on file of a subscriber.
pub async fn retrieve_card(
    processor: &dyn ProcessorBackend,
    organization: &Organization,
    broker: &Organization,
) -> Result<Card, ProcessorError> {
    processor.retrieve_card(organization, broker).await
}

/// Payment context for replacing the card of `organization`.
///
/// The broker acts as both provider and broker: cards are held on the
/// platform account.
pub async fn payment_context(
    processor: &dyn ProcessorBackend,
    organization: &Organization,
    broker: &Organization,
) -> Result<PaymentContext, ProcessorError> {
    processor
        .get_payment_context(organization, broker, broker)
        .await
}

/// Replace the card on file with the payment method behind `token`.
///
/// # Process
///
/// 1. Ask the processor to attach the payment method
/// 2. Store the processor customer reference if it changed
/// 3. Emit an `update-card` audit event
///
/// # Errors
///
/// - `Processor(Rejected)`: the processor refused the token
/// - `Processor(_)`: any other processor failure
/// - `Database`: the customer reference could not be stored. The processor
///   already holds the card under that customer, so the reference is logged
///   at `error` for reconciliation.
pub async fn update_card(
    store: &dyn OrganizationStore,
    processor: &dyn ProcessorBackend,
    organization: &Organization,
    token: &CardToken,
    actor: &str,
    broker: &Organization,
) -> Result<Card, AppError> {
    let update = processor
        .create_or_update_card(organization, token, actor, broker)
        .await?;

    if organization.processor_card_key.as_deref() != Some(update.customer_key.as_str()) {
        if let Err(err) = store
            .set_processor_card_key(organization.id, &update.customer_key)
            .await
        {
            tracing::error!(
                event = "update-card",
                organization = %organization.slug,
                user = actor,
                processor_card_key = %update.customer_key,
                error = %err,
                "processor customer created but its reference was not stored"
            );
            return Err(err.into());
        }
    }

    tracing::info!(
        event = "update-card",
        organization = %organization.slug,
        user = actor,
        processor_card_key = %update.customer_key,
        "{} updated card information.",
        actor
    );

    Ok(update.card)
}

/// Remove the card on file. Succeeds when there is none.
pub async fn delete_card(
    processor: &dyn ProcessorBackend,
    organization: &Organization,
    actor: &str,
    broker: &Organization,
) -> Result<(), ProcessorError> {
    processor.delete_card(organization, broker).await?;

    tracing::info!(
        event = "delete-card",
        organization = %organization.slug,
        user = actor,
        "{} removed card information.",
        actor
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::billing::CardTokenRequest;
    use crate::processors::SandboxBackend;
    use crate::testing::{MemoryOrganizationStore, ScriptedProcessor};

    fn token(value: &str) -> CardToken {
        CardTokenRequest {
            token: value.to_string(),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn bank_placeholder_without_deposit_key() {
        let processor = ScriptedProcessor::default();
        let provider = Organization::fixture("cowork");

        let bank = retrieve_bank(&processor, &provider, &provider).await.unwrap();

        assert_eq!(bank, BankAccount::not_available());
        assert_eq!(processor.calls().await, Vec::<&str>::new());
    }

    #[tokio::test]
    async fn bank_from_processor_with_deposit_key() {
        let processor = ScriptedProcessor::default();
        let mut provider = Organization::fixture("cowork");
        provider.processor_deposit_key = Some("acct_1".into());

        retrieve_bank(&processor, &provider, &provider).await.unwrap();

        assert_eq!(processor.calls().await, vec!["retrieve_bank"]);
    }

    #[tokio::test]
    async fn first_card_stores_customer_reference() {
        let store = MemoryOrganizationStore::with(vec![Organization::fixture("xia")]);
        let processor = SandboxBackend::new();
        let broker = Organization::fixture("broker");
        let org = store.get("xia").await;

        let card = update_card(&store, &processor, &org, &token("tok_1234"), "alice", &broker)
            .await
            .unwrap();

        assert_eq!(card.last4.as_deref(), Some("1234"));
        let stored = store.get("xia").await;
        assert!(stored.processor_card_key.unwrap().starts_with("cus_sandbox_"));
    }

    #[tokio::test]
    async fn rejection_leaves_customer_reference_alone() {
        let store = MemoryOrganizationStore::with(vec![Organization::fixture("xia")]);
        let processor = ScriptedProcessor::rejecting("Card declined");
        let broker = Organization::fixture("broker");
        let org = store.get("xia").await;

        let err = update_card(&store, &processor, &org, &token("bad"), "alice", &broker)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Processor(ProcessorError::Rejected(_))));
        assert!(store.get("xia").await.processor_card_key.is_none());
    }

    #[tokio::test]
    async fn store_failure_after_processor_update_is_a_database_error() {
        let store =
            MemoryOrganizationStore::with(vec![Organization::fixture("xia")]).failing_writes();
        let processor = ScriptedProcessor::default();
        let broker = Organization::fixture("broker");
        let org = store.get("xia").await;

        let err = update_card(&store, &processor, &org, &token("tok_1234"), "alice", &broker)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(processor.calls().await, vec!["create_or_update_card"]);
        assert!(store.get("xia").await.processor_card_key.is_none());
    }

    #[tokio::test]
    async fn unchanged_customer_reference_is_not_rewritten() {
        let mut org = Organization::fixture("xia");
        org.processor_card_key = Some("cus_existing".into());
        let store = MemoryOrganizationStore::with(vec![org.clone()]).failing_writes();
        let processor = ScriptedProcessor::default();
        let broker = Organization::fixture("broker");

        let card = update_card(&store, &processor, &org, &token("tok_1234"), "alice", &broker)
            .await
            .unwrap();

        assert_eq!(card, Card::new("1234", 12, 2019));
    }
}
