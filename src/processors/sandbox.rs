//! In-memory processor for local development and demos.
//!
//! Cards live in process memory and disappear on restart. Tokens containing
//! `declined` are refused the way a real processor refuses a declined card.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ProcessorBackend, ProcessorError};
use crate::models::billing::{BankAccount, Card, CardToken, CardUpdate, PaymentContext};
use crate::models::organization::Organization;

const DECLINED: &str = "Your card was declined.";

#[derive(Debug, Default)]
pub struct SandboxBackend {
    /// Default card per customer reference
    cards: Mutex<HashMap<String, Card>>,
}

impl SandboxBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Last `n` characters of `value`.
fn suffix(value: &str, n: usize) -> String {
    let start = value.char_indices().rev().nth(n.saturating_sub(1)).map_or(0, |(i, _)| i);
    value[start..].to_string()
}

/// Card details derived from a sandbox token.
///
/// The trailing four digits of the token become `last4`, so `tok_1234`
/// yields a card ending in 1234.
fn card_for_token(token: &str) -> Card {
    let tail = suffix(token, 4);
    let last4 = if tail.len() == 4 && tail.chars().all(|c| c.is_ascii_digit()) {
        tail
    } else {
        "4242".to_string()
    };
    Card::new(last4, 12, 2030)
}

#[async_trait]
impl ProcessorBackend for SandboxBackend {
    fn name(&self) -> &'static str {
        "sandbox"
    }

    async fn retrieve_bank(
        &self,
        provider: &Organization,
        _broker: &Organization,
    ) -> Result<BankAccount, ProcessorError> {
        let deposit_key = provider.processor_deposit_key.as_deref().unwrap_or_default();
        Ok(BankAccount {
            bank_name: "Sandbox Test Bank".to_string(),
            last4: format!("***-{}", suffix(deposit_key, 5)),
            balance_amount: 0,
            balance_unit: "usd".to_string(),
        })
    }

    async fn retrieve_card(
        &self,
        organization: &Organization,
        _broker: &Organization,
    ) -> Result<Card, ProcessorError> {
        let Some(customer) = organization.processor_card_key.as_deref() else {
            return Ok(Card::none());
        };
        let cards = self.cards.lock().await;
        Ok(cards.get(customer).cloned().unwrap_or_default())
    }

    async fn create_or_update_card(
        &self,
        organization: &Organization,
        token: &CardToken,
        actor: &str,
        _broker: &Organization,
    ) -> Result<CardUpdate, ProcessorError> {
        if token.as_str().to_ascii_lowercase().contains("declined") {
            return Err(ProcessorError::Rejected(DECLINED.to_string()));
        }

        let customer_key = organization
            .processor_card_key
            .clone()
            .unwrap_or_else(|| format!("cus_sandbox_{}", Uuid::new_v4().simple()));
        let card = card_for_token(token.as_str());

        tracing::debug!(customer = %customer_key, user = actor, "sandbox card attached");
        self.cards
            .lock()
            .await
            .insert(customer_key.clone(), card.clone());

        Ok(CardUpdate { card, customer_key })
    }

    async fn delete_card(
        &self,
        organization: &Organization,
        _broker: &Organization,
    ) -> Result<(), ProcessorError> {
        if let Some(customer) = organization.processor_card_key.as_deref() {
            self.cards.lock().await.remove(customer);
        }
        Ok(())
    }

    async fn get_payment_context(
        &self,
        _organization: &Organization,
        provider: &Organization,
        broker: &Organization,
    ) -> Result<PaymentContext, ProcessorError> {
        let mut context = PaymentContext::new().with(
            "SANDBOX_INTENT_SECRET",
            format!("seti_sandbox_{}_secret", Uuid::new_v4().simple()),
        );
        if !provider.is(broker) {
            if let Some(account) = &provider.processor_deposit_key {
                context = context.with("SANDBOX_ACCOUNT", account.as_str());
            }
        }
        Ok(context)
    }
}
