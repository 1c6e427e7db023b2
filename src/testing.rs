//! Test doubles for the organization store and the processor.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::billing::{BankAccount, Card, CardToken, CardUpdate, PaymentContext};
use crate::models::organization::Organization;
use crate::processors::{ProcessorBackend, ProcessorError};
use crate::services::organization_store::OrganizationStore;

#[derive(Default)]
pub struct MemoryOrganizationStore {
    organizations: RwLock<HashMap<String, Organization>>,
    /// Writes fail as if the pool were exhausted
    failing_writes: bool,
}

impl MemoryOrganizationStore {
    pub fn with(organizations: Vec<Organization>) -> Self {
        let map = organizations
            .into_iter()
            .map(|org| (org.slug.clone(), org))
            .collect();
        Self {
            organizations: RwLock::new(map),
            failing_writes: false,
        }
    }

    pub fn failing_writes(self) -> Self {
        Self {
            failing_writes: true,
            ..self
        }
    }

    pub async fn get(&self, slug: &str) -> Organization {
        self.organizations.read().await[slug].clone()
    }
}

#[async_trait]
impl OrganizationStore for MemoryOrganizationStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, sqlx::Error> {
        Ok(self.organizations.read().await.get(slug).cloned())
    }

    async fn set_processor_card_key(
        &self,
        organization_id: Uuid,
        processor_card_key: &str,
    ) -> Result<(), sqlx::Error> {
        if self.failing_writes {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut organizations = self.organizations.write().await;
        if let Some(org) = organizations.values_mut().find(|o| o.id == organization_id) {
            org.processor_card_key = Some(processor_card_key.to_string());
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

/// How the scripted processor answers.
#[derive(Debug, Clone, Default)]
enum Script {
    #[default]
    Accept,
    /// Card updates are refused with this reason
    Reject(String),
    /// Every call fails as a backend failure with this cause
    Fail(String),
}

/// Processor that answers from a script and records which calls it got.
#[derive(Default)]
pub struct ScriptedProcessor {
    script: Script,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedProcessor {
    pub fn rejecting(reason: &str) -> Self {
        Self {
            script: Script::Reject(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn failing(cause: &str) -> Self {
        Self {
            script: Script::Fail(cause.to_string()),
            ..Self::default()
        }
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: &'static str) -> Result<(), ProcessorError> {
        self.calls.lock().await.push(call);
        match &self.script {
            Script::Fail(cause) => Err(ProcessorError::Unexpected(cause.clone())),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ProcessorBackend for ScriptedProcessor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn retrieve_bank(
        &self,
        _provider: &Organization,
        _broker: &Organization,
    ) -> Result<BankAccount, ProcessorError> {
        self.record("retrieve_bank").await?;
        Ok(BankAccount {
            bank_name: "Stripe Test Bank".to_string(),
            last4: "***-htrTZ".to_string(),
            balance_amount: 0,
            balance_unit: "usd".to_string(),
        })
    }

    async fn retrieve_card(
        &self,
        _organization: &Organization,
        _broker: &Organization,
    ) -> Result<Card, ProcessorError> {
        self.record("retrieve_card").await?;
        Ok(Card::new("1234", 12, 2019))
    }

    async fn create_or_update_card(
        &self,
        organization: &Organization,
        _token: &CardToken,
        _actor: &str,
        _broker: &Organization,
    ) -> Result<CardUpdate, ProcessorError> {
        self.record("create_or_update_card").await?;
        if let Script::Reject(reason) = &self.script {
            return Err(ProcessorError::Rejected(reason.clone()));
        }
        Ok(CardUpdate {
            card: Card::new("1234", 12, 2019),
            customer_key: organization
                .processor_card_key
                .clone()
                .unwrap_or_else(|| "cus_scripted".to_string()),
        })
    }

    async fn delete_card(
        &self,
        _organization: &Organization,
        _broker: &Organization,
    ) -> Result<(), ProcessorError> {
        self.record("delete_card").await
    }

    async fn get_payment_context(
        &self,
        _organization: &Organization,
        _provider: &Organization,
        _broker: &Organization,
    ) -> Result<PaymentContext, ProcessorError> {
        self.record("get_payment_context").await?;
        Ok(PaymentContext::new().with("STRIPE_INTENT_SECRET", "seti_scripted_secret"))
    }
}
