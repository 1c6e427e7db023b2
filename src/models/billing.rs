//! Billing read views and API request/response types.
//!
//! This module defines:
//! - `BankAccount`, `Card`: read views fetched fresh from the processor
//! - `CardToken`, `CardUpdate`, `PaymentContext`: processor exchange types
//! - Request and response bodies for the `/billing/{organization}` endpoints
//!
//! None of these are persisted. The processor is the source of truth.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Confirmation returned after a successful card update.
pub const CARD_UPDATED: &str = "Your credit card on file was sucessfully updated.";

/// Confirmation returned after a card deletion, whether or not a card existed.
pub const CARD_DELETED: &str = "Your credit card is no longer on file with us.";

/// Deposit account summary for a provider.
///
/// # JSON Example
///
/// ```json
/// {
///   "bank_name": "Stripe Test Bank",
///   "last4": "***-htrTZ",
///   "balance_amount": 0,
///   "balance_unit": "usd"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub bank_name: String,

    /// Masked account suffix
    pub last4: String,

    /// Available balance in the smallest currency unit
    pub balance_amount: i64,

    /// Currency code of the balance
    pub balance_unit: String,
}

impl BankAccount {
    /// Placeholder shown for providers without a deposit account.
    pub fn not_available() -> Self {
        Self {
            bank_name: "N/A".to_string(),
            last4: "N/A".to_string(),
            balance_amount: 0,
            balance_unit: "usd".to_string(),
        }
    }
}

/// Payment method on file for a subscriber.
///
/// Both fields are `null` when no card is on file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Masked card suffix
    pub last4: Option<String>,

    /// Expiration date formatted as `MM/YYYY`
    pub exp_date: Option<String>,
}

impl Card {
    pub fn new(last4: impl Into<String>, exp_month: u32, exp_year: u32) -> Self {
        Self {
            last4: Some(last4.into()),
            exp_date: Some(format!("{:02}/{:04}", exp_month, exp_year)),
        }
    }

    /// No card on file.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Opaque, single-use token issued by the processor for a new payment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardToken(String);

impl CardToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a raw value without validation.
    #[cfg(test)]
    pub fn unchecked(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Result of attaching a new payment method at the processor.
#[derive(Debug, Clone)]
pub struct CardUpdate {
    /// The card now on file
    pub card: Card,

    /// Processor customer reference holding the card
    ///
    /// Differs from the organization's stored reference when the processor
    /// had to create a customer.
    pub customer_key: String,
}

/// Processor-specific metadata a client needs to start an SCA-gated update.
///
/// Kept as an opaque JSON object because each processor returns different
/// keys (e.g. `STRIPE_PUB_KEY`, `STRIPE_INTENT_SECRET`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PaymentContext(Map<String, Value>);

impl PaymentContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key to the context, builder style.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Request body for `PUT /billing/{organization}/card`.
///
/// # JSON Example
///
/// ```json
/// {
///   "token": "xyz"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CardTokenRequest {
    pub token: String,
}

impl CardTokenRequest {
    /// Check the token is usable before calling the processor.
    ///
    /// Processor tokens are ASCII alphanumerics and underscores
    /// (`tok_visa`, `pm_1Nx...`). Anything else never reaches the processor.
    pub fn validate(self) -> Result<CardToken, String> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err("token: This field may not be blank.".to_string());
        }
        if !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err("token: Enter a valid processor token.".to_string());
        }
        Ok(CardToken(token.to_string()))
    }
}

/// Query string for `GET /billing/{organization}/card`.
#[derive(Debug, Default, Deserialize)]
pub struct CardQuery {
    pub update: Option<String>,
}

impl CardQuery {
    /// Whether the caller is starting a card replacement flow.
    ///
    /// Any value other than empty, `0`, `false`, `no` or `off` counts.
    pub fn wants_update(&self) -> bool {
        match self.update.as_deref() {
            None => false,
            Some(value) => !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "" | "0" | "false" | "no" | "off"
            ),
        }
    }
}

/// Response body for `GET /billing/{organization}/card`.
///
/// ```json
/// {
///   "last4": "1234",
///   "exp_date": "12/2019",
///   "processor": { "STRIPE_INTENT_SECRET": "seti_..._secret_..." }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct CardResponse {
    #[serde(flatten)]
    pub card: Card,

    /// Only present when `?update=1` was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor: Option<PaymentContext>,
}

/// Response body for a successful card update.
#[derive(Debug, Serialize)]
pub struct CardUpdatedResponse {
    #[serde(flatten)]
    pub card: Card,

    pub detail: String,
}

/// Response body carrying only a confirmation message.
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: String,
}
