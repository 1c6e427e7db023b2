//! Stripe processor backend.
//!
//! Cards are stored as PaymentMethods attached to a Stripe Customer, whose id
//! is the organization's `processor_card_key`. Provider payouts go to Stripe
//! Connect accounts, whose id is the organization's `processor_deposit_key`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{ProcessorBackend, ProcessorError};
use crate::models::billing::{BankAccount, Card, CardToken, CardUpdate, PaymentContext};
use crate::models::organization::Organization;

/// Stripe API credentials and transport settings.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret key used as bearer token
    pub secret_key: String,
    /// Publishable key handed to browsers in the payment context
    pub pub_key: String,
    /// API base URL (https://api.stripe.com in production)
    pub base_url: Url,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

pub struct StripeBackend {
    config: StripeConfig,
    client: Client,
}

/// Error envelope Stripe returns with every non-2xx response.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Customer {
    id: String,
    #[serde(default)]
    deleted: bool,
    invoice_settings: Option<InvoiceSettings>,
}

#[derive(Debug, Deserialize)]
struct InvoiceSettings {
    default_payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethod {
    id: String,
    card: Option<PaymentMethodCard>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodCard {
    last4: String,
    exp_month: u32,
    exp_year: u32,
}

impl PaymentMethod {
    fn into_card(self) -> Card {
        match self.card {
            Some(card) => Card::new(card.last4, card.exp_month, card.exp_year),
            None => Card::none(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct List<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Account {
    external_accounts: Option<List<ExternalBankAccount>>,
}

#[derive(Debug, Deserialize)]
struct ExternalBankAccount {
    bank_name: Option<String>,
    last4: String,
}

#[derive(Debug, Deserialize)]
struct Balance {
    available: Vec<BalanceAmount>,
}

#[derive(Debug, Deserialize)]
struct BalanceAmount {
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct SetupIntent {
    client_secret: String,
}

/// Classify a non-2xx Stripe response.
///
/// Card and request errors are about what the client sent us. Bad
/// credentials, rate limiting and server errors are about us, even when
/// Stripe labels them `invalid_request_error`.
fn error_from_response(status: StatusCode, body: &str) -> ProcessorError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return ProcessorError::Unexpected(format!("{} with undecodable body", status));
    };
    let ErrorBody { kind, message } = envelope.error;

    let ours = matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );
    let client_kind = matches!(kind.as_str(), "card_error" | "invalid_request_error");

    if status.is_client_error() && client_kind && !ours {
        ProcessorError::Rejected(
            message.unwrap_or_else(|| "The payment processor rejected the request.".to_string()),
        )
    } else {
        ProcessorError::Unexpected(format!(
            "{} {}: {}",
            status,
            kind,
            message.unwrap_or_default()
        ))
    }
}

impl StripeBackend {
    /// Create a new Stripe backend with its own HTTP client.
    pub fn new(config: StripeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// API URL for `segments` under the base URL.
    ///
    /// Each segment is percent-encoded on its own, so ids taken from clients
    /// or the database cannot add path components or a query string.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProcessorError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProcessorError::Unexpected(format!(
                    "{} cannot be used as an API base URL",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<RequestBuilder, ProcessorError> {
        Ok(self
            .client
            .get(self.endpoint(segments)?)
            .bearer_auth(&self.config.secret_key))
    }

    fn post(
        &self,
        segments: &[&str],
        form: &[(&str, &str)],
    ) -> Result<RequestBuilder, ProcessorError> {
        Ok(self
            .client
            .post(self.endpoint(segments)?)
            .bearer_auth(&self.config.secret_key)
            .form(form))
    }

    /// Send a request and decode the 2xx body as `T`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProcessorError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = error_from_response(status, &body);
            tracing::warn!(%status, error = %err, "stripe request failed");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| ProcessorError::Unexpected(e.to_string()))
    }

    async fn customer(&self, customer: &str) -> Result<Customer, ProcessorError> {
        self.send(
            self.get(&["v1", "customers", customer])?
                .query(&[("expand[]", "invoice_settings.default_payment_method")]),
        )
        .await
    }
}

/// Default payment method of a customer, if it still exists.
fn default_payment_method(customer: Customer) -> Option<PaymentMethod> {
    if customer.deleted {
        return None;
    }
    customer.invoice_settings?.default_payment_method
}

#[async_trait]
impl ProcessorBackend for StripeBackend {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn retrieve_bank(
        &self,
        provider: &Organization,
        broker: &Organization,
    ) -> Result<BankAccount, ProcessorError> {
        let connected = if provider.is(broker) {
            None
        } else {
            provider.processor_deposit_key.as_deref()
        };

        let (account_request, balance_request) = match connected {
            Some(account) => (
                self.get(&["v1", "accounts", account])?,
                self.get(&["v1", "balance"])?.header("Stripe-Account", account),
            ),
            None => (self.get(&["v1", "account"])?, self.get(&["v1", "balance"])?),
        };

        let account: Account = self.send(account_request).await?;
        let balance: Balance = self.send(balance_request).await?;

        let external = account
            .external_accounts
            .and_then(|list| list.data.into_iter().next());
        let (bank_name, last4) = match external {
            Some(bank) => (
                bank.bank_name.unwrap_or_else(|| "N/A".to_string()),
                format!("***-{}", bank.last4),
            ),
            None => ("N/A".to_string(), "N/A".to_string()),
        };
        let (balance_amount, balance_unit) = balance
            .available
            .into_iter()
            .next()
            .map(|b| (b.amount, b.currency))
            .unwrap_or_else(|| (0, "usd".to_string()));

        Ok(BankAccount {
            bank_name,
            last4,
            balance_amount,
            balance_unit,
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

        let customer = self.customer(customer).await?;
        Ok(default_payment_method(customer)
            .map(PaymentMethod::into_card)
            .unwrap_or_default())
    }

    async fn create_or_update_card(
        &self,
        organization: &Organization,
        token: &CardToken,
        actor: &str,
        _broker: &Organization,
    ) -> Result<CardUpdate, ProcessorError> {
        let token = token.as_str();

        match organization.processor_card_key.as_deref() {
            Some(customer) => {
                let method: PaymentMethod = self
                    .send(self.post(
                        &["v1", "payment_methods", token, "attach"],
                        &[("customer", customer)],
                    )?)
                    .await?;
                let _: Customer = self
                    .send(self.post(
                        &["v1", "customers", customer],
                        &[
                            ("invoice_settings[default_payment_method]", method.id.as_str()),
                            ("metadata[updated_by]", actor),
                        ],
                    )?)
                    .await?;

                Ok(CardUpdate {
                    card: method.into_card(),
                    customer_key: customer.to_string(),
                })
            }
            None => {
                // Card comes back expanded with the new customer id
                let customer: Customer = self
                    .send(self.post(
                        &["v1", "customers"],
                        &[
                            ("payment_method", token),
                            ("invoice_settings[default_payment_method]", token),
                            ("description", organization.full_name.as_str()),
                            ("metadata[organization]", organization.slug.as_str()),
                            ("metadata[updated_by]", actor),
                            ("expand[]", "invoice_settings.default_payment_method"),
                        ],
                    )?)
                    .await?;
                let customer_key = customer.id.clone();

                Ok(CardUpdate {
                    card: default_payment_method(customer)
                        .map(PaymentMethod::into_card)
                        .unwrap_or_default(),
                    customer_key,
                })
            }
        }
    }

    async fn delete_card(
        &self,
        organization: &Organization,
        _broker: &Organization,
    ) -> Result<(), ProcessorError> {
        let Some(customer) = organization.processor_card_key.as_deref() else {
            return Ok(());
        };

        let customer = self.customer(customer).await?;
        if let Some(method) = default_payment_method(customer) {
            let _: PaymentMethod = self
                .send(self.post(&["v1", "payment_methods", method.id.as_str(), "detach"], &[])?)
                .await?;
        }
        Ok(())
    }

    async fn get_payment_context(
        &self,
        organization: &Organization,
        provider: &Organization,
        broker: &Organization,
    ) -> Result<PaymentContext, ProcessorError> {
        let mut form = vec![("usage", "off_session"), ("payment_method_types[]", "card")];
        if let Some(customer) = organization.processor_card_key.as_deref() {
            form.push(("customer", customer));
        }
        let intent: SetupIntent = self
            .send(self.post(&["v1", "setup_intents"], &form)?)
            .await?;

        let mut context = PaymentContext::new()
            .with("STRIPE_PUB_KEY", self.config.pub_key.as_str())
            .with("STRIPE_INTENT_SECRET", intent.client_secret);
        if !provider.is(broker) {
            if let Some(account) = &provider.processor_deposit_key {
                context = context.with("STRIPE_ACCOUNT", account.as_str());
            }
        }
        Ok(context)
    }
}
