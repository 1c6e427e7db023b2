//! Deposit account HTTP handler.
//!
//! - GET /billing/{organization}/bank - Retrieve the payout account of a provider

use crate::{
    error::AppError, models::billing::BankAccount, services::billing_service, state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};

/// Retrieve a payout account.
///
/// Pass through to the payment processor for some details about the deposit
/// account of a provider. This does not trigger any payout.
///
/// # Endpoint
///
/// `GET /billing/{organization}/bank`
///
/// # Response
///
/// - **Success (200 OK)**: always the four fields below
/// - **Error (404)**: unknown organization
/// - **Error (500)**: processor failure
///
/// ```json
/// {
///   "bank_name": "Stripe Test Bank",
///   "last4": "***-htrTZ",
///   "balance_amount": 0,
///   "balance_unit": "usd"
/// }
/// ```
pub async fn retrieve_bank(
    State(state): State<AppState>,
    Path(organization): Path<String>,
) -> Result<Json<BankAccount>, AppError> {
    let provider = state.organization(&organization).await?;
    let broker = state.broker().await?;

    let bank = billing_service::retrieve_bank(state.processor.as_ref(), &provider, &broker).await?;

    Ok(Json(bank))
}
