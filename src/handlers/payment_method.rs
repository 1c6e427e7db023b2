//! Payment method HTTP handlers.
//!
//! This module implements the card-on-file endpoints of a subscriber:
//! - GET /billing/{organization}/card - Retrieve the card on file
//! - PUT /billing/{organization}/card - Replace it with a processor token
//! - DELETE /billing/{organization}/card - Remove it

use crate::{
    error::AppError,
    middleware::actor::Actor,
    models::billing::{
        CARD_DELETED, CARD_UPDATED, CardQuery, CardResponse, CardTokenRequest,
        CardUpdatedResponse, DetailResponse,
    },
    processors::ProcessorError,
    services::billing_service,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};

/// Retrieve the payment method on file.
///
/// # Query Parameters
///
/// - `update` - when truthy, the response also carries the processor context
///   (e.g. `STRIPE_INTENT_SECRET`) needed to start a Strong Customer
///   Authentication flow for replacing the card
///
/// # Response (200)
///
/// ```json
/// {
///   "last4": "1234",
///   "exp_date": "12/2019"
/// }
/// ```
pub async fn retrieve_card(
    State(state): State<AppState>,
    Path(organization): Path<String>,
    query: Result<Query<CardQuery>, QueryRejection>,
) -> Result<Json<CardResponse>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let organization = state.organization(&organization).await?;
    let broker = state.broker().await?;
    let processor = state.processor.as_ref();

    let card = billing_service::retrieve_card(processor, &organization, &broker).await?;
    let context = if query.wants_update() {
        Some(billing_service::payment_context(processor, &organization, &broker).await?)
    } else {
        None
    };

    Ok(Json(CardResponse {
        card,
        processor: context,
    }))
}

/// Replace the payment method on file.
///
/// # Request Body
///
/// ```json
/// {
///   "token": "xyz"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: the new card and a confirmation message
/// - **Error (400)**: malformed body, or the processor refused the token
///   (`detail` is the processor's reason)
/// - **Error (500)**: any other failure
///
/// ```json
/// {
///   "last4": "1234",
///   "exp_date": "12/2019",
///   "detail": "Your credit card on file was sucessfully updated."
/// }
/// ```
pub async fn update_card(
    State(state): State<AppState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(organization): Path<String>,
    payload: Result<Json<CardTokenRequest>, JsonRejection>,
) -> Result<Json<CardUpdatedResponse>, AppError> {
    // Validate the body before touching the processor
    let Json(request) = payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let token = request.validate().map_err(AppError::InvalidRequest)?;

    let organization = state.organization(&organization).await?;
    let broker = state.broker().await?;

    let card = billing_service::update_card(
        state.organizations.as_ref(),
        state.processor.as_ref(),
        &organization,
        &token,
        &actor,
        &broker,
    )
    .await
    .map_err(|err| match err {
        // A processor refusal is the client's problem, not ours
        AppError::Processor(ProcessorError::Rejected(reason)) => {
            tracing::warn!(
                organization = %organization.slug,
                user = %actor,
                reason = %reason,
                "processor rejected card update"
            );
            AppError::InvalidRequest(reason)
        }
        other => other,
    })?;

    Ok(Json(CardUpdatedResponse {
        card,
        detail: CARD_UPDATED.to_string(),
    }))
}

/// Remove the payment method on file.
///
/// Idempotent: returns the same confirmation whether or not a card existed.
///
/// # Response (200)
///
/// ```json
/// {
///   "detail": "Your credit card is no longer on file with us."
/// }
/// ```
pub async fn delete_card(
    State(state): State<AppState>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(organization): Path<String>,
) -> Result<Json<DetailResponse>, AppError> {
    let organization = state.organization(&organization).await?;
    let broker = state.broker().await?;

    billing_service::delete_card(state.processor.as_ref(), &organization, &actor, &broker).await?;

    Ok(Json(DetailResponse {
        detail: CARD_DELETED.to_string(),
    }))
}
