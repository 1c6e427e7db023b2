//! HTTP router.

use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware, state::AppState};

/// Build the application router.
///
/// Billing routes require an authenticated caller; `/health` does not.
pub fn router(state: AppState) -> Router {
    let billing_routes = Router::new()
        .route(
            "/billing/{organization}/bank",
            get(handlers::bank::retrieve_bank),
        )
        .route(
            "/billing/{organization}/card",
            get(handlers::payment_method::retrieve_card)
                .put(handlers::payment_method::update_card)
                .delete(handlers::payment_method::delete_card),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::actor::require_actor,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(billing_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
