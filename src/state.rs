//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::{
    error::AppError, models::organization::Organization, processors::ProcessorBackend,
    services::organization_store::OrganizationStore,
};

/// Collaborators injected into the handlers.
///
/// The broker is looked up per request from its configured slug, so a
/// change to its processor references takes effect without a restart.
#[derive(Clone)]
pub struct AppState {
    pub organizations: Arc<dyn OrganizationStore>,
    pub processor: Arc<dyn ProcessorBackend>,
    pub broker_slug: String,
    /// Header the gateway uses to forward the authenticated username
    pub actor_header: String,
}

impl AppState {
    /// Resolve a path identifier to an organization, 404 when unknown.
    pub async fn organization(&self, slug: &str) -> Result<Organization, AppError> {
        self.organizations
            .find_by_slug(slug)
            .await?
            .ok_or(AppError::OrganizationNotFound)
    }

    /// The organization that owns the platform.
    pub async fn broker(&self) -> Result<Organization, AppError> {
        self.organizations
            .find_by_slug(&self.broker_slug)
            .await?
            .ok_or_else(|| AppError::BrokerNotFound(self.broker_slug.clone()))
    }
}
