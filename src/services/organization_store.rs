//! Organization lookup and persistence.
//!
//! Resolves the `{organization}` path segment to an [`Organization`] and
//! stores the processor customer reference after a card update.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::organization::Organization;

/// Storage of organizations, as seen by the billing endpoints.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Find an organization by slug. `Ok(None)` when it does not exist.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, sqlx::Error>;

    /// Record the processor customer reference of an organization.
    async fn set_processor_card_key(
        &self,
        organization_id: Uuid,
        processor_card_key: &str,
    ) -> Result<(), sqlx::Error>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed organization store.
#[derive(Debug, Clone)]
pub struct PgOrganizationStore {
    pool: DbPool,
}

impl PgOrganizationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationStore for PgOrganizationStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, slug, full_name, processor_card_key, processor_deposit_key,
                   created_at, updated_at
            FROM organizations
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_processor_card_key(
        &self,
        organization_id: Uuid,
        processor_card_key: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE organizations
            SET processor_card_key = $1,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(processor_card_key)
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
