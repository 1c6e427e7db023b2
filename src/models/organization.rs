//! Organization model.
//!
//! An organization is a subscriber or provider account. It is created and
//! destroyed by the account-management system; this service only reads it
//! and keeps its processor customer reference up to date.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents an organization record from the database.
///
/// # Database Table
///
/// Maps to the `organizations` table. Card and bank details are never stored
/// here, only the opaque references the processor uses to find them.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Organization {
    /// Unique identifier for this organization
    pub id: Uuid,

    /// URL-safe identifier used in `/billing/{organization}/...` paths
    pub slug: String,

    /// Display name, sent to the processor as the customer description
    pub full_name: String,

    /// Processor-side customer reference (e.g. Stripe `cus_...`)
    ///
    /// NULL until the first card is attached to this organization.
    pub processor_card_key: Option<String>,

    /// Processor-side deposit account reference (e.g. Stripe `acct_...`)
    ///
    /// Only providers that receive payouts have one.
    pub processor_deposit_key: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Whether `other` is the same organization as `self`.
    pub fn is(&self, other: &Organization) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
impl Organization {
    /// Organization with no processor references, for tests.
    pub fn fixture(slug: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            full_name: slug.to_uppercase(),
            processor_card_key: None,
            processor_deposit_key: None,
            created_at: now,
            updated_at: now,
        }
    }
}
