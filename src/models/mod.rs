//! Data models.
//!
//! `organization` maps to the database; `billing` holds the read views and
//! request/response bodies, none of which are persisted.

/// Billing read views and API bodies
pub mod billing;
/// Subscriber/provider account model
pub mod organization;
