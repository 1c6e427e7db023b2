//! Business logic services.
//!
//! Services sit between the HTTP handlers and the outside world: the
//! organization store and the payment processor.

pub mod billing_service;
pub mod organization_store;
