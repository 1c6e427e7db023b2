//! HTTP request handlers (route handlers).
//!
//! Each handler resolves the organization from the path, delegates to the
//! billing service, and maps the outcome to a JSON response.

/// Deposit account endpoint
pub mod bank;
pub mod health;
/// Card on file endpoints
pub mod payment_method;
