//! HTTP middleware components.
//!
//! Middleware run before route handlers and can short-circuit a request.

/// Authenticated caller extraction
pub mod actor;
