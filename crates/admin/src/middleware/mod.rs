//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Every `/api` route takes the [`RequireAdmin`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{AdminRejection, RequireAdmin};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
