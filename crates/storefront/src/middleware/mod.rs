//! HTTP middleware and extractors for the storefront API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (frontend allow-list)
//! 5. Body limit (multipart uploads)

pub mod identity;
pub mod request_id;

pub use identity::{RequireAdmin, RequireUser};
pub use request_id::request_id_middleware;
