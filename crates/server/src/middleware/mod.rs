//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, outermost)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Body limit (`MAX_UPLOAD_BYTES`)
//! 4. Admin extractor on write routes

pub mod auth;

pub use auth::{AdminAuthRejection, OptionalAdmin, RequireAdmin};
