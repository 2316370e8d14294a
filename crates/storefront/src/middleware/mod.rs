//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (`http_request` span with method, uri, status, latency)
//! 3. Request ID (recorded on the span and the Sentry scope)
//! 4. Client lock (one request at a time per session cookie)
//! 5. Session layer (tower-sessions; `PostgreSQL` in production)

pub mod client_lock;
pub mod request_id;
pub mod session;

pub use client_lock::{ClientLocks, serialize_client_requests};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_layer};
