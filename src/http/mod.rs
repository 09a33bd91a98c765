//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign / propagate x-request-id)
//!     → handlers.rs (route dispatch)
//!     → proxy::Forwarder (for /tg/s/* and /test)
//!     → response.rs (relay headers, JSON error envelope)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
