//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound /tg/s/{wildcard}?{query}
//!     → target.rs (wildcard + parsed query → upstream URL)
//!     → forwarder.rs (one GET, fixed headers, bounded timeout/redirects)
//!     → Relayed | error.rs::ForwardError
//!     → IntoResponse
//! ```

pub mod error;
pub mod forwarder;
pub mod target;

pub use error::ForwardError;
pub use forwarder::{Forwarder, ProbeError, ProbeReport, Relayed};
