//! TG channel forwarding proxy.
//!
//! Accepts `GET /tg/s/{channel}?{query}` and relays the matching
//! `https://t.me/s/{channel}?{query}` page back unchanged.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
