//! Network layer.
//!
//! Plain TCP is served directly by axum; `tls.rs` adds optional rustls
//! termination through axum-server when `listener.tls` is configured.

pub mod tls;
