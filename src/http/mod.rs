//! HTTP gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → middleware/origin.rs (whitelist / blacklist)
//!     → server.rs (preflight or forward, method and body checks)
//!     → routing::target (parse and validate the url parameter)
//!     → request.rs (outbound request, filtered headers)
//!     → client.rs (one upstream call, fully buffered)
//!     → response.rs (redirect loop, header sanitizing)
//!     → cors.rs (CORS headers over the final header set)
//!     → Send to client
//! ```

pub mod client;
pub mod cors;
pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::GatewayError;
pub use response::{X_CORS_REDIRECT, X_FINAL_URL, X_REQUEST_URL};
pub use server::HttpServer;
