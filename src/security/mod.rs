//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (whitelist / blacklist on the Origin header)
//!     → host.rs (destination host must be an IP literal or known TLD)
//!     → headers.rs (drop unsafe request headers before forwarding)
//!
//! Upstream response:
//!     → headers.rs (strip cookies and framing headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any policy failure before contacting upstream
//! - Policies are built once from config and never mutated

pub mod headers;
pub mod host;
pub mod origin;

pub use host::is_valid_host;
pub use origin::OriginPolicy;
