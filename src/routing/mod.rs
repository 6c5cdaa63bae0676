//! Target selection.
//!
//! # Data Flow
//! ```text
//! ?url=<percent-encoded target>
//!     → target.rs (parse, optional normalization)
//!     → security::host (destination host policy)
//!     → TargetDescriptor handed to the request builder
//!
//! Upstream 3xx + Location:
//!     → target.rs (join onto the current hop, same validation)
//! ```
//!
//! # Design Decisions
//! - The client chooses the destination; the gateway only validates it
//! - Redirect locations go through the same checks as the first target

pub mod target;

pub use target::{TargetDescriptor, TargetResolver};
