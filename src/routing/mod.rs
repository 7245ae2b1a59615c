//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate method policy)
//!     → Return: Matched(endpoint) or MethodNotAllowed(endpoint)
//! ```
//!
//! # Design Decisions
//! - Routes fixed at startup, immutable at runtime
//! - One shared 405 policy instead of per-handler checks
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use matcher::MethodPolicy;
pub use router::{Endpoint, RouteMatch, RouteSpec, RouteTable};
