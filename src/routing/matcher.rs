//! Method matching logic.
//!
//! # Design Decisions
//! - Method comparison is case-sensitive: `get` is not `GET`
//! - A route either accepts any method or exactly one

use std::fmt;

use axum::http::Method;

/// Which request methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodPolicy {
    /// Every method is accepted.
    Any,
    /// Only this exact method is accepted.
    Only(Method),
}

impl MethodPolicy {
    /// Returns true if `method` passes this policy.
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            MethodPolicy::Any => true,
            MethodPolicy::Only(allowed) => allowed == method,
        }
    }
}

impl fmt::Display for MethodPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodPolicy::Any => f.write_str("ANY"),
            MethodPolicy::Only(method) => f.write_str(method.as_str()),
        }
    }
}
