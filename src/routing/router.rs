//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the fixed route table
//! - Look up the route for a request path
//! - Apply the route's method policy
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Exact path matching; `/get/` is not `/get`
//! - Unknown paths resolve to the welcome endpoint, never to a 404

use axum::http::Method;

use crate::routing::matcher::MethodPolicy;

/// The handler a route dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Get,
    Post,
    Health,
    Welcome,
}

impl Endpoint {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::Get => "get",
            Endpoint::Post => "post",
            Endpoint::Health => "health",
            Endpoint::Welcome => "default",
        }
    }
}

/// One entry of the route table.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub path: &'static str,
    pub methods: MethodPolicy,
    pub endpoint: Endpoint,
}

/// Outcome of resolving a request against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    /// Path and method accepted.
    Matched(Endpoint),
    /// Path matched but the method is not allowed there.
    MethodNotAllowed(Endpoint),
}

impl RouteMatch {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            RouteMatch::Matched(e) | RouteMatch::MethodNotAllowed(e) => *e,
        }
    }
}

/// Fixed mapping of paths to endpoints.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteSpec>,
    fallback: Endpoint,
}

impl RouteTable {
    /// Create a table from explicit routes and the endpoint for unmatched paths.
    pub fn new(routes: Vec<RouteSpec>, fallback: Endpoint) -> Self {
        Self { routes, fallback }
    }

    /// The routes this server exposes.
    pub fn standard() -> Self {
        Self::new(
            vec![
                RouteSpec {
                    path: "/get",
                    methods: MethodPolicy::Only(Method::GET),
                    endpoint: Endpoint::Get,
                },
                RouteSpec {
                    path: "/post",
                    methods: MethodPolicy::Only(Method::POST),
                    endpoint: Endpoint::Post,
                },
                RouteSpec {
                    path: "/health",
                    methods: MethodPolicy::Any,
                    endpoint: Endpoint::Health,
                },
            ],
            Endpoint::Welcome,
        )
    }

    /// Find the route registered for `path`, if any.
    pub fn lookup(&self, path: &str) -> Option<&RouteSpec> {
        self.routes.iter().find(|route| route.path == path)
    }

    /// Resolve a request. The fallback accepts every method.
    pub fn resolve(&self, method: &Method, path: &str) -> RouteMatch {
        match self.lookup(path) {
            Some(route) if route.methods.allows(method) => RouteMatch::Matched(route.endpoint),
            Some(route) => RouteMatch::MethodNotAllowed(route.endpoint),
            None => RouteMatch::Matched(self.fallback),
        }
    }

    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}
