//! The route table — maps (method, path) to an upstream target and an
//! authentication policy, per spec.md §4.4.

use http::Method;

/// Which upstream service a matched route forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Identity,
    Solver,
    /// Served directly by the gateway, never forwarded — currently only
    /// `/health` (spec.md §4.4: "plus the unauthenticated /health").
    Local,
}

impl Target {
    pub fn name(self) -> &'static str {
        match self {
            Target::Identity => "identity",
            Target::Solver => "solver",
            Target::Local => "local",
        }
    }
}

/// The authentication requirement a route enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// No authentication required; principal is always anonymous.
    None,
    /// A valid bearer token is required.
    BearerRequired,
    /// Either an API key or a bearer token is accepted; API key wins if present.
    BearerOrApiKey,
}

/// A single entry in the route table.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Path prefix this entry matches (e.g. "/api/v1/captcha/solve").
    pub prefix: &'static str,
    /// HTTP methods this entry matches.
    pub methods: &'static [Method],
    pub target: Target,
    pub auth: AuthPolicy,
}

/// An ordered, first-match-wins table of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn with_entry(mut self, entry: RouteEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Resolve `(method, path)` against the table. First match wins.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .find(|e| e.methods.contains(method) && path.starts_with(e.prefix))
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }
}

/// Build the fixed route table described in spec.md §6.
pub fn default_routes() -> RouteTable {
    use Method as M;

    RouteTable::new()
        .with_entry(RouteEntry {
            prefix: "/health",
            methods: &[M::GET],
            target: Target::Local,
            auth: AuthPolicy::None,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/auth/register",
            methods: &[M::POST],
            target: Target::Identity,
            auth: AuthPolicy::None,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/auth/login",
            methods: &[M::POST],
            target: Target::Identity,
            auth: AuthPolicy::None,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/auth/refresh",
            methods: &[M::POST],
            target: Target::Identity,
            auth: AuthPolicy::None,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/auth/logout",
            methods: &[M::POST],
            target: Target::Identity,
            auth: AuthPolicy::None,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/auth/me",
            methods: &[M::GET, M::PUT],
            target: Target::Identity,
            auth: AuthPolicy::BearerRequired,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/api-keys",
            methods: &[M::GET, M::POST, M::DELETE],
            target: Target::Identity,
            auth: AuthPolicy::BearerRequired,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/captcha/solve",
            methods: &[M::POST],
            target: Target::Solver,
            auth: AuthPolicy::BearerOrApiKey,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/captcha/models",
            methods: &[M::GET, M::POST],
            target: Target::Solver,
            auth: AuthPolicy::BearerRequired,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/captcha/train",
            methods: &[M::GET, M::POST],
            target: Target::Solver,
            auth: AuthPolicy::BearerRequired,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/captcha/logs",
            methods: &[M::GET, M::POST],
            target: Target::Solver,
            auth: AuthPolicy::BearerRequired,
        })
        .with_entry(RouteEntry {
            prefix: "/api/v1/captcha/stats",
            methods: &[M::GET, M::POST],
            target: Target::Solver,
            auth: AuthPolicy::BearerRequired,
        })
}
