//! # Edge Router Core
//!
//! Domain types shared by every other crate in the workspace: the
//! authenticated principal, the per-request context, the route table, the
//! error taxonomy, and the header-name constants the pipeline and the
//! forwarder both need. This crate has no HTTP-server or HTTP-client
//! dependency beyond the `http`/`axum` types needed to express the route
//! table and error responses — it defines the domain model that the
//! gateway, security, and ratelimit crates implement against.

pub mod context;
pub mod error;
pub mod headers;
pub mod principal;
pub mod route;
pub mod state;

pub use context::RequestContext;
pub use error::{ApiError, ErrorKind};
pub use principal::Principal;
pub use route::{AuthPolicy, RouteEntry, RouteTable, Target, default_routes};
pub use state::{RequestState, Terminal};
