//! # API server
//!
//! Router construction, the route catalog, shared state, and the handlers
//! the app owns directly (probes, the SSE feed, upload serving). The
//! binary in `main.rs` wires this to real backends; the OpenAPI generator
//! consumes [`route_catalog`] with neutralized state.

pub mod api;
pub mod config;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use routes::{build_router, route_catalog, RouteSpec};
pub use state::AppState;
