//! # Axum Helpers
//!
//! Shared HTTP plumbing for the platform's Axum services.
//!
//! - **[`envelope`]**: the uniform response envelope (`details` / `data` /
//!   `pagination` / `error`)
//! - **[`errors`]**: error kinds and their envelope renderings
//! - **[`filter`]**: pagination and filter query parameters
//! - **[`session`]**: request-detail middleware and session resolution
//! - **[`extractors`]**: validated JSON request bodies
//! - **[`server`]**: server bootstrap, common layers, graceful shutdown

pub mod envelope;
pub mod errors;
pub mod extractors;
pub mod filter;
pub mod server;
pub mod session;
pub mod shutdown;

pub use envelope::{ApiError, ApiResponse, Pagination, ResponseDetails};
pub use errors::{AppError, EnvelopeError};
pub use extractors::ValidatedJson;
pub use filter::{QueryFilter, SortBy, DEFAULT_QUERY_FILTER_LIMIT, MAX_QUERY_FILTER_LIMIT};
pub use server::{apply_common_layers, create_app, create_production_app};
pub use session::{RequestDetails, SessionContext};
pub use shutdown::{shutdown_signal, ShutdownCoordinator};
