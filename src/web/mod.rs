//! HTTP trigger surface for rss-notify.
//!
//! Exposes the poll cycle as HTTP endpoints for trigger-driven deployments:
//! a one-off test delivery, a stop-at-known check, bootstrap, clearing the
//! store and reporting store statistics.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::{ApiError, ErrorCode};
pub use handlers::{ApiResponse, AppState};
pub use router::{create_health_router, create_router};
pub use server::WebServer;
