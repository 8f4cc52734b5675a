//! Webhook server: axum router over the sync pipeline.

mod error;
mod runtime;
pub mod server;

pub use error::DaemonError;
pub use runtime::{init_tracing, init_tracing_with_default, run, serve, start_blocking};
pub use server::{build_router, outcome_response};
