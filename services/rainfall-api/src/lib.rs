//! Rainfall HTTP service library.
//!
//! Exposes the router and state so the binary and the integration tests
//! build the same application.

pub mod server;
pub mod state;

pub use server::build_router;
pub use state::{ConnectorFactory, FtpConnectorFactory, ServerState};
