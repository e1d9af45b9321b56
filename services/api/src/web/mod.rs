pub mod attendance;
pub mod auth;
pub mod extract;
pub mod insights;
pub mod marks;
pub mod registry;
pub mod rest;
pub mod state;

// Re-export the router so the binary and the integration tests build the
// same application.
pub use rest::{build_router, ApiDoc};
