//! HTTP surface of the control plane
//!
//! - routes: axum handlers for the command, status and settings surfaces
//! - state: shared application state and its construction from config

pub mod routes;
pub mod state;

pub use routes::{app_router, serve};
pub use state::AppState;
