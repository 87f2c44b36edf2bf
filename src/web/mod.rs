//! HTTP API: submission intake, admin listing and export downloads.

pub mod auth;
pub mod handlers;
pub mod rate_limit;
pub mod server;
pub mod types;

pub use server::{AppState, build_router, start_server};
