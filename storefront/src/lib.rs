// storefront/src/lib.rs

//! HTTP server for the Lustre order and refund lifecycle.
//!
//! `main.rs` builds an `AppState` from the environment; tests build one over
//! the in-memory store and scripted collaborators and mount the same routes.

pub mod config;
pub mod db;
pub mod errors;
pub mod services;
pub mod state;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
pub use web::configure_app_routes;
