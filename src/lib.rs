pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ident;
pub mod models;
pub mod server;
pub mod utils;

// Re-export error types for convenience
pub use error::{Error, Result};
