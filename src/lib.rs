//! smartbin host: records trash bin sensor pings and serves them to a
//! password-protected live dashboard.
//!
//! the binary (main.rs) wires these modules together; tests drive
//! [`server::router`] directly.

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod pages;
pub mod server;
pub mod store;
