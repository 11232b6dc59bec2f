//! Cameras — a small CRUD web application.
//!
//! HTML pages for creating, listing, editing and deleting camera records.
//! Records are kept by one storage backend chosen at startup; identity comes
//! from an authenticating proxy and images are stored on local disk.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod views;
