//! Shared building blocks for the owl services.
//!
//! Configuration, the error taxonomy, request/response models with their
//! validation rules, middleware and SQL helpers live here so the service
//! crate only wires them together.

pub mod config;
pub mod errors;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
