//! # API Shared
//!
//! Shared utilities and definitions for the clinic APIs.
//!
//! Contains:
//! - Request/response types with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - Authentication utilities (API key check, permission header parsing)
//!
//! Used by `api-rest` and the `clinic-run` binary.

pub mod auth;
pub mod dto;
pub mod health;

pub use health::HealthService;
