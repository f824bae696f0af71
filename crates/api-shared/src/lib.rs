//! # API Shared
//!
//! Shared utilities and definitions for MHR APIs.
//!
//! Contains:
//! - Request/response types (`dto` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the workspace binary for common functionality.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
