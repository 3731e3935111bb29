//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Submission and page orchestration
//! - Render: HTML page rendering
//! - Errors: Domain-specific errors

pub mod errors;
pub mod render;
pub mod services;
