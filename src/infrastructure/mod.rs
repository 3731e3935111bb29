//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Message persistence
//! - Http: Routes and error responses
//! - Server: Start/ready/stop lifecycle
//! - Client: HTTP client for a running server

pub mod client;
pub mod config;
pub mod http;
pub mod server;
pub mod storage;
