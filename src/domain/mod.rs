//! Domain layer - Core business logic
//!
//! This layer contains:
//! - Entities: Message, its identity and validated content
//! - Traits: Abstractions for infrastructure (MessageStore)

pub mod entities;
pub mod traits;
