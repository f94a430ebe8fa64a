//! Shared types for the floor-management engine
//!
//! Domain models (tables, orders, reservations) and the change-feed
//! payloads exchanged between the data service and the floor engine.

pub mod message;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Feed re-exports (for convenient access)
pub use message::{EntityKind, FeedAction, FeedEvent};
