//! Data models
//!
//! Shared between the bridge and the UI layer (serialized as camelCase JSON,
//! the shape the dashboard already sends).

pub mod sale;

// Re-exports
pub use sale::*;
