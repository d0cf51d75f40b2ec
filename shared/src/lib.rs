//! Shared messaging and observability utilities for the file intake gateway

// Re-export common dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;

pub mod messaging;
pub mod observability;
