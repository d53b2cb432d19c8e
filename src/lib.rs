// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod markdown;
pub mod observability;
pub mod paths;
pub mod types;

// Re-exports
pub use client::{EngineGateway, HttpEngine, OpenOutcome};
pub use error::{Error, Result};
pub use types::*;
