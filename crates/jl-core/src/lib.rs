//! joke-labeler/crates/jl-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the joke labeler.

pub mod engine;
pub mod error;
pub mod models;
pub mod submission;
pub mod traits;

// Re-exporting for easier access in other crates
pub use engine::*;
pub use error::*;
pub use models::*;
pub use submission::*;
pub use traits::*;
