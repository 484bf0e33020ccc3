//! Core types for the router
//!
//! - `RouterError` / `RouterResult` - Error types shared across the crate

pub mod error;

pub use error::{RouterError, RouterResult};
