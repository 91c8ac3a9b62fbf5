//! Shared types for HarvestLink

mod error;

pub use error::{HarvestError, Result};
