//! Core types and constants for the map locator

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
