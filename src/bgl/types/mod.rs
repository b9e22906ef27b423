//! Foundational data structures, error types, and read options.

pub mod error;
pub mod models;
pub mod options;
