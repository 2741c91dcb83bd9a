//! Tests for shared types.


/// Error formatting and equality.
pub mod error;

/// Memory command helpers.
pub mod data;
