//! Tests for the data transfer unit.

/// Command register layout and decoding.
pub mod command;

/// Message header wire format.
pub mod header;


/// Receive ring arithmetic.
pub mod ringbuf;


/// Transmit pipeline against a recording port.
pub mod transmit;
