//! Tests for the tile components.
