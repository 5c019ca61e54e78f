//! # Rendering Module
//!
//! Plain-text rendering of the map, party status, message log and statistics.
//! Drawing the text on an actual terminal is the caller's job.

pub mod display;

pub use display::*;
