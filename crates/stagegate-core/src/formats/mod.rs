//! # Formats Module
//!
//! Binary encoding of stored preference values.

mod persistence;

pub use persistence::*;
