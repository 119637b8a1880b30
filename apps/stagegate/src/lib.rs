//! # Stagegate Library
//!
//! The CLI and the simulation script runner, exposed for integration tests.

pub mod cli;
pub mod script;
