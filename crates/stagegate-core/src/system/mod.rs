//! # System Module
//!
//! The stage-ordering synchronizer.
//!
//! A [`StageGate`] replaces ad hoc readiness flags and nested listener
//! callbacks: the owner declares its stages once, defers work on them, marks
//! them as the underlying events fire, and resets the gate at the start of
//! every new cycle.

mod gate;

pub use gate::*;
