//! Core shared pieces: namespace paths and in-flight guards.

pub mod inflight;
pub mod paths;
