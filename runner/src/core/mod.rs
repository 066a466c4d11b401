//! Deterministic, pure logic shared by the control loop.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod counters;
pub mod data;
pub mod invariants;
pub mod layout;
pub mod patch;
pub mod path;
pub mod selector;
pub mod timer;
pub mod types;
