//! Stable exit codes for `tithe` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to an invalid config, tree or arguments, or an I/O error.
pub const INVALID: i32 = 1;
