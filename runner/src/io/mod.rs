//! Side-effecting helpers: the environment seam, events, config and waits.

pub mod config;
pub mod environment;
pub mod events;
pub mod executor;
pub mod observe;
pub mod wait;
