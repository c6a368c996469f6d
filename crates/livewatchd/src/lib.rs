//! livewatchd internals
//!
//! The binary in `main.rs` wires these together; they live in a library so the
//! router and the environment parsing can be exercised in-process.

pub mod api;
pub mod config;
