// # Store Implementations
//
// This module provides implementations of the SessionStore and
// DeviceTokenStore traits for different persistence strategies.

pub mod file;
pub mod memory;

pub use file::{FileSessionStore, FileTokenStore};
pub use memory::{MemorySessionStore, MemoryTokenStore};
