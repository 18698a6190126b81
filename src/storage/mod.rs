//! Session storage for Quarry.
//!
//! Keeps the one live session between CLI invocations, in a JSON file or
//! in memory.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use traits::SessionStore;
