//! Storage adapters.
//!
//! Implementations of the `SessionStore` port. Only an in-memory store
//! ships today; a persistent backend slots in behind the same trait.

mod in_memory;

pub use in_memory::InMemorySessionStore;
