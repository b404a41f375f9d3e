//! Document store implementations

mod memory;

pub use memory::InMemoryDocumentStore;
