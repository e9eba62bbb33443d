//! # Catalog Repository
//!
//! Concrete repository implementations (adapters) for the catalog service.
//! Products live in memory for the life of the process; nothing is persisted
//! across restarts.

mod memory;

#[cfg(test)]
mod memory_tests;

pub use memory::InMemoryRepo;

/// Builds the repository the server starts with: the default product list.
pub fn build_repo() -> InMemoryRepo {
    InMemoryRepo::seeded()
}
