// Port Layer - Read interfaces onto the build farm's collaborators

pub mod build_queue;
pub mod time_provider; // For deterministic testing
pub mod worker_registry;

// Re-exports
pub use build_queue::BuildQueue;
pub use time_provider::TimeProvider;
pub use worker_registry::WorkerRegistry;
