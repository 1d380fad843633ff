// Domain Layer - Pure build-farm entities

pub mod error;
pub mod job;
pub mod platform;
pub mod worker;

// Re-exports
pub use error::DomainError;
pub use job::{Job, JobId, JobStatus, Score};
pub use platform::{Platform, Processor};
pub use worker::{Worker, WorkerId};
