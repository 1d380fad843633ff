// Application Layer - Use Cases

pub mod dispatch;
pub mod estimator;

// Re-exports
pub use dispatch::{DispatchEstimator, QueueEntry};
pub use estimator::{DispatchEstimate, EstimatorConfig, QueueSnapshot};
