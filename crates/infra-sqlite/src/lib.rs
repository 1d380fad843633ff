// Buildeta Infrastructure - SQLite Adapter
// Implements: WorkerRegistry, BuildQueue (read-only), plus snapshot loading

mod build_queue;
mod connection;
mod error;
mod migration;
mod seed;
mod worker_registry;

pub use build_queue::SqliteBuildQueue;
pub use connection::create_pool;
pub use error::map_sqlx_error;
pub use migration::run_migrations;
pub use seed::{insert_job, insert_worker, load_snapshot};
pub use worker_registry::SqliteWorkerRegistry;

// Note: sqlx::Error conversion is handled by map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
