// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Job {job_id} is {status}, only WAITING jobs can be estimated")]
    InvalidState { job_id: i64, status: String },

    #[error("Unknown job status: {0}")]
    UnknownStatus(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
