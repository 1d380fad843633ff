// SQLite BuildQueue Implementation (read-only)

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use buildeta_core::domain::{Job, JobId, JobStatus, Processor};
use buildeta_core::error::Result;
use buildeta_core::port::BuildQueue;
use sqlx::SqlitePool;

pub struct SqliteBuildQueue {
    pool: SqlitePool,
}

impl SqliteBuildQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT id, score, processor, virtualized, status, estimated_duration_ms, started_at
            FROM build_queue
            WHERE status = ?
            ORDER BY score DESC, id ASC
            "#,
        )
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(JobRow::into_job).collect()
    }
}

#[async_trait]
impl BuildQueue for SqliteBuildQueue {
    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>> {
        let row: Option<JobRow> = sqlx::query_as(
            r#"
            SELECT id, score, processor, virtualized, status, estimated_duration_ms, started_at
            FROM build_queue
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }

    async fn waiting_jobs(&self) -> Result<Vec<Job>> {
        self.find_by_status(JobStatus::Waiting).await
    }

    async fn running_jobs(&self) -> Result<Vec<Job>> {
        self.find_by_status(JobStatus::Running).await
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: i64,
    score: i64,
    processor: Option<String>,
    virtualized: bool,
    status: String,
    estimated_duration_ms: i64,
    started_at: Option<i64>,
}

impl JobRow {
    fn into_job(self) -> Result<Job> {
        let status: JobStatus = self.status.parse()?;

        Ok(Job {
            id: self.id,
            score: self.score,
            processor: self.processor.map(Processor::new),
            virtualized: self.virtualized,
            status,
            estimated_duration_ms: self.estimated_duration_ms,
            started_at: self.started_at,
        })
    }
}
