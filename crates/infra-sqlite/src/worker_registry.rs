// SQLite WorkerRegistry Implementation (read-only)

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use buildeta_core::domain::{Platform, Processor, Worker, WorkerId};
use buildeta_core::error::Result;
use buildeta_core::port::WorkerRegistry;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, BTreeSet};

pub struct SqliteWorkerRegistry {
    pool: SqlitePool,
}

impl SqliteWorkerRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkerRegistry for SqliteWorkerRegistry {
    async fn eligible_workers(&self) -> Result<Vec<Worker>> {
        let rows: Vec<WorkerRow> = sqlx::query_as(
            r#"
            SELECT id, name, enabled, manual, virtualized, current_job_id
            FROM workers
            WHERE enabled = 1 AND manual = 0
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let processor_rows: Vec<(WorkerId, String)> = sqlx::query_as(
            r#"
            SELECT wp.worker_id, wp.processor
            FROM worker_processors wp
            JOIN workers w ON w.id = wp.worker_id
            WHERE w.enabled = 1 AND w.manual = 0
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut processors: BTreeMap<WorkerId, BTreeSet<Processor>> = BTreeMap::new();
        for (worker_id, processor) in processor_rows {
            processors
                .entry(worker_id)
                .or_default()
                .insert(Processor::new(processor));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let supported = processors.remove(&row.id).unwrap_or_default();
                row.into_worker(supported)
            })
            .collect())
    }

    async fn count_idle(&self, platform: &Platform) -> Result<usize> {
        let processor = platform.processor.as_ref().map(|p| p.as_str());

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM workers w
            WHERE w.enabled = 1 AND w.manual = 0
              AND w.current_job_id IS NULL
              AND w.virtualized = ?
              AND (? IS NULL OR EXISTS (
                  SELECT 1 FROM worker_processors wp
                  WHERE wp.worker_id = w.id AND wp.processor = ?
              ))
            "#,
        )
        .bind(platform.virtualized)
        .bind(processor)
        .bind(processor)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count.max(0) as usize)
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct WorkerRow {
    id: i64,
    name: String,
    enabled: bool,
    manual: bool,
    virtualized: bool,
    current_job_id: Option<i64>,
}

impl WorkerRow {
    fn into_worker(self, processors: BTreeSet<Processor>) -> Worker {
        Worker {
            id: self.id,
            name: self.name,
            enabled: self.enabled,
            manual: self.manual,
            virtualized: self.virtualized,
            processors,
            current_job: self.current_job_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, insert_worker, run_migrations};

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn amd64() -> Processor {
        Processor::new("amd64")
    }

    #[tokio::test]
    async fn test_eligible_workers_with_processors() {
        let pool = setup_test_db().await;
        insert_worker(
            &pool,
            &Worker::new(1, "bob", false)
                .with_processor(amd64())
                .with_processor(Processor::new("i386")),
        )
        .await
        .unwrap();
        insert_worker(&pool, &Worker::new(2, "frog", true)).await.unwrap();
        insert_worker(&pool, &Worker::new(3, "down", false).disabled())
            .await
            .unwrap();
        insert_worker(&pool, &Worker::new(4, "held", false).manual())
            .await
            .unwrap();

        let registry = SqliteWorkerRegistry::new(pool);
        let workers = registry.eligible_workers().await.unwrap();

        assert_eq!(workers.len(), 2);
        assert_eq!(workers[0].name, "bob");
        assert_eq!(workers[0].processors.len(), 2);
        assert!(workers[1].processors.is_empty());
        assert!(workers[1].virtualized);
    }

    #[tokio::test]
    async fn test_count_idle() {
        let pool = setup_test_db().await;
        insert_worker(&pool, &Worker::new(1, "a", false).with_processor(amd64()))
            .await
            .unwrap();
        insert_worker(
            &pool,
            &Worker::new(2, "b", false)
                .with_processor(amd64())
                .with_current_job(99),
        )
        .await
        .unwrap();
        insert_worker(&pool, &Worker::new(3, "c", false)).await.unwrap();
        insert_worker(
            &pool,
            &Worker::new(4, "d", false).with_processor(amd64()).disabled(),
        )
        .await
        .unwrap();

        let registry = SqliteWorkerRegistry::new(pool);

        let specific = Platform::new(Some(amd64()), false);
        assert_eq!(registry.count_idle(&specific).await.unwrap(), 1);
        assert_eq!(
            registry.count_idle(&Platform::independent(false)).await.unwrap(),
            2
        );
        assert_eq!(
            registry.count_idle(&Platform::independent(true)).await.unwrap(),
            0
        );
    }
}
