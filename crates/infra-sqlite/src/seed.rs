// Snapshot loading
//
// The adapters above never write. These helpers populate the store from an
// exported snapshot of the farm (and from tests).

use crate::error::map_sqlx_error;
use buildeta_core::domain::{Job, Worker};
use buildeta_core::error::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

/// Insert one worker with its processor set
pub async fn insert_worker(pool: &SqlitePool, worker: &Worker) -> Result<()> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;
    insert_worker_tx(&mut tx, worker).await?;
    tx.commit().await.map_err(map_sqlx_error)
}

/// Insert one WAITING or RUNNING job
pub async fn insert_job(pool: &SqlitePool, job: &Job) -> Result<()> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;
    insert_job_tx(&mut tx, job).await?;
    tx.commit().await.map_err(map_sqlx_error)
}

/// Replace the whole store with the given workers and jobs, atomically
pub async fn load_snapshot(pool: &SqlitePool, workers: &[Worker], jobs: &[Job]) -> Result<()> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    for table in ["worker_processors", "workers", "build_queue"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    for worker in workers {
        insert_worker_tx(&mut tx, worker).await?;
    }
    for job in jobs {
        insert_job_tx(&mut tx, job).await?;
    }

    tx.commit().await.map_err(map_sqlx_error)?;

    info!(
        workers = workers.len(),
        jobs = jobs.len(),
        "Loaded farm snapshot"
    );
    Ok(())
}

async fn insert_worker_tx(tx: &mut Transaction<'_, Sqlite>, worker: &Worker) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO workers (id, name, enabled, manual, virtualized, current_job_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(worker.id)
    .bind(&worker.name)
    .bind(worker.enabled)
    .bind(worker.manual)
    .bind(worker.virtualized)
    .bind(worker.current_job)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;

    for processor in &worker.processors {
        sqlx::query("INSERT INTO worker_processors (worker_id, processor) VALUES (?, ?)")
            .bind(worker.id)
            .bind(processor.as_str())
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    Ok(())
}

async fn insert_job_tx(tx: &mut Transaction<'_, Sqlite>, job: &Job) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO build_queue (
            id, score, processor, virtualized, status, estimated_duration_ms, started_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(job.id)
    .bind(job.score)
    .bind(job.processor.as_ref().map(|p| p.as_str()))
    .bind(job.virtualized)
    .bind(job.status.to_string())
    .bind(job.estimated_duration_ms)
    .bind(job.started_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}
