// SQLite RunRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use ticketflow_core::domain::{PipelineRun, RunState, TicketCreatedEvent};
use ticketflow_core::error::{AppError, Result};
use ticketflow_core::port::RunRepository;

pub struct SqliteRunRepository {
    pool: SqlitePool,
}

impl SqliteRunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunRepository for SqliteRunRepository {
    async fn enqueue(&self, run: &PipelineRun) -> Result<()> {
        let event = serde_json::to_string(&run.event)?;
        sqlx::query(
            r#"
            INSERT INTO pipeline_runs
                (id, ticket_id, event, state, attempts, max_attempts, backoff_factor,
                 created_at, scheduled_at, started_at, finished_at, last_error)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(&run.ticket_id)
        .bind(event)
        .bind(run.state.to_string())
        .bind(run.attempts)
        .bind(run.max_attempts)
        .bind(run.backoff_factor)
        .bind(run.created_at)
        .bind(run.scheduled_at)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(&run.last_error)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn claim_next(&self, now_millis: i64) -> Result<Option<PipelineRun>> {
        // Single atomic UPDATE: SQLite serializes writers, so two workers
        // can never claim the same run.
        let row = sqlx::query_as::<_, RunRow>(
            r#"
            UPDATE pipeline_runs
            SET state = 'RUNNING', started_at = ?
            WHERE id = (
                SELECT id FROM pipeline_runs
                WHERE state = 'PENDING' AND scheduled_at <= ?
                ORDER BY scheduled_at ASC, created_at ASC, id ASC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(now_millis)
        .bind(now_millis)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(RunRow::into_run).transpose()
    }

    async fn update(&self, run: &PipelineRun) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE pipeline_runs
            SET state = ?, attempts = ?, scheduled_at = ?,
                started_at = ?, finished_at = ?, last_error = ?
            WHERE id = ?
            "#,
        )
        .bind(run.state.to_string())
        .bind(run.attempts)
        .bind(run.scheduled_at)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(&run.last_error)
        .bind(&run.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Run {} not found", run.id)));
        }
        Ok(())
    }

    async fn find_by_state(&self, state: RunState) -> Result<Vec<PipelineRun>> {
        let rows = sqlx::query_as::<_, RunRow>(
            "SELECT * FROM pipeline_runs WHERE state = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(state.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(RunRow::into_run).collect()
    }
}

#[derive(sqlx::FromRow)]
struct RunRow {
    id: String,
    ticket_id: String,
    event: String,
    state: String,
    attempts: i32,
    max_attempts: i32,
    backoff_factor: f64,
    created_at: i64,
    scheduled_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
    last_error: Option<String>,
}

impl RunRow {
    fn into_run(self) -> Result<PipelineRun> {
        let event: TicketCreatedEvent = serde_json::from_str(&self.event)?;
        let state = match self.state.as_str() {
            "PENDING" => RunState::Pending,
            "RUNNING" => RunState::Running,
            "DONE" => RunState::Done,
            "FAILED" => RunState::Failed,
            other => {
                return Err(AppError::InvalidState(format!("unknown run state: {other}")));
            }
        };
        Ok(PipelineRun {
            id: self.id,
            ticket_id: self.ticket_id,
            event,
            state,
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            backoff_factor: self.backoff_factor,
            created_at: self.created_at,
            scheduled_at: self.scheduled_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            last_error: self.last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use ticketflow_core::domain::TicketPriority;

    async fn setup() -> SqliteRunRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteRunRepository::new(pool)
    }

    fn sample_run(id: &str, ticket_id: &str, created_at: i64) -> PipelineRun {
        PipelineRun::new(
            id,
            TicketCreatedEvent {
                ticket_id: ticket_id.to_string(),
                subject: "Help".to_string(),
                description: "Something broke".to_string(),
                category: "Technical".to_string(),
                priority: TicketPriority::Medium,
                user_id: "user-1".to_string(),
                user_email: "user@example.com".to_string(),
                user_name: "User".to_string(),
            },
            created_at,
        )
    }

    #[tokio::test]
    async fn test_enqueue_and_claim_in_schedule_order() {
        let repo = setup().await;
        repo.enqueue(&sample_run("run-2", "t-2", 2_000)).await.unwrap();
        repo.enqueue(&sample_run("run-1", "t-1", 1_000)).await.unwrap();

        let first = repo.claim_next(5_000).await.unwrap().unwrap();
        assert_eq!(first.id, "run-1");
        assert_eq!(first.state, RunState::Running);
        assert_eq!(first.started_at, Some(5_000));
        assert_eq!(first.event.user_email, "user@example.com");

        let second = repo.claim_next(5_000).await.unwrap().unwrap();
        assert_eq!(second.id, "run-2");

        assert!(repo.claim_next(5_000).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_future_runs_not_claimed() {
        let repo = setup().await;
        let mut run = sample_run("run-1", "t-1", 1_000);
        run.scheduled_at = 10_000;
        repo.enqueue(&run).await.unwrap();

        assert!(repo.claim_next(9_999).await.unwrap().is_none());
        assert!(repo.claim_next(10_000).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_and_find_by_state() {
        let repo = setup().await;
        repo.enqueue(&sample_run("run-1", "t-1", 1_000)).await.unwrap();

        let mut run = repo.claim_next(2_000).await.unwrap().unwrap();
        run.complete(3_000).unwrap();
        repo.update(&run).await.unwrap();

        let done = repo.find_by_state(RunState::Done).await.unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].finished_at, Some(3_000));
        assert!(repo.find_by_state(RunState::Pending).await.unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_state_column_maps_to_invalid_state() {
        let row = RunRow {
            id: "run-1".to_string(),
            ticket_id: "t-1".to_string(),
            event: serde_json::to_string(&sample_run("run-1", "t-1", 1_000).event).unwrap(),
            state: "LIMBO".to_string(),
            attempts: 0,
            max_attempts: 3,
            backoff_factor: 2.0,
            created_at: 1_000,
            scheduled_at: 1_000,
            started_at: None,
            finished_at: None,
            last_error: None,
        };
        let err = row.into_run().unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_update_missing_run_is_not_found() {
        let repo = setup().await;
        let run = sample_run("run-1", "t-1", 1_000);
        let err = repo.update(&run).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
