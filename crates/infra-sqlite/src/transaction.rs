// SQLite ticket-creation transaction
//
// The per-year sequence bump, the ticket insert and the pipeline-run
// enqueue commit as one unit, so a visible ticket always has a unique
// number and a queued run.

use crate::error::map_sqlx_error;
use crate::ticket_repository::SqliteTicketRepository;
use async_trait::async_trait;
use sqlx::{Sqlite, SqliteConnection};
use ticketflow_core::domain::{PipelineRun, Ticket};
use ticketflow_core::error::Result;
use ticketflow_core::port::{TicketCreationTransaction, Transaction, TransactionalTicketRepository};

pub struct SqliteTicketTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl TransactionalTicketRepository for SqliteTicketRepository {
    async fn begin_transaction(&self) -> Result<Box<dyn TicketCreationTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteTicketTransaction { tx }))
    }
}

#[async_trait]
impl Transaction for SqliteTicketTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl TicketCreationTransaction for SqliteTicketTransaction {
    async fn next_ticket_seq(&mut self, year: i32) -> Result<i64> {
        // The upsert takes a write lock on the year row, serializing
        // concurrent sequence bumps for the same year.
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO ticket_sequences (year, seq) VALUES (?, 1)
            ON CONFLICT(year) DO UPDATE SET seq = seq + 1
            RETURNING seq
            "#,
        )
        .bind(year)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(seq)
    }

    async fn insert_ticket(&mut self, ticket: &Ticket) -> Result<()> {
        insert_ticket_stmt(&mut self.tx, ticket).await
    }

    async fn enqueue_run(&mut self, run: &PipelineRun) -> Result<()> {
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
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

pub(crate) async fn insert_ticket_stmt(conn: &mut SqliteConnection, ticket: &Ticket) -> Result<()> {
    let ai_tags = ticket
        .ai_tags
        .as_ref()
        .map(|t| serde_json::to_string(t))
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO tickets
            (id, number, subject, description, category, priority, status,
             ai_category, ai_priority, ai_summary, ai_tags,
             assignee_id, assigned_at, assigned_by,
             response_time_ms, resolution_time_ms, resolved_at,
             satisfaction_rating, satisfaction_feedback,
             created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&ticket.id)
    .bind(&ticket.number)
    .bind(&ticket.subject)
    .bind(&ticket.description)
    .bind(&ticket.category)
    .bind(ticket.priority.to_string())
    .bind(ticket.status.to_string())
    .bind(&ticket.ai_category)
    .bind(ticket.ai_priority.map(|p| p.to_string()))
    .bind(&ticket.ai_summary)
    .bind(&ai_tags)
    .bind(&ticket.assignee_id)
    .bind(ticket.assigned_at)
    .bind(&ticket.assigned_by)
    .bind(ticket.response_time_ms)
    .bind(ticket.resolution_time_ms)
    .bind(ticket.resolved_at)
    .bind(ticket.satisfaction_rating)
    .bind(&ticket.satisfaction_feedback)
    .bind(&ticket.created_by)
    .bind(ticket.created_at)
    .bind(ticket.updated_at)
    .execute(conn)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_repository::SqliteRunRepository;
    use crate::{create_pool, run_migrations};
    use ticketflow_core::domain::{RunState, TicketCreatedEvent, TicketPriority};
    use ticketflow_core::port::{RunRepository, TicketRepository};

    async fn setup() -> SqliteTicketRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteTicketRepository::new(pool)
    }

    fn sample_run(ticket_id: &str) -> PipelineRun {
        PipelineRun::new(
            "run-1",
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
            1_000,
        )
    }

    #[tokio::test]
    async fn test_sequence_increments_per_year() {
        let repo = setup().await;
        let mut tx = repo.begin_transaction().await.unwrap();
        assert_eq!(tx.next_ticket_seq(2026).await.unwrap(), 1);
        assert_eq!(tx.next_ticket_seq(2026).await.unwrap(), 2);
        assert_eq!(tx.next_ticket_seq(2027).await.unwrap(), 1);
        tx.commit().await.unwrap();

        let mut tx = repo.begin_transaction().await.unwrap();
        assert_eq!(tx.next_ticket_seq(2026).await.unwrap(), 3);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_persists_ticket_and_run() {
        let repo = setup().await;
        let runs = SqliteRunRepository::new(repo.pool.clone());

        let mut tx = repo.begin_transaction().await.unwrap();
        let seq = tx.next_ticket_seq(2026).await.unwrap();
        let ticket = Ticket::new(
            "t-1",
            Ticket::format_number(2026, seq),
            "Help",
            "Something broke",
            "Technical",
            TicketPriority::Medium,
            "user-1",
            1_000,
        );
        tx.insert_ticket(&ticket).await.unwrap();
        tx.enqueue_run(&sample_run("t-1")).await.unwrap();
        tx.commit().await.unwrap();

        let found = repo.find_by_id(&"t-1".to_string()).await.unwrap().unwrap();
        assert_eq!(found.number, "TK-2026-0001");

        let pending = runs.find_by_state(RunState::Pending).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].ticket_id, "t-1");
    }

    #[tokio::test]
    async fn test_rollback_discards_everything() {
        let repo = setup().await;
        let runs = SqliteRunRepository::new(repo.pool.clone());

        let mut tx = repo.begin_transaction().await.unwrap();
        let seq = tx.next_ticket_seq(2026).await.unwrap();
        let ticket = Ticket::new(
            "t-1",
            Ticket::format_number(2026, seq),
            "Help",
            "Something broke",
            "Technical",
            TicketPriority::Medium,
            "user-1",
            1_000,
        );
        tx.insert_ticket(&ticket).await.unwrap();
        tx.enqueue_run(&sample_run("t-1")).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(repo.find_by_id(&"t-1".to_string()).await.unwrap().is_none());
        assert!(runs.find_by_state(RunState::Pending).await.unwrap().is_empty());

        // Sequence bump rolled back too; the next creation reuses it
        let mut tx = repo.begin_transaction().await.unwrap();
        assert_eq!(tx.next_ticket_seq(2026).await.unwrap(), 1);
        tx.commit().await.unwrap();
    }
}
