// SQLite TicketRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use ticketflow_core::domain::{Comment, Ticket, TicketId, TicketPriority, TicketStatus};
use ticketflow_core::error::Result;
use ticketflow_core::port::TicketRepository;

pub struct SqliteTicketRepository {
    pub(crate) pool: SqlitePool,
}

impl SqliteTicketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a ticket outside of a creation transaction (tests, seeding).
    /// Production creation goes through SqliteTicketTransaction.
    pub async fn insert(&self, ticket: &Ticket) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_sqlx_error)?;
        crate::transaction::insert_ticket_stmt(&mut tx, ticket).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn load_comments(&self, ticket_id: &str) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT * FROM ticket_comments WHERE ticket_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRow::into_comment).collect())
    }
}

#[async_trait]
impl TicketRepository for SqliteTicketRepository {
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let comments = self.load_comments(id).await?;
                Ok(Some(row.into_ticket(comments)))
            }
            None => Ok(None),
        }
    }

    async fn update_ai_fields(&self, ticket: &Ticket) -> Result<()> {
        let ai_tags = ticket
            .ai_tags
            .as_ref()
            .map(|t| serde_json::to_string(t))
            .transpose()?;

        sqlx::query(
            r#"
            UPDATE tickets
            SET ai_category = ?, ai_priority = ?, ai_summary = ?, ai_tags = ?,
                priority = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&ticket.ai_category)
        .bind(ticket.ai_priority.map(|p| p.to_string()))
        .bind(&ticket.ai_summary)
        .bind(&ai_tags)
        .bind(ticket.priority.to_string())
        .bind(ticket.updated_at)
        .bind(&ticket.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn assign(
        &self,
        id: &TicketId,
        assignee_id: &str,
        assigned_by: &str,
        now_millis: i64,
    ) -> Result<bool> {
        // Conditional update: a ticket that already has an assignee is left
        // untouched, which makes re-executed runs idempotent. Response time
        // is populated only on first assignment (COALESCE keeps an
        // existing value).
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET assignee_id = ?, assigned_at = ?, assigned_by = ?,
                status = 'in_progress',
                response_time_ms = COALESCE(response_time_ms, ? - created_at),
                updated_at = ?
            WHERE id = ? AND assignee_id IS NULL
            "#,
        )
        .bind(assignee_id)
        .bind(now_millis)
        .bind(assigned_by)
        .bind(now_millis)
        .bind(now_millis)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: String,
    number: String,
    subject: String,
    description: String,
    category: String,
    priority: String,
    status: String,
    ai_category: Option<String>,
    ai_priority: Option<String>,
    ai_summary: Option<String>,
    ai_tags: Option<String>,
    assignee_id: Option<String>,
    assigned_at: Option<i64>,
    assigned_by: Option<String>,
    response_time_ms: Option<i64>,
    resolution_time_ms: Option<i64>,
    resolved_at: Option<i64>,
    satisfaction_rating: Option<i32>,
    satisfaction_feedback: Option<String>,
    created_by: String,
    created_at: i64,
    updated_at: i64,
}

impl TicketRow {
    fn into_ticket(self, comments: Vec<Comment>) -> Ticket {
        let status = match self.status.as_str() {
            "in_progress" => TicketStatus::InProgress,
            "resolved" => TicketStatus::Resolved,
            "closed" => TicketStatus::Closed,
            _ => TicketStatus::Open,
        };
        let ai_tags = self
            .ai_tags
            .as_deref()
            .and_then(|t| serde_json::from_str(t).ok());

        Ticket {
            id: self.id,
            number: self.number,
            subject: self.subject,
            description: self.description,
            category: self.category,
            priority: TicketPriority::parse_or_default(&self.priority),
            status,
            ai_category: self.ai_category,
            ai_priority: self
                .ai_priority
                .as_deref()
                .map(TicketPriority::parse_or_default),
            ai_summary: self.ai_summary,
            ai_tags,
            assignee_id: self.assignee_id,
            assigned_at: self.assigned_at,
            assigned_by: self.assigned_by,
            response_time_ms: self.response_time_ms,
            resolution_time_ms: self.resolution_time_ms,
            resolved_at: self.resolved_at,
            satisfaction_rating: self.satisfaction_rating,
            satisfaction_feedback: self.satisfaction_feedback,
            comments,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: String,
    author_id: String,
    body: String,
    internal: i64,
    created_at: i64,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            author_id: self.author_id,
            body: self.body,
            internal: self.internal != 0,
            created_at: self.created_at,
        }
    }
}
