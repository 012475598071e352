// SQLite UserRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use ticketflow_core::domain::{User, UserId, UserRole};
use ticketflow_core::error::Result;
use ticketflow_core::port::UserRepository;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user (tests, seeding).
    pub async fn insert(&self, user: &User) -> Result<()> {
        let skills = serde_json::to_string(&user.skills)?;
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, active, skills, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.to_string())
        .bind(user.active as i64)
        .bind(skills)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_active_by_skills(&self, skills: &[String]) -> Result<Vec<User>> {
        // Skills live in a JSON text column, so the intersection test
        // happens here rather than in SQL. ORDER BY keeps candidate order
        // stable for tie-breaking.
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE active = 1 AND role IN ('moderator', 'admin')
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(UserRow::into_user)
            .filter(|u| u.has_any_skill(skills))
            .collect())
    }

    async fn find_one_active_admin(&self) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE active = 1 AND role = 'admin'
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRow::into_user))
    }

    async fn count_active_tickets(&self, assignee_id: &UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tickets
            WHERE assignee_id = ? AND status IN ('open', 'in_progress')
            "#,
        )
        .bind(assignee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count)
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    role: String,
    active: i64,
    skills: String,
    created_at: i64,
}

impl UserRow {
    fn into_user(self) -> User {
        let role = match self.role.as_str() {
            "moderator" => UserRole::Moderator,
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        };
        let skills = serde_json::from_str(&self.skills).unwrap_or_default();
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            role,
            active: self.active != 0,
            skills,
            created_at: self.created_at,
        }
    }
}
