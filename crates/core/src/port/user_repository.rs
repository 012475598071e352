// User Repository Port (Interface)

use crate::domain::{User, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface over user storage: moderator/admin lookup and
/// live workload counting.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Active moderators and admins whose skill set intersects `skills`.
    /// Returned in a stable, repeatable order (first-seen order matters
    /// for selection tie-breaking).
    async fn find_active_by_skills(&self, skills: &[String]) -> Result<Vec<User>>;

    /// A single active admin, if any (fallback assignment target).
    async fn find_one_active_admin(&self) -> Result<Option<User>>;

    /// Count of tickets currently assigned to the user with status
    /// open or in_progress.
    async fn count_active_tickets(&self, assignee_id: &UserId) -> Result<i64>;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::UserRole;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory user store with per-user workloads and failure injection
    pub struct MockUserRepository {
        users: Mutex<Vec<User>>,
        workloads: Mutex<HashMap<UserId, i64>>,
        fail_with: Mutex<Option<String>>,
    }

    impl Default for MockUserRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockUserRepository {
        pub fn new() -> Self {
            Self {
                users: Mutex::new(Vec::new()),
                workloads: Mutex::new(HashMap::new()),
                fail_with: Mutex::new(None),
            }
        }

        pub fn insert(&self, user: User) {
            self.users.lock().unwrap().push(user);
        }

        pub fn insert_with_workload(&self, user: User, workload: i64) {
            self.workloads
                .lock()
                .unwrap()
                .insert(user.id.clone(), workload);
            self.users.lock().unwrap().push(user);
        }

        /// Make every subsequent call fail with a database error
        pub fn fail_with(&self, message: impl Into<String>) {
            *self.fail_with.lock().unwrap() = Some(message.into());
        }

        fn check_failure(&self) -> Result<()> {
            if let Some(msg) = self.fail_with.lock().unwrap().clone() {
                return Err(AppError::Database(msg));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn find_active_by_skills(&self, skills: &[String]) -> Result<Vec<User>> {
            self.check_failure()?;
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| {
                    u.active
                        && matches!(u.role, UserRole::Moderator | UserRole::Admin)
                        && u.has_any_skill(skills)
                })
                .cloned()
                .collect())
        }

        async fn find_one_active_admin(&self) -> Result<Option<User>> {
            self.check_failure()?;
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.active && u.role == UserRole::Admin)
                .cloned())
        }

        async fn count_active_tickets(&self, assignee_id: &UserId) -> Result<i64> {
            self.check_failure()?;
            Ok(self
                .workloads
                .lock()
                .unwrap()
                .get(assignee_id)
                .copied()
                .unwrap_or(0))
        }
    }
}
