// User Domain Model

use serde::{Deserialize, Serialize};

/// User ID (UUID v4)
pub type UserId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Moderator,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Moderator => write!(f, "moderator"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub active: bool,
    pub skills: Vec<String>,
    pub created_at: i64, // epoch ms
}

impl User {
    /// Whether this user's skill set intersects the required skills.
    /// Comparison is case-insensitive.
    pub fn has_any_skill(&self, required: &[String]) -> bool {
        self.skills.iter().any(|s| {
            required
                .iter()
                .any(|r| r.eq_ignore_ascii_case(s.as_str()))
        })
    }
}

/// A moderator (or admin) eligible for assignment, annotated with live
/// workload. Built transiently during assignee selection; never persisted.
#[derive(Debug, Clone)]
pub struct ModeratorCandidate {
    pub user: User,
    /// Count of tickets currently assigned with status open/in_progress,
    /// read at selection time (best known workload, no locking).
    pub workload: i64,
}
