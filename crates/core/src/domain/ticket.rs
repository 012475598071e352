// Ticket Domain Model

use crate::domain::analysis::AnalysisResult;
use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Ticket ID (UUID v4)
pub type TicketId = String;

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Medium
    }
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketPriority::Low => write!(f, "low"),
            TicketPriority::Medium => write!(f, "medium"),
            TicketPriority::High => write!(f, "high"),
        }
    }
}

impl TicketPriority {
    /// Parse a priority string leniently; anything unknown becomes Medium.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => TicketPriority::Low,
            "high" => TicketPriority::High,
            _ => TicketPriority::Medium,
        }
    }
}

/// Ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::InProgress => write!(f, "in_progress"),
            TicketStatus::Resolved => write!(f, "resolved"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

impl TicketStatus {
    /// Allowed status transitions. The pipeline only ever performs
    /// `open -> in_progress`; the rest are moderator/admin operations.
    fn can_transition_to(self, to: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, to),
            (Open, InProgress)
                | (InProgress, Open)
                | (InProgress, Resolved)
                | (Resolved, InProgress)
                | (Resolved, Closed)
                | (Open, Resolved)
        )
    }
}

/// A single ticket comment (append-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub body: String,
    pub internal: bool,
    pub created_at: i64, // epoch ms
}

/// Ticket Entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    /// Human-readable number: TK-<year>-<4-digit seq>, unique,
    /// monotonically increasing within the year.
    pub number: String,

    pub subject: String,
    pub description: String,
    /// User-supplied category (free-form)
    pub category: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,

    // AI-derived fields, None until the pipeline has processed the ticket
    pub ai_category: Option<String>,
    pub ai_priority: Option<TicketPriority>,
    pub ai_summary: Option<String>,
    pub ai_tags: Option<Vec<String>>,

    // Assignment
    pub assignee_id: Option<String>,
    pub assigned_at: Option<i64>,
    pub assigned_by: Option<String>,

    // Computed durations, each set exactly once
    pub response_time_ms: Option<i64>,
    pub resolution_time_ms: Option<i64>,
    pub resolved_at: Option<i64>,

    // Satisfaction, settable once by the creator on a resolved/closed ticket
    pub satisfaction_rating: Option<i32>,
    pub satisfaction_feedback: Option<String>,

    pub comments: Vec<Comment>,

    pub created_by: String,
    pub created_at: i64, // epoch ms
    pub updated_at: i64,
}

impl Ticket {
    /// Create a new open ticket.
    ///
    /// `id`, `number` and `created_at` are injected (never generated here)
    /// so creation stays deterministic under test.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        number: impl Into<String>,
        subject: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        priority: TicketPriority,
        created_by: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            subject: subject.into(),
            description: description.into(),
            category: category.into(),
            priority,
            status: TicketStatus::Open,
            ai_category: None,
            ai_priority: None,
            ai_summary: None,
            ai_tags: None,
            assignee_id: None,
            assigned_at: None,
            assigned_by: None,
            response_time_ms: None,
            resolution_time_ms: None,
            resolved_at: None,
            satisfaction_rating: None,
            satisfaction_feedback: None,
            comments: Vec::new(),
            created_by: created_by.into(),
            created_at,
            updated_at: created_at,
        }
    }

    /// Format a ticket number for a year and sequence value.
    pub fn format_number(year: i32, seq: i64) -> String {
        format!("TK-{}-{:04}", year, seq)
    }

    /// Apply AI analysis results to the ticket.
    ///
    /// Stored priority is escalated to High when the analysis says High;
    /// it is never downgraded based on AI output.
    pub fn apply_analysis(&mut self, analysis: &AnalysisResult, now_millis: i64) {
        self.ai_category = Some(analysis.category.to_string());
        self.ai_priority = Some(analysis.priority);
        self.ai_summary = Some(analysis.summary.clone());
        self.ai_tags = Some(analysis.tags.clone());

        if analysis.priority == TicketPriority::High && self.priority != TicketPriority::High {
            self.priority = TicketPriority::High;
        }
        self.updated_at = now_millis;
    }

    /// Assign the ticket and move it to in-progress.
    ///
    /// `response_time_ms` is set exactly once, at the moment an assignee is
    /// first attached. Reassignment never overwrites it.
    pub fn assign(
        &mut self,
        assignee_id: impl Into<String>,
        assigned_by: impl Into<String>,
        now_millis: i64,
    ) {
        if self.response_time_ms.is_none() {
            self.response_time_ms = Some(now_millis - self.created_at);
        }
        self.assignee_id = Some(assignee_id.into());
        self.assigned_at = Some(now_millis);
        self.assigned_by = Some(assigned_by.into());
        if self.status == TicketStatus::Open {
            self.status = TicketStatus::InProgress;
        }
        self.updated_at = now_millis;
    }

    /// Transition the ticket status, validating the transition.
    ///
    /// Entering `resolved` sets `resolved_at`/`resolution_time_ms` exactly
    /// once; a ticket that is reopened and re-resolved keeps the original
    /// resolution duration.
    pub fn set_status(&mut self, to: TicketStatus, now_millis: i64) -> Result<()> {
        if self.status == to {
            return Ok(());
        }
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        if to == TicketStatus::Resolved && self.resolved_at.is_none() {
            self.resolved_at = Some(now_millis);
            self.resolution_time_ms = Some(now_millis - self.created_at);
        }
        self.updated_at = now_millis;
        Ok(())
    }

    /// Record a satisfaction rating (1-5) with optional feedback.
    ///
    /// Only the ticket creator may rate, only once, and only when the
    /// ticket is resolved or closed.
    pub fn rate(
        &mut self,
        rater_id: &str,
        rating: i32,
        feedback: Option<String>,
        now_millis: i64,
    ) -> Result<()> {
        if rater_id != self.created_by {
            return Err(DomainError::NotTicketCreator);
        }
        if !matches!(self.status, TicketStatus::Resolved | TicketStatus::Closed) {
            return Err(DomainError::TicketNotClosed);
        }
        if self.satisfaction_rating.is_some() {
            return Err(DomainError::RatingAlreadySet(self.id.clone()));
        }
        if !(1..=5).contains(&rating) {
            return Err(DomainError::InvalidRating(rating));
        }
        self.satisfaction_rating = Some(rating);
        self.satisfaction_feedback = feedback;
        self.updated_at = now_millis;
        Ok(())
    }

    /// Append a comment. Comments are ordered and never removed.
    pub fn add_comment(
        &mut self,
        comment_id: impl Into<String>,
        author_id: impl Into<String>,
        body: impl Into<String>,
        internal: bool,
        now_millis: i64,
    ) {
        self.comments.push(Comment {
            id: comment_id.into(),
            author_id: author_id.into(),
            body: body.into(),
            internal,
            created_at: now_millis,
        });
        self.updated_at = now_millis;
    }
}
