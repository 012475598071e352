// Ticket Pipeline - the five-step workflow behind one ticket-creation event
//
// Analyzing -> Persisting -> SelectingAssignee -> Assigning -> Notifying -> Done
//
// Steps run strictly in order; there is no branching back. Only a missing
// ticket in the persist step is fatal to a run; every other error is
// absorbed into a degraded-but-complete outcome so the pipeline always
// terminates. Database errors propagate so the worker can retry the whole
// run; each step is safe to re-execute.

use crate::application::analysis::AnalysisClient;
use crate::application::notify::{DispatchOutcome, NotificationDispatcher};
use crate::application::selector;
use crate::domain::{
    AnalysisResult, ModeratorCandidate, NotificationRequest, Ticket, TicketCreatedEvent, User,
};
use crate::error::{AppError, Result};
use crate::port::{TicketRepository, TimeProvider, UserRepository};
use std::sync::Arc;
use tracing::{info, warn};

/// Actor recorded on pipeline-performed assignments
const SYSTEM_ACTOR: &str = "system";
/// Reason attached to admin-fallback notifications
const FALLBACK_REASON: &str = "no moderator available with required skills";

/// Processing state of a single run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Analyzing,
    Persisting,
    SelectingAssignee,
    Assigning,
    Notifying,
    Done,
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStep::Analyzing => write!(f, "analyzing"),
            PipelineStep::Persisting => write!(f, "persisting"),
            PipelineStep::SelectingAssignee => write!(f, "selecting_assignee"),
            PipelineStep::Assigning => write!(f, "assigning"),
            PipelineStep::Notifying => write!(f, "notifying"),
            PipelineStep::Done => write!(f, "done"),
        }
    }
}

/// How the assignment step concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// A skill-matching moderator was selected
    Moderator(String),
    /// No moderator matched; an active admin took the ticket
    FallbackAdmin(String),
    /// The ticket already had an assignee (re-executed run); left untouched
    AlreadyAssigned(String),
    /// No moderator, no admin: ticket stays unassigned, still a success
    Unassigned,
}

/// Result of a completed pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub ticket_id: String,
    pub assignment: Assignment,
    pub notifications_sent: usize,
}

/// Orchestrates the five-step ticket workflow.
pub struct TicketPipeline {
    analysis: AnalysisClient,
    tickets: Arc<dyn TicketRepository>,
    users: Arc<dyn UserRepository>,
    dispatcher: NotificationDispatcher,
    time_provider: Arc<dyn TimeProvider>,
}

impl TicketPipeline {
    pub fn new(
        analysis: AnalysisClient,
        tickets: Arc<dyn TicketRepository>,
        users: Arc<dyn UserRepository>,
        dispatcher: NotificationDispatcher,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            analysis,
            tickets,
            users,
            dispatcher,
            time_provider,
        }
    }

    /// Execute one pipeline run for a ticket-creation event.
    ///
    /// # Errors
    /// - `AppError::NotFound` when the referenced ticket no longer exists
    ///   (fatal, not retried)
    /// - `AppError::Database` on storage failure in the persist/assign
    ///   steps (the caller retries the whole run)
    pub async fn run(&self, event: &TicketCreatedEvent) -> Result<PipelineOutcome> {
        let ticket_id = &event.ticket_id;

        // Step 1: Analyze. Infallible by contract.
        info!(ticket_id = %ticket_id, step = %PipelineStep::Analyzing, "Pipeline step");
        let analysis = self
            .analysis
            .analyze(&event.subject, &event.description, &event.category)
            .await;

        // Step 2: Persist AI fields. Missing ticket is fatal to the run.
        info!(ticket_id = %ticket_id, step = %PipelineStep::Persisting, "Pipeline step");
        let mut ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", ticket_id)))?;
        let now = self.time_provider.now_millis();
        ticket.apply_analysis(&analysis, now);
        self.tickets.update_ai_fields(&ticket).await?;

        // Step 3: Select assignee. Repository errors degrade to "no
        // candidates" instead of aborting the run.
        info!(ticket_id = %ticket_id, step = %PipelineStep::SelectingAssignee, "Pipeline step");
        let (assignment, mut notifications_sent) = if let Some(assignee) =
            ticket.assignee_id.clone()
        {
            // Re-executed run on an already-assigned ticket: skip
            // re-assignment and the assignment notification.
            info!(ticket_id = %ticket_id, assignee_id = %assignee, "Ticket already assigned, skipping");
            (Assignment::AlreadyAssigned(assignee), 0)
        } else {
            let candidates = self.candidate_pool(&analysis).await;
            let selected = selector::select(&analysis.required_skills, &candidates).cloned();

            // Step 4: Assign (moderator, admin fallback, or nobody).
            info!(ticket_id = %ticket_id, step = %PipelineStep::Assigning, "Pipeline step");
            self.assign(&ticket, &analysis, selected).await?
        };

        // Step 5: Notify requester. Fire-and-forget.
        info!(ticket_id = %ticket_id, step = %PipelineStep::Notifying, "Pipeline step");
        let confirmation = NotificationRequest::TicketCreated {
            to: event.user_email.clone(),
            user_name: event.user_name.clone(),
            ticket_number: ticket.number.clone(),
            subject: ticket.subject.clone(),
            estimated_response: estimated_response(&assignment).to_string(),
        };
        if self.dispatcher.dispatch(&confirmation).await == DispatchOutcome::Delivered {
            notifications_sent += 1;
        }

        info!(
            ticket_id = %ticket_id,
            step = %PipelineStep::Done,
            assignment = ?assignment,
            notifications_sent = notifications_sent,
            "Pipeline run complete"
        );
        Ok(PipelineOutcome {
            ticket_id: ticket_id.clone(),
            assignment,
            notifications_sent,
        })
    }

    /// Build the candidate pool: active moderators/admins with
    /// intersecting skills, annotated with live workload. Any repository
    /// error degrades to an empty pool.
    async fn candidate_pool(&self, analysis: &AnalysisResult) -> Vec<ModeratorCandidate> {
        if analysis.required_skills.is_empty() {
            return Vec::new();
        }
        let users = match self.users.find_active_by_skills(&analysis.required_skills).await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "Candidate lookup failed, degrading to no candidates");
                return Vec::new();
            }
        };

        let mut candidates = Vec::with_capacity(users.len());
        for user in users {
            let workload = match self.users.count_active_tickets(&user.id).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "Workload count failed, degrading to no candidates");
                    return Vec::new();
                }
            };
            candidates.push(ModeratorCandidate { user, workload });
        }
        candidates
    }

    /// Perform the assignment step and enqueue the assignee notification.
    /// Returns the assignment plus the number of notifications delivered.
    async fn assign(
        &self,
        ticket: &Ticket,
        analysis: &AnalysisResult,
        selected: Option<ModeratorCandidate>,
    ) -> Result<(Assignment, usize)> {
        match selected {
            Some(candidate) => self.assign_to(ticket, analysis, &candidate.user, false).await,
            None => {
                // Admin fallback; lookup errors degrade to "no admin".
                let admin = match self.users.find_one_active_admin().await {
                    Ok(admin) => admin,
                    Err(e) => {
                        warn!(error = %e, "Admin lookup failed, leaving ticket unassigned");
                        None
                    }
                };
                match admin {
                    Some(admin) => self.assign_to(ticket, analysis, &admin, true).await,
                    None => {
                        info!(ticket_id = %ticket.id, "No moderator and no admin, ticket stays unassigned");
                        Ok((Assignment::Unassigned, 0))
                    }
                }
            }
        }
    }

    async fn assign_to(
        &self,
        ticket: &Ticket,
        analysis: &AnalysisResult,
        assignee: &User,
        fallback: bool,
    ) -> Result<(Assignment, usize)> {
        let now = self.time_provider.now_millis();
        let assigned = self
            .tickets
            .assign(&ticket.id, &assignee.id, SYSTEM_ACTOR, now)
            .await?;
        if !assigned {
            // Lost a race with another writer; treat as already assigned
            // and skip the notification to avoid a duplicate.
            info!(ticket_id = %ticket.id, "Assignment skipped, ticket already taken");
            return Ok((Assignment::AlreadyAssigned(assignee.id.clone()), 0));
        }

        let request = if fallback {
            NotificationRequest::TicketAssignedFallback {
                to: assignee.email.clone(),
                assignee_name: assignee.name.clone(),
                ticket_number: ticket.number.clone(),
                subject: ticket.subject.clone(),
                priority: ticket.priority,
                summary: analysis.summary.clone(),
                reason: FALLBACK_REASON.to_string(),
            }
        } else {
            NotificationRequest::TicketAssigned {
                to: assignee.email.clone(),
                assignee_name: assignee.name.clone(),
                ticket_number: ticket.number.clone(),
                subject: ticket.subject.clone(),
                priority: ticket.priority,
                summary: analysis.summary.clone(),
            }
        };
        // Fire-and-forget: a failed send is logged, never propagated.
        let delivered = match self.dispatcher.dispatch(&request).await {
            DispatchOutcome::Delivered => 1,
            DispatchOutcome::Failed => 0,
        };

        let assignment = if fallback {
            Assignment::FallbackAdmin(assignee.id.clone())
        } else {
            Assignment::Moderator(assignee.id.clone())
        };
        Ok((assignment, delivered))
    }
}

/// Coarse estimate shown to the requester, a function of whether a
/// moderator was achieved.
fn estimated_response(assignment: &Assignment) -> &'static str {
    match assignment {
        Assignment::Moderator(_) | Assignment::AlreadyAssigned(_) => "2-4 hours",
        Assignment::FallbackAdmin(_) | Assignment::Unassigned => "4-8 hours",
    }
}
