// Notification Dispatcher
//
// Renders typed notification requests into emails and hands them to the
// mail collaborator. Delivery failure is logged and reported as a
// non-success outcome; it is never raised back into the pipeline and
// never retried here.

use crate::domain::NotificationRequest;
use crate::port::{Email, Mailer};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a dispatch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    Failed,
}

pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Send one notification. Never returns an error.
    pub async fn dispatch(&self, request: &NotificationRequest) -> DispatchOutcome {
        let email = render(request);
        match self.mailer.send(&email).await {
            Ok(()) => {
                debug!(
                    kind = request.kind(),
                    to = request.recipient(),
                    "Notification delivered"
                );
                DispatchOutcome::Delivered
            }
            Err(e) => {
                warn!(
                    kind = request.kind(),
                    to = request.recipient(),
                    error = %e,
                    "Notification delivery failed"
                );
                DispatchOutcome::Failed
            }
        }
    }
}

/// Render a notification request into an email.
fn render(request: &NotificationRequest) -> Email {
    match request {
        NotificationRequest::TicketCreated {
            to,
            user_name,
            ticket_number,
            subject,
            estimated_response,
        } => Email {
            to: to.clone(),
            subject: format!("[{}] We received your ticket: {}", ticket_number, subject),
            body: format!(
                "Hi {},\n\nYour support ticket {} has been created.\n\
                 Subject: {}\n\nEstimated first response: {}.\n\n\
                 We'll be in touch soon.",
                user_name, ticket_number, subject, estimated_response
            ),
        },
        NotificationRequest::TicketAssigned {
            to,
            assignee_name,
            ticket_number,
            subject,
            priority,
            summary,
        } => Email {
            to: to.clone(),
            subject: format!("[{}] New ticket assigned to you", ticket_number),
            body: format!(
                "Hi {},\n\nTicket {} has been assigned to you.\n\
                 Subject: {}\nPriority: {}\nSummary: {}",
                assignee_name, ticket_number, subject, priority, summary
            ),
        },
        NotificationRequest::TicketAssignedFallback {
            to,
            assignee_name,
            ticket_number,
            subject,
            priority,
            summary,
            reason,
        } => Email {
            to: to.clone(),
            subject: format!("[{}] Ticket escalated to you", ticket_number),
            body: format!(
                "Hi {},\n\nTicket {} was routed to you as a fallback ({}).\n\
                 Subject: {}\nPriority: {}\nSummary: {}",
                assignee_name, ticket_number, reason, subject, priority, summary
            ),
        },
        NotificationRequest::TicketUpdated {
            to,
            user_name,
            ticket_number,
            subject,
            change,
        } => Email {
            to: to.clone(),
            subject: format!("[{}] Your ticket was updated", ticket_number),
            body: format!(
                "Hi {},\n\nTicket {} ({}) was updated: {}.",
                user_name, ticket_number, subject, change
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TicketPriority;
    use crate::port::mailer::mocks::MockMailer;

    fn assigned_request() -> NotificationRequest {
        NotificationRequest::TicketAssigned {
            to: "mod@example.com".to_string(),
            assignee_name: "Mod".to_string(),
            ticket_number: "TK-2026-0001".to_string(),
            subject: "Payment failed".to_string(),
            priority: TicketPriority::High,
            summary: "card declined".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_dispatch() {
        let mailer = Arc::new(MockMailer::new());
        let dispatcher = NotificationDispatcher::new(mailer.clone());

        let outcome = dispatcher.dispatch(&assigned_request()).await;
        assert_eq!(outcome, DispatchOutcome::Delivered);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "mod@example.com");
        assert!(sent[0].subject.contains("TK-2026-0001"));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_absorbed() {
        let mailer = Arc::new(MockMailer::new());
        mailer.reject_all();
        let dispatcher = NotificationDispatcher::new(mailer.clone());

        // No panic, no Err: just a Failed outcome
        let outcome = dispatcher.dispatch(&assigned_request()).await;
        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[test]
    fn test_fallback_template_carries_reason() {
        let email = render(&NotificationRequest::TicketAssignedFallback {
            to: "admin@example.com".to_string(),
            assignee_name: "Admin".to_string(),
            ticket_number: "TK-2026-0002".to_string(),
            subject: "Cluster down".to_string(),
            priority: TicketPriority::High,
            summary: "nodes unreachable".to_string(),
            reason: "no moderator available with required skills".to_string(),
        });
        assert!(email.body.contains("no moderator available with required skills"));
    }
}
