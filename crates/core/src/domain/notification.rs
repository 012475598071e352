// Notification Domain Model

use crate::domain::ticket::TicketPriority;
use serde::{Deserialize, Serialize};

/// A typed notification request, one variant per template.
///
/// Fire-and-forget once handed to the dispatcher; the pipeline never waits
/// for delivery confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationRequest {
    TicketCreated {
        to: String,
        user_name: String,
        ticket_number: String,
        subject: String,
        /// Coarse estimate shown to the requester, e.g. "2-4 hours"
        estimated_response: String,
    },
    TicketAssigned {
        to: String,
        assignee_name: String,
        ticket_number: String,
        subject: String,
        priority: TicketPriority,
        summary: String,
    },
    TicketAssignedFallback {
        to: String,
        assignee_name: String,
        ticket_number: String,
        subject: String,
        priority: TicketPriority,
        summary: String,
        /// Why the fallback happened, e.g. "no moderator available with required skills"
        reason: String,
    },
    TicketUpdated {
        to: String,
        user_name: String,
        ticket_number: String,
        subject: String,
        change: String,
    },
}

impl NotificationRequest {
    /// Recipient address for this notification.
    pub fn recipient(&self) -> &str {
        match self {
            NotificationRequest::TicketCreated { to, .. }
            | NotificationRequest::TicketAssigned { to, .. }
            | NotificationRequest::TicketAssignedFallback { to, .. }
            | NotificationRequest::TicketUpdated { to, .. } => to,
        }
    }

    /// Short kind name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationRequest::TicketCreated { .. } => "ticket_created",
            NotificationRequest::TicketAssigned { .. } => "ticket_assigned",
            NotificationRequest::TicketAssignedFallback { .. } => "ticket_assigned_fallback",
            NotificationRequest::TicketUpdated { .. } => "ticket_updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_tag_round_trip() {
        let req = NotificationRequest::TicketCreated {
            to: "user@example.com".to_string(),
            user_name: "User".to_string(),
            ticket_number: "TK-2026-0001".to_string(),
            subject: "Help".to_string(),
            estimated_response: "2-4 hours".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "ticket_created");
        let back: NotificationRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), "ticket_created");
        assert_eq!(back.recipient(), "user@example.com");
    }
}
