//! End-to-end pipeline runs over real SQLite storage, with the AI and
//! mail collaborators mocked at the port boundary.

use std::sync::Arc;
use ticketflow_core::application::ticketing::create::CreateTicketRequest;
use ticketflow_core::application::{
    AnalysisClient, Assignment, NotificationDispatcher, TicketPipeline, TicketService,
};
use ticketflow_core::domain::{TicketCreatedEvent, TicketPriority, TicketStatus, User, UserRole};
use ticketflow_core::port::analysis_provider::mocks::MockAnalysisProvider;
use ticketflow_core::port::id_provider::mocks::SequentialIdProvider;
use ticketflow_core::port::mailer::mocks::MockMailer;
use ticketflow_core::port::time_provider::mocks::FixedTimeProvider;
use ticketflow_core::port::TicketRepository;
use ticketflow_infra_sqlite::{
    create_pool, run_migrations, SqliteTicketRepository, SqliteUserRepository,
};

// 2026-01-01T00:00:00Z
const JAN_2026: i64 = 1_767_225_600_000;

struct Harness {
    pipeline: TicketPipeline,
    tickets: Arc<SqliteTicketRepository>,
    users: Arc<SqliteUserRepository>,
    mailer: Arc<MockMailer>,
    clock: Arc<FixedTimeProvider>,
    event: TicketCreatedEvent,
}

/// Create a ticket through the real creation path, then wire a pipeline
/// around it with the given mock AI provider.
async fn harness(provider: MockAnalysisProvider) -> Harness {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let tickets = Arc::new(SqliteTicketRepository::new(pool.clone()));
    let users = Arc::new(SqliteUserRepository::new(pool));
    let clock = Arc::new(FixedTimeProvider::new(JAN_2026));
    let mailer = Arc::new(MockMailer::new());

    let service = TicketService::new(
        tickets.clone(),
        Arc::new(SequentialIdProvider::new("id")),
        clock.clone(),
    );
    let ticket = service
        .create(CreateTicketRequest {
            subject: "Payment failed".to_string(),
            description: "My card was declined, this is urgent".to_string(),
            category: "Billing".to_string(),
            priority: None,
            user_id: "user-1".to_string(),
            user_email: "user@example.com".to_string(),
            user_name: "User".to_string(),
        })
        .await
        .unwrap();

    let event = TicketCreatedEvent {
        ticket_id: ticket.id,
        subject: ticket.subject,
        description: ticket.description,
        category: ticket.category,
        priority: ticket.priority,
        user_id: "user-1".to_string(),
        user_email: "user@example.com".to_string(),
        user_name: "User".to_string(),
    };

    let pipeline = TicketPipeline::new(
        AnalysisClient::new(Arc::new(provider)),
        tickets.clone(),
        users.clone(),
        NotificationDispatcher::new(mailer.clone()),
        clock.clone(),
    );

    Harness {
        pipeline,
        tickets,
        users,
        mailer,
        clock,
        event,
    }
}

fn user(id: &str, role: UserRole, skills: &[&str], created_at: i64) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: id.to_string(),
        role,
        active: true,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        created_at,
    }
}

fn billing_analysis() -> serde_json::Value {
    serde_json::json!({
        "category": "billing",
        "priority": "high",
        "summary": "Customer's card was declined",
        "tags": ["billing", "payment"],
        "required_skills": ["billing"]
    })
}

#[tokio::test]
async fn test_happy_path_assigns_least_loaded_moderator() {
    let h = harness(MockAnalysisProvider::new_responding(billing_analysis())).await;
    h.users
        .insert(&user("mod-busy", UserRole::Moderator, &["billing"], 100))
        .await
        .unwrap();
    h.users
        .insert(&user("mod-free", UserRole::Moderator, &["billing"], 200))
        .await
        .unwrap();
    // Plain users never enter the candidate pool, whatever their skills
    h.users
        .insert(&user("user-skilled", UserRole::User, &["billing"], 10))
        .await
        .unwrap();

    // Seed workload: give mod-busy an open ticket so mod-free is least loaded
    let service = TicketService::new(
        h.tickets.clone(),
        Arc::new(SequentialIdProvider::new("seed")),
        h.clock.clone(),
    );
    let other = service
        .create(CreateTicketRequest {
            subject: "Other".to_string(),
            description: "Other issue".to_string(),
            category: "Billing".to_string(),
            priority: None,
            user_id: "user-2".to_string(),
            user_email: "user2@example.com".to_string(),
            user_name: "User2".to_string(),
        })
        .await
        .unwrap();
    h.tickets
        .assign(&other.id, "mod-busy", "system", JAN_2026)
        .await
        .unwrap();

    h.clock.advance(9_000);
    let outcome = h.pipeline.run(&h.event).await.unwrap();

    assert_eq!(outcome.assignment, Assignment::Moderator("mod-free".to_string()));
    assert_eq!(outcome.notifications_sent, 2);

    let ticket = h
        .tickets
        .find_by_id(&h.event.ticket_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::InProgress);
    assert_eq!(ticket.assignee_id.as_deref(), Some("mod-free"));
    assert_eq!(ticket.assigned_by.as_deref(), Some("system"));
    assert_eq!(ticket.priority, TicketPriority::High);
    assert_eq!(ticket.ai_category.as_deref(), Some("billing"));
    assert_eq!(ticket.response_time_ms, Some(9_000));

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "mod-free@example.com");
    assert_eq!(sent[1].to, "user@example.com");
    assert!(sent[1].body.contains("2-4 hours"));
}

#[tokio::test]
async fn test_no_matching_moderator_falls_back_to_admin() {
    let analysis = serde_json::json!({
        "category": "technical",
        "priority": "medium",
        "summary": "Cluster networking question",
        "tags": ["technical"],
        "required_skills": ["kubernetes"]
    });
    let h = harness(MockAnalysisProvider::new_responding(analysis)).await;
    h.users
        .insert(&user("mod-1", UserRole::Moderator, &["billing"], 100))
        .await
        .unwrap();
    h.users
        .insert(&user("admin-1", UserRole::Admin, &[], 200))
        .await
        .unwrap();

    let outcome = h.pipeline.run(&h.event).await.unwrap();
    assert_eq!(outcome.assignment, Assignment::FallbackAdmin("admin-1".to_string()));
    assert_eq!(outcome.notifications_sent, 2);

    let sent = h.mailer.sent();
    assert!(sent[0]
        .body
        .contains("no moderator available with required skills"));
    assert!(sent[1].body.contains("4-8 hours"));
}

#[tokio::test]
async fn test_no_staff_at_all_completes_unassigned() {
    let h = harness(MockAnalysisProvider::new_responding(billing_analysis())).await;

    let outcome = h.pipeline.run(&h.event).await.unwrap();
    assert_eq!(outcome.assignment, Assignment::Unassigned);
    assert_eq!(outcome.notifications_sent, 1);

    let ticket = h
        .tickets
        .find_by_id(&h.event.ticket_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert!(ticket.assignee_id.is_none());
    // AI fields still persisted
    assert_eq!(ticket.ai_category.as_deref(), Some("billing"));

    let sent = h.mailer.sent();
    assert_eq!(sent[0].to, "user@example.com");
    assert!(sent[0].body.contains("4-8 hours"));
}

#[tokio::test]
async fn test_provider_failure_uses_keyword_fallback() {
    let h = harness(MockAnalysisProvider::new_failing("connection refused")).await;
    h.users
        .insert(&user("mod-1", UserRole::Moderator, &["billing"], 100))
        .await
        .unwrap();

    let outcome = h.pipeline.run(&h.event).await.unwrap();

    // "card" + "urgent" in the description: billing category, high priority
    assert_eq!(outcome.assignment, Assignment::Moderator("mod-1".to_string()));
    let ticket = h
        .tickets
        .find_by_id(&h.event.ticket_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.ai_category.as_deref(), Some("billing"));
    assert_eq!(ticket.priority, TicketPriority::High);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let h = harness(MockAnalysisProvider::new_responding(billing_analysis())).await;
    h.users
        .insert(&user("mod-1", UserRole::Moderator, &["billing"], 100))
        .await
        .unwrap();

    let first = h.pipeline.run(&h.event).await.unwrap();
    assert_eq!(first.assignment, Assignment::Moderator("mod-1".to_string()));

    let assigned_at = h
        .tickets
        .find_by_id(&h.event.ticket_id)
        .await
        .unwrap()
        .unwrap()
        .assigned_at;

    h.clock.advance(60_000);
    let second = h.pipeline.run(&h.event).await.unwrap();
    assert_eq!(second.assignment, Assignment::AlreadyAssigned("mod-1".to_string()));
    assert_eq!(second.notifications_sent, 1);

    let ticket = h
        .tickets
        .find_by_id(&h.event.ticket_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ticket.assignee_id.as_deref(), Some("mod-1"));
    assert_eq!(ticket.assigned_at, assigned_at);

    // One assignment mail total, two confirmations
    assert_eq!(h.mailer.sent_count(), 3);
}

#[tokio::test]
async fn test_mail_failure_never_fails_the_run() {
    let h = harness(MockAnalysisProvider::new_responding(billing_analysis())).await;
    h.users
        .insert(&user("mod-1", UserRole::Moderator, &["billing"], 100))
        .await
        .unwrap();
    h.mailer.reject_all();

    let outcome = h.pipeline.run(&h.event).await.unwrap();
    assert_eq!(outcome.assignment, Assignment::Moderator("mod-1".to_string()));
    assert_eq!(outcome.notifications_sent, 0);
    assert_eq!(h.mailer.sent_count(), 0);
}
