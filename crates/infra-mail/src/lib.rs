// TicketFlow Infrastructure - Mail Adapter
// Implements: Mailer over an HTTP transactional-mail API

mod mailer;

pub use mailer::{HttpMailer, MailConfig};
