// TicketFlow Infrastructure - AI Analysis Adapter
// Implements: AnalysisProvider over an OpenAI-compatible chat endpoint

mod provider;

pub use provider::{AiConfig, HttpAnalysisProvider};
