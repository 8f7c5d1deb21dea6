pub mod chain;
pub mod cli;
pub mod config;
pub mod database;
pub mod format;
pub mod orchestrator;
pub mod session;

pub use chain::{CompletionClient, PromptChain, create_completion_client};
pub use config::Config;
pub use database::{ConnectionParams, Database, QueryOutcome};
pub use orchestrator::ChatOrchestrator;
pub use session::{ConversationSession, ConversationTurn, TurnRole};
