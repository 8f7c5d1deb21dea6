//! Per-turn coordination of the chat loop
//!
//! One user question drives a strict sequence: SQL generation, execution,
//! then (only when execution succeeded) answer synthesis. Every path through
//! a turn appends exactly one Human and one Assistant turn to the session,
//! so the transcript invariant holds whether the model, the server, or the
//! network failed.

use tracing::{debug, warn};

use crate::chain::{AnswerInput, PromptChain, SqlGenInput};
use crate::database::{Database, QueryOutcome};
use crate::session::ConversationSession;

/// Where the loop stands within the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for user input.
    AwaitingQuery,
    /// Running generation, execution, and synthesis for one question.
    Processing,
}

/// Drives one question through the prompt chain and the database.
pub struct ChatOrchestrator {
    chain: PromptChain,
    history_window: usize,
    state: TurnState,
}

impl ChatOrchestrator {
    pub fn new(chain: PromptChain, history_window: usize) -> Self {
        Self {
            chain,
            history_window,
            state: TurnState::AwaitingQuery,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Run one full turn. Returns `None` without touching the session when
    /// the input is empty or whitespace; otherwise returns the Assistant
    /// response that was appended.
    pub async fn respond(
        &mut self,
        database: &Database,
        session: &mut ConversationSession,
        question: &str,
    ) -> Option<String> {
        let question = question.trim();
        if !self.begin_turn(question) {
            return None;
        }

        // History as it stood before this question, so the rendered prompt
        // carries the question exactly once.
        let history = session.transcript(self.history_window);

        let response = match database.schema_description().await {
            Ok(schema) => self.run_stages(database, &schema, &history, question).await,
            Err(e) => {
                warn!("Schema introspection failed: {e}");
                format!("Could not read the database schema: {e}")
            }
        };

        self.finish_turn(session, question, &response);
        Some(response)
    }

    /// Transition into `Processing` for askable input. Empty and
    /// whitespace-only input never starts a turn.
    fn begin_turn(&mut self, question: &str) -> bool {
        if question.trim().is_empty() {
            return false;
        }
        self.state = TurnState::Processing;
        true
    }

    /// Record the exchange and return to `AwaitingQuery`.
    fn finish_turn(&mut self, session: &mut ConversationSession, question: &str, response: &str) {
        session.record_exchange(question, response);
        self.state = TurnState::AwaitingQuery;
    }

    async fn run_stages(
        &self,
        database: &Database,
        schema: &str,
        history: &str,
        question: &str,
    ) -> String {
        let generated = match self
            .chain
            .generate_sql(&SqlGenInput {
                schema,
                history,
                question,
            })
            .await
        {
            Ok(generated) => generated,
            Err(e) => {
                warn!("SQL generation failed: {e}");
                // Degraded turn: no SQL exists to show, but the exchange is
                // still recorded so the transcript stays paired.
                return e.user_message();
            }
        };

        debug!("Generated SQL: {}", generated.sql);
        let outcome = database.run_query(&generated.sql).await;
        self.compose_answer(schema, history, question, &generated.sql, outcome)
            .await
    }

    /// Turn an execution outcome into the Assistant response. Split from
    /// `run_stages` so the short-circuit and degradation paths are testable
    /// without a live server.
    async fn compose_answer(
        &self,
        schema: &str,
        history: &str,
        question: &str,
        sql: &str,
        outcome: QueryOutcome,
    ) -> String {
        match outcome {
            // Failed SQL short-circuits: show the attempt and the server's
            // complaint, and never invoke the answer stage.
            QueryOutcome::Failure { message } => format_response(sql, &format!("Error: {message}")),
            QueryOutcome::Success {
                rendered,
                row_count,
            } => {
                debug!("Query returned {row_count} row(s)");
                match self
                    .chain
                    .synthesize_answer(&AnswerInput {
                        schema,
                        history,
                        question,
                        sql,
                        result: &rendered,
                    })
                    .await
                {
                    Ok(answer) => format_response(sql, &answer),
                    Err(e) => {
                        warn!("Answer synthesis failed: {e}");
                        format_response(
                            sql,
                            &format!(
                                "{rendered}\n\n(The natural-language explanation is \
                                 unavailable: {})",
                                e.user_message()
                            ),
                        )
                    }
                }
            }
        }
    }
}

/// Fenced SQL block followed by the answer or error body.
fn format_response(sql: &str, body: &str) -> String {
    format!("SQL Query:\n```sql\n{sql}\n```\n\n{body}")
}
