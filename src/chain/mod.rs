//! Two-stage prompt chain: natural language to SQL, then SQL result to answer
//!
//! Stage one renders the SQL-generation prompt (schema, conversation history,
//! question) and asks the model for a bare SQL statement. Stage two renders
//! the answer-synthesis prompt (the same context plus the executed SQL and
//! its result) and asks for a natural-language explanation. The stages are
//! independently invokable; whether stage two runs at all is the
//! orchestrator's decision.

pub mod client;
pub mod error;
pub mod prompt;

pub use client::{CompletionClient, GroqClient, create_completion_client};
pub use error::{ChainError, ChainResult};
pub use prompt::{AnswerInput, PromptBuilder, SqlGenInput};

use tracing::{debug, info};

/// SQL produced by the generation stage, cleaned of markdown wrapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSql {
    pub sql: String,
}

/// The two-stage pipeline over a completion provider
pub struct PromptChain {
    client: Box<dyn CompletionClient>,
}

impl PromptChain {
    pub fn new(client: Box<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Generate a SQL statement for the user's question.
    ///
    /// The completion is post-processed: markdown fences and doubled
    /// trailing semicolons are stripped. The output is not validated as
    /// SQL; execution is where malformed statements surface.
    pub async fn generate_sql(&self, input: &SqlGenInput<'_>) -> ChainResult<GeneratedSql> {
        info!("Generating SQL with {}", self.client.name());

        let prompt = PromptBuilder::sql_generation(input);
        debug!("SQL generation prompt length: {} chars", prompt.len());

        let completion = self.client.complete(&prompt).await?;
        let sql = clean_sql_response(&completion);
        if sql.is_empty() {
            return Err(ChainError::EmptyCompletion);
        }

        debug!("Generated SQL: {sql}");
        Ok(GeneratedSql { sql })
    }

    /// Write a natural-language answer from the executed SQL and its result.
    pub async fn synthesize_answer(&self, input: &AnswerInput<'_>) -> ChainResult<String> {
        info!("Synthesizing answer with {}", self.client.name());

        let prompt = PromptBuilder::answer_synthesis(input);
        debug!("Answer synthesis prompt length: {} chars", prompt.len());

        let answer = self.client.complete(&prompt).await?;
        Ok(answer.trim().to_string())
    }
}

/// Clean a completion that should be a bare SQL statement: remove markdown
/// code blocks and doubled trailing semicolons.
fn clean_sql_response(sql: &str) -> String {
    let mut cleaned = sql.trim();

    if let Some(rest) = cleaned.strip_prefix("```sql") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }

    let mut cleaned = cleaned.trim().to_string();
    while cleaned.ends_with(";;") {
        cleaned.pop();
    }

    cleaned
}
