//! Prompt rendering for the two chain stages
//!
//! Rendering is pure: inputs in, prompt text out, no I/O. The conversation
//! history always appears before the current question, and the question
//! appears exactly once, at the end of the prompt.

/// Input for the SQL-generation stage
#[derive(Debug, Clone, Copy)]
pub struct SqlGenInput<'a> {
    pub schema: &'a str,
    pub history: &'a str,
    pub question: &'a str,
}

/// Input for the answer-synthesis stage
#[derive(Debug, Clone, Copy)]
pub struct AnswerInput<'a> {
    pub schema: &'a str,
    pub history: &'a str,
    pub question: &'a str,
    pub sql: &'a str,
    pub result: &'a str,
}

/// Prompt builder for the chain stages
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render the SQL-generation prompt: schema and history as context,
    /// few-shot examples, then the question. The model is instructed to
    /// answer with a bare SQL statement and nothing else.
    pub fn sql_generation(input: &SqlGenInput<'_>) -> String {
        format!(
            "You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.\n\
             Based on the table schema below, write a SQL query that would answer the user's question. Take the conversation history into account.\n\
             \n\
             <SCHEMA>{schema}</SCHEMA>\n\
             \n\
             Conversation History: {history}\n\
             \n\
             Write only the SQL query and nothing else. Do not wrap the SQL query in any other text, not even backticks.\n\
             \n\
             For example:\n\
             Question: which 3 artists have the most tracks?\n\
             SQL Query: SELECT ArtistId, COUNT(*) as track_count FROM Track GROUP BY ArtistId ORDER BY track_count DESC LIMIT 3;\n\
             Question: Name 10 artists\n\
             SQL Query: SELECT Name FROM Artist LIMIT 10;\n\
             \n\
             Your turn:\n\
             \n\
             Question: {question}\n\
             SQL Query:",
            schema = input.schema,
            history = input.history,
            question = input.question,
        )
    }

    /// Render the answer-synthesis prompt: the executed SQL and its result
    /// alongside the original context, asking for a natural-language answer.
    pub fn answer_synthesis(input: &AnswerInput<'_>) -> String {
        format!(
            "You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.\n\
             Based on the table schema below, question, SQL query, and SQL response, write a natural language response.\n\
             \n\
             <SCHEMA>{schema}</SCHEMA>\n\
             \n\
             Conversation History: {history}\n\
             SQL Query: <SQL>{sql}</SQL>\n\
             User question: {question}\n\
             SQL Response: {result}",
            schema = input.schema,
            history = input.history,
            sql = input.sql,
            question = input.question,
            result = input.result,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_sql_prompt_places_history_before_question() {
        let input = SqlGenInput {
            schema: "CREATE TABLE users (id INT)",
            history: "Assistant: Hello.\nHuman: hi",
            question: "how many users are there?",
        };
        let prompt = PromptBuilder::sql_generation(&input);

        let history_pos = prompt.find("Assistant: Hello.").unwrap();
        let question_pos = prompt.find("how many users are there?").unwrap();
        assert!(history_pos < question_pos);
    }

    #[rstest]
    fn test_sql_prompt_has_question_exactly_once_at_the_end() {
        let input = SqlGenInput {
            schema: "CREATE TABLE orders (id INT)",
            history: "Assistant: Hello.",
            question: "count the orders placed yesterday",
        };
        let prompt = PromptBuilder::sql_generation(&input);

        assert_eq!(prompt.matches(input.question).count(), 1);
        // The question is the last substituted element, followed only by the
        // trailing completion cue.
        assert!(prompt.ends_with(&format!("Question: {}\nSQL Query:", input.question)));
    }

    #[rstest]
    fn test_sql_prompt_embeds_schema_and_instructions() {
        let input = SqlGenInput {
            schema: "CREATE TABLE t (x INT)",
            history: "",
            question: "anything",
        };
        let prompt = PromptBuilder::sql_generation(&input);

        assert!(prompt.contains("<SCHEMA>CREATE TABLE t (x INT)</SCHEMA>"));
        assert!(prompt.contains("Write only the SQL query and nothing else"));
        assert!(prompt.contains("not even backticks"));
    }

    #[rstest]
    fn test_answer_prompt_carries_sql_and_result() {
        let input = AnswerInput {
            schema: "CREATE TABLE users (id INT)",
            history: "Assistant: Hello.",
            question: "how many users?",
            sql: "SELECT COUNT(*) FROM users;",
            result: "COUNT(*)\n42",
        };
        let prompt = PromptBuilder::answer_synthesis(&input);

        assert!(prompt.contains("<SQL>SELECT COUNT(*) FROM users;</SQL>"));
        assert!(prompt.contains("SQL Response: COUNT(*)\n42"));
        assert!(prompt.contains("User question: how many users?"));
        assert!(prompt.contains("write a natural language response"));
    }

    #[rstest]
    fn test_answer_prompt_places_history_before_question() {
        let input = AnswerInput {
            schema: "s",
            history: "Human: earlier question",
            question: "the current question",
            sql: "SELECT 1;",
            result: "1",
        };
        let prompt = PromptBuilder::answer_synthesis(&input);

        let history_pos = prompt.find("earlier question").unwrap();
        let question_pos = prompt.find("the current question").unwrap();
        assert!(history_pos < question_pos);
    }
}
