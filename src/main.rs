use clap::{CommandFactory, Parser};
use dbdialog::chain::{PromptChain, create_completion_client};
use dbdialog::cli::{Args, Shell};
use dbdialog::config::Config;
use dbdialog::database::{ConnectionParams, Database};
use dbdialog::orchestrator::ChatOrchestrator;
use dbdialog::session::{ConversationSession, GREETING};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use nu_ansi_term::Color;
use std::error::Error as StdError;
use std::io;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Main async workflow
pub async fn async_main() -> Result<(), Box<dyn StdError>> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for the conversation.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: failed to initialize logging");
    }
    debug!("Parsed arguments: {args:?}");

    // Handle shell completion generation if requested
    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        match shell {
            Shell::Bash => {
                clap_complete::generate(
                    clap_complete::shells::Bash,
                    &mut cmd,
                    "dbdialog",
                    &mut io::stdout(),
                );
            }
            Shell::Zsh => {
                clap_complete::generate(
                    clap_complete::shells::Zsh,
                    &mut cmd,
                    "dbdialog",
                    &mut io::stdout(),
                );
            }
            Shell::Fish => {
                clap_complete::generate(
                    clap_complete::shells::Fish,
                    &mut cmd,
                    "dbdialog",
                    &mut io::stdout(),
                );
            }
            Shell::PowerShell => {
                clap_complete::generate(
                    clap_complete::shells::PowerShell,
                    &mut cmd,
                    "dbdialog",
                    &mut io::stdout(),
                );
            }
            Shell::Elvish => {
                clap_complete::generate(
                    clap_complete::shells::Elvish,
                    &mut cmd,
                    "dbdialog",
                    &mut io::stdout(),
                );
            }
        }
        return Ok(());
    }

    let config = Config::load();
    config.validate()?;

    // Connect. A URL argument gets one attempt; the interactive form comes
    // back around on failure so the user can fix a typo.
    let database = match args.connection_url {
        Some(ref url) => {
            let params = ConnectionParams::from_url(url)?;
            match Database::connect(&params).await {
                Ok(db) => db,
                Err(e) => {
                    eprintln!(
                        "{}",
                        Color::Red.paint(format!("Failed to connect to database: {e}"))
                    );
                    return Err(e.into());
                }
            }
        }
        None => match connect_interactively(&config).await {
            Ok(database) => database,
            Err(e) if is_user_cancel(&e) => {
                println!("Goodbye!");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        },
    };
    println!("Connected to database: {}", database.database_name());

    let client = create_completion_client(&config.llm)?;
    let chain = PromptChain::new(client);
    let orchestrator = ChatOrchestrator::new(chain, config.chat.history_window);
    let session = ConversationSession::new();

    if !args.question.is_empty() {
        return run_questions(database, orchestrator, session, &args.question).await;
    }

    run_chat_loop(database, orchestrator, session, &config).await
}

/// Execute `--question` arguments in order within one session, then exit.
async fn run_questions(
    database: Database,
    mut orchestrator: ChatOrchestrator,
    mut session: ConversationSession,
    questions: &[String],
) -> Result<(), Box<dyn StdError>> {
    for question in questions {
        if let Some(response) = orchestrator.respond(&database, &mut session, question).await {
            println!("{response}\n");
        }
    }
    database.close().await;
    Ok(())
}

/// The interactive chat loop
async fn run_chat_loop(
    mut database: Database,
    mut orchestrator: ChatOrchestrator,
    mut session: ConversationSession,
    config: &Config,
) -> Result<(), Box<dyn StdError>> {
    println!("{}", Color::Cyan.bold().paint(GREETING));
    println!("Type \\h for help");

    loop {
        let line = match Text::new("You:").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled) => continue,
            Err(InquireError::OperationInterrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        // Handle special commands
        if input.starts_with('\\') {
            match input {
                "\\q" => {
                    println!("Goodbye!");
                    break;
                }
                "\\c" => {
                    // The old handle is gone once the form opens, so backing
                    // out of the reconnect can only end the session cleanly.
                    database = match reconnect(database, config).await {
                        Ok(database) => database,
                        Err(e) if is_user_cancel(&e) => {
                            println!("Goodbye!");
                            return Ok(());
                        }
                        Err(e) => return Err(e.into()),
                    };
                    println!("Connected to database: {}", database.database_name());
                }
                "\\schema" => match database.schema_description().await {
                    Ok(schema) => println!("{schema}"),
                    Err(e) => {
                        eprintln!("{}", Color::Red.paint(format!("Error reading schema: {e}")));
                    }
                },
                "\\h" => print_help(),
                _ => {
                    println!("Unknown command: {input}");
                    println!("Type \\h for help");
                }
            }
            continue;
        }

        if let Some(response) = orchestrator.respond(&database, &mut session, input).await {
            println!("{response}\n");
        }
    }

    database.close().await;
    Ok(())
}

/// Collect connection parameters via the form until a connection succeeds.
/// Backing out of the form surfaces as an `InquireError` for the caller to
/// classify.
async fn connect_interactively(config: &Config) -> Result<Database, InquireError> {
    loop {
        let params = prompt_connection_params(config)?;
        match Database::connect(&params).await {
            Ok(database) => return Ok(database),
            Err(e) => {
                eprintln!("{}", Color::Red.paint(format!("Connection failed: {e}")));
            }
        }
    }
}

/// Replace the connection. The old handle is closed before the form opens,
/// so there is never more than one live handle; cancelling the form leaves
/// no handle at all.
async fn reconnect(old: Database, config: &Config) -> Result<Database, InquireError> {
    old.close().await;
    connect_interactively(config).await
}

/// True when a prompt error is the user backing out (Esc or Ctrl-C) rather
/// than a real failure; callers turn these into a clean exit.
fn is_user_cancel(err: &InquireError) -> bool {
    matches!(
        err,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Connection form seeded with the configured defaults. The password is
/// never defaulted and never echoed.
fn prompt_connection_params(config: &Config) -> Result<ConnectionParams, InquireError> {
    let host = Text::new("Host:")
        .with_default(&config.database.host)
        .prompt()?;
    let port = Text::new("Port:")
        .with_default(&config.database.port)
        .prompt()?;
    let user = Text::new("User:")
        .with_default(&config.database.user)
        .prompt()?;
    let password = Password::new("Password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    let database = Text::new("Database:")
        .with_default(&config.database.database)
        .prompt()?;

    Ok(ConnectionParams {
        host,
        port,
        user,
        password,
        database,
    })
}

fn print_help() {
    println!("Available commands:");
    println!("  \\q          - Quit");
    println!("  \\c          - Connect to a different database");
    println!("  \\schema     - Show the schema description given to the model");
    println!("  \\h          - Show this help message");
    println!("  <question>  - Ask about your data in natural language");
}

fn main() -> Result<(), Box<dyn StdError>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async_main());
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_esc_and_ctrl_c_are_user_cancels() {
        assert!(is_user_cancel(&InquireError::OperationCanceled));
        assert!(is_user_cancel(&InquireError::OperationInterrupted));
    }

    #[rstest]
    fn test_real_prompt_failures_are_not_user_cancels() {
        assert!(!is_user_cancel(&InquireError::NotTTY));
    }
}
