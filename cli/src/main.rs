use clap::Parser;
use newsdesk_core::mcp::StdioSession;
use newsdesk_core::{
    AgentLoop, Config, MessageKind, NewsdeskError, Provider, Reporter, ToolSession, providers,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod display;

use display::ConsoleReporter;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Ask questions answered by tools on a local tool server", long_about = None)]
struct Cli {
    /// Tool server to launch: a .py script, a .js script, or an executable
    server_script: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Empty,
    Query(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Empty
    } else if trimmed.eq_ignore_ascii_case("exit") {
        Input::Exit
    } else {
        Input::Query(trimmed)
    }
}

/// Where user lines come from. `None` ends the session.
trait Prompt {
    fn next_line(&mut self) -> Option<String>;
}

impl Prompt for DefaultEditor {
    fn next_line(&mut self) -> Option<String> {
        match self.readline("> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.trim());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                None
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let reporter = Arc::new(ConsoleReporter::default());

    match run(cli, reporter.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.report(MessageKind::Error, &format!("[{}] {}", e.category(), e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, reporter: Arc<ConsoleReporter>) -> Result<(), NewsdeskError> {
    let script = cli.server_script.ok_or_else(|| {
        NewsdeskError::Configuration("Missing server script path".to_string())
    })?;
    let config = Config::load()?;
    let provider = providers::create_provider(&config.client)?;
    let editor = DefaultEditor::new()
        .map_err(|e| NewsdeskError::Configuration(format!("terminal unavailable: {e}")))?;

    let session = match StdioSession::connect(&script, config.client.request_timeout()).await {
        Ok(session) => Arc::new(session.with_tool_call_timeout(config.tool_call_timeout())),
        Err(e) => {
            reporter.report(MessageKind::Error, &format!("Connection failed: {}", e));
            return Err(e);
        }
    };

    run_session(&config, provider, session, reporter, editor, wait_for_ctrl_c).await
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Runs the chat and shuts the tool session down however it ends.
async fn run_session<P, I, F>(
    config: &Config,
    provider: Arc<dyn Provider>,
    session: Arc<dyn ToolSession>,
    reporter: Arc<dyn Reporter>,
    prompt: P,
    interrupt: I,
) -> Result<(), NewsdeskError>
where
    P: Prompt,
    I: Fn() -> F,
    F: Future<Output = ()>,
{
    let outcome = chat(config, provider, session.clone(), reporter, prompt, interrupt).await;

    if let Err(e) = session.close().await {
        warn!("Failed to shut down tool server: {}", e);
    }
    outcome
}

async fn chat<P, I, F>(
    config: &Config,
    provider: Arc<dyn Provider>,
    session: Arc<dyn ToolSession>,
    reporter: Arc<dyn Reporter>,
    mut prompt: P,
    interrupt: I,
) -> Result<(), NewsdeskError>
where
    P: Prompt,
    I: Fn() -> F,
    F: Future<Output = ()>,
{
    let agent = AgentLoop::connect(provider, session, reporter.clone())
        .await
        .map_err(|e| NewsdeskError::Connection(e.to_string()))?
        .with_max_retries(config.client.max_retries);

    reporter.report(
        MessageKind::Info,
        "Newsdesk ready. Type queries below ('exit' to quit)",
    );

    while let Some(line) = prompt.next_line() {
        let query = match parse_input(&line) {
            Input::Exit => break,
            Input::Empty => continue,
            Input::Query(query) => query,
        };

        tokio::select! {
            result = agent.process(query) => match result {
                Ok(answer) => reporter.report(MessageKind::Response, &answer),
                Err(e) => reporter.report(
                    MessageKind::Error,
                    &format!("[{}] {}", e.category(), e),
                ),
            },
            _ = interrupt() => {
                warn!("Interrupted while processing query");
                break;
            }
        }
    }

    reporter.report(MessageKind::Info, "Session terminated");
    Ok(())
}
