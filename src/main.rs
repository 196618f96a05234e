//! `soulbrowser` binary: wires the agent-core step loop, the action
//! registry, and a live `cdp-adapter` browser session together behind a
//! small CLI. Run with a task string for a single pass, or with none to
//! drop into an interactive REPL that keeps the same browser session open
//! across turns.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use soulbrowser_cli::{AppConfig, OpenAiChatModel, SoulBrowserError};

use action_registry::build_default_registry;
use agent_core::{AgentOrchestrator, AgentRequest, LocalFileSystem};
use cdp_adapter::{event_bus, Cdp, CdpAdapter};
use soulbrowser_core_types::{ChatModel, ExecRoute, FrameId, PageId, SessionId, TaskId};

#[derive(Parser, Debug)]
#[command(name = "soulbrowser", about = "LLM-driven browser automation agent")]
struct Cli {
    /// Task to run once and exit. Omit to start an interactive session.
    task: Option<String>,

    /// Name used for the session's scratch directory under the working dir.
    #[arg(long, default_value = "default")]
    session: String,

    /// Force headless Chrome regardless of config/env settings.
    #[arg(long)]
    headless: bool,

    /// Path to a TOML config file, layered over defaults and env vars.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for rolling daily log files, in addition to stderr.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn init_tracing(log_dir: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "soulbrowser.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_ref());
    let mut config = AppConfig::load(cli.config.clone())?;
    if cli.headless {
        config.browser.headless = true;
    }

    let mut cdp_config = cdp_adapter::config::CdpConfig {
        headless: config.browser.headless,
        ..Default::default()
    };
    if let Some(executable) = config.browser.chrome_executable.clone() {
        cdp_config.executable = executable;
    }

    let (bus, _rx) = event_bus(1024);
    let adapter = Arc::new(CdpAdapter::new(cdp_config, bus));
    Arc::clone(&adapter)
        .start()
        .await
        .map_err(|e| SoulBrowserError::internal(&format!("starting CDP adapter: {e}")))?;

    let registry = Arc::new(build_default_registry());
    let session_dir = std::env::current_dir()?
        .join(".soulbrowser-sessions")
        .join(&cli.session);
    let file_system = Arc::new(LocalFileSystem::new(session_dir)?);
    let llm = Arc::new(OpenAiChatModel::new(&config.llm)?) as Arc<dyn ChatModel>;

    let mut orchestrator = AgentOrchestrator::new(
        config.agent.clone(),
        registry,
        adapter.clone(),
        llm,
        file_system,
    );

    let route = ExecRoute::new(SessionId::new(), PageId::new(), FrameId::new());

    match cli.task {
        Some(task) => run_once(&mut orchestrator, &task, route).await,
        None => run_repl(&mut orchestrator, adapter, route).await,
    }
}

async fn run_once(
    orchestrator: &mut AgentOrchestrator,
    task: &str,
    route: ExecRoute,
) -> anyhow::Result<()> {
    let request = AgentRequest::new(TaskId::new(), task.to_string());
    let outcome = orchestrator.run(&request, route).await?;
    println!("{}", outcome.final_text);
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_repl(
    orchestrator: &mut AgentOrchestrator,
    adapter: Arc<CdpAdapter>,
    route: ExecRoute,
) -> anyhow::Result<()> {
    println!("soulbrowser interactive session. Type `help` for commands.");
    let mut history_log: Vec<String> = Vec::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "exit" | "quit" => break,
            "help" => {
                println!(
                    "commands: help, tabs, history, clear, exit\nanything else is run as a task"
                );
            }
            "tabs" => match adapter.get_tabs().await {
                Ok(tabs) => {
                    for tab in tabs {
                        println!("{}  {}  {}", tab.page.0, tab.title, tab.url);
                    }
                }
                Err(err) => eprintln!("failed to list tabs: {err}"),
            },
            "history" => {
                if history_log.is_empty() {
                    println!("(no tasks run yet)");
                } else {
                    for (i, entry) in history_log.iter().enumerate() {
                        println!("{}: {}", i + 1, entry);
                    }
                }
            }
            "clear" => {
                history_log.clear();
                println!("history cleared");
            }
            task => {
                let request = AgentRequest::new(TaskId::new(), task.to_string());
                match orchestrator.run(&request, route.clone()).await {
                    Ok(outcome) => {
                        println!("{}", outcome.final_text);
                        history_log.push(format!(
                            "{} -> {} ({} steps)",
                            task, outcome.final_text, outcome.steps_taken
                        ));
                    }
                    Err(err) => {
                        eprintln!("task failed: {err}");
                        history_log.push(format!("{task} -> error: {err}"));
                    }
                }
            }
        }
    }

    Ok(())
}
