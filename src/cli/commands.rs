//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

#![allow(clippy::format_push_string)]

use std::io::{self, Read, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::agent::adapter::{CompletionAdapter, CompletionOptions};
use crate::agent::analysis::Document;
use crate::agent::client::create_provider;
use crate::agent::config::{AgentConfig, DispatchMode};
use crate::agent::coordinator::Coordinator;
use crate::agent::events::{AnalysisEvent, AnalysisObserver, TracingObserver};
use crate::agent::message::{ChatMessage, Role};
use crate::agent::prompt::PromptSet;
use crate::cli::output::{OutputFormat, format_analyses, format_verdict};
use crate::cli::parser::{AgentArgs, Cli, Commands};
use crate::error::{CommandError, Result};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Analyze { file, agent } => cmd_analyze(file.as_deref(), agent, format),
        Commands::Judge {
            original,
            summary,
            agent,
        } => cmd_judge(original, summary, agent, format),
        Commands::Complete { messages, agent } => cmd_complete(messages, agent, format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

/// Observer for interactive runs: logs through `tracing` and echoes
/// stream fragments to stderr as they arrive.
struct ConsoleObserver {
    echo_fragments: bool,
}

impl AnalysisObserver for ConsoleObserver {
    fn on_event(&self, event: &AnalysisEvent) {
        TracingObserver.on_event(event);
        if self.echo_fragments
            && let AnalysisEvent::Fragment { text, .. } = event
        {
            let mut stderr = io::stderr();
            let _ = write!(stderr, "{text}");
            let _ = stderr.flush();
        }
    }
}

/// A single document or an array of documents.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentInput {
    Many(Vec<Document>),
    One(Document),
}

/// Builds agent configuration: CLI flags, then environment, then defaults.
fn build_config(args: &AgentArgs) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder();
    if let Some(provider) = &args.provider {
        builder = builder.provider(provider);
    }
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    if args.stream {
        builder = builder.stream(true);
    }
    if args.no_judge {
        builder = builder.judge(false);
    }
    if args.mailbox {
        builder = builder.dispatch(DispatchMode::Mailbox);
    }
    if let Some(n) = args.concurrency {
        builder = builder.max_concurrency(n);
    }
    if let Some(ms) = args.request_delay_ms {
        builder = builder.request_delay(Duration::from_millis(ms));
    }
    if let Some(ms) = args.document_delay_ms {
        builder = builder.document_delay(Duration::from_millis(ms));
    }
    if let Some(dir) = &args.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    if let Some(path) = &args.secrets {
        builder = builder.secrets_path(path);
    }

    builder.from_env().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}")).into()
    })
}

fn runtime() -> Result<Runtime> {
    Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

/// Cancels `token` on Ctrl-C. Must be called inside the runtime.
fn cancel_on_ctrl_c(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight work");
            token.cancel();
        }
    });
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Parses a JSON document or array of documents.
fn parse_documents(input: &str) -> Result<(Vec<Document>, bool)> {
    let parsed: DocumentInput = serde_json::from_str(input)
        .map_err(|e| CommandError::InvalidInput(format!("Invalid document JSON: {e}")))?;
    let (documents, single) = match parsed {
        DocumentInput::Many(docs) => (docs, false),
        DocumentInput::One(doc) => (vec![doc], true),
    };
    if documents.is_empty() {
        return Err(CommandError::InvalidInput("No documents to analyze".to_string()).into());
    }
    Ok((documents, single))
}

fn cmd_analyze(file: Option<&Path>, args: &AgentArgs, format: OutputFormat) -> Result<String> {
    let (documents, single) = parse_documents(&read_input(file)?)?;
    let config = build_config(args)?;
    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;
    let echo_fragments = config.stream && format == OutputFormat::Text;

    let rt = runtime()?;
    let results = rt.block_on(async {
        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(&cancel);
        let coordinator = Coordinator::builder(provider, config)
            .observer(Arc::new(ConsoleObserver { echo_fragments }))
            .cancellation(cancel)
            .build()?;
        Ok::<_, crate::error::AgentError>(coordinator.analyze_batch(&documents).await)
    });
    let results = results
        .map_err(|e| CommandError::ExecutionFailed(format!("Analysis failed: {e}")))?;

    match format {
        OutputFormat::Text => Ok(format_analyses(&results)),
        OutputFormat::Json => match (single, results.first()) {
            (true, Some(result)) => Ok(format.to_json(result)),
            _ => Ok(format.to_json(&results)),
        },
    }
}

fn cmd_judge(
    original: &Path,
    summary: &Path,
    args: &AgentArgs,
    format: OutputFormat,
) -> Result<String> {
    let original_text = std::fs::read_to_string(original)?;
    let summary_text = std::fs::read_to_string(summary)?;
    let config = build_config(args)?;
    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;

    let rt = runtime()?;
    let verdict = rt.block_on(async {
        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(&cancel);
        let coordinator = Coordinator::builder(provider, config)
            .cancellation(cancel)
            .build()?;
        coordinator.judge(&original_text, &summary_text).await
    });
    let verdict =
        verdict.map_err(|e| CommandError::ExecutionFailed(format!("Judge failed: {e}")))?;

    match format {
        OutputFormat::Text => Ok(format_verdict(&verdict)),
        OutputFormat::Json => Ok(format.to_json(&verdict)),
    }
}

/// Parses `ROLE=CONTENT` arguments into messages.
fn parse_messages(raw: &[String]) -> Result<Vec<ChatMessage>> {
    raw.iter()
        .map(|arg| {
            let (role, content) = arg.split_once('=').ok_or_else(|| {
                CommandError::InvalidInput(format!("Expected ROLE=CONTENT, got: {arg}"))
            })?;
            let role: Role = role
                .parse()
                .map_err(|e| CommandError::InvalidInput(format!("{e}")))?;
            Ok(ChatMessage {
                role,
                content: content.to_string(),
            })
        })
        .collect()
}

fn cmd_complete(raw_messages: &[String], args: &AgentArgs, format: OutputFormat) -> Result<String> {
    let messages = parse_messages(raw_messages)?;
    let config = build_config(args)?;
    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;
    let echo_fragments = config.stream && format == OutputFormat::Text;

    let rt = runtime()?;
    let completion = rt.block_on(async {
        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(&cancel);
        let adapter = CompletionAdapter::new(provider, CompletionOptions::from_config(&config))
            .with_observer(Arc::new(ConsoleObserver { echo_fragments }))
            .with_cancellation(cancel);
        adapter.complete("CompletionAdapter", messages, false).await
    });
    let completion = completion
        .map_err(|e| CommandError::ExecutionFailed(format!("Completion failed: {e}")))?;

    match format {
        OutputFormat::Text => {
            if echo_fragments {
                let _ = writeln!(io::stderr());
            }
            Ok(format!("{}\n", completion.text))
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "text": completion.text,
                "finish_reason": completion.finish_reason,
                "usage": completion.usage,
                "fragments": completion.fragments,
            });
            Ok(format.to_json(&json))
        }
    }
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str(&format!(
                        "  {}\n",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    ));
                }
                output.push_str("\nEdit these files to customize facet system prompts.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}
