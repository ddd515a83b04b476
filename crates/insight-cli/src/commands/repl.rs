//! Interactive shell keeping one analysis session alive between commands.
//!
//! Repeating a command on unchanged input replays the stored sections, and
//! a section that failed is regenerated on the next attempt.

use super::analyze::{self, AnalyzeArgs};
use super::context::AppContext;
use super::dissect::{self, DissectArgs};
use super::extract::{self, ExtractArgs};
use crate::Cli;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use insight_application::{AnalysisSession, CodeTask, SessionRegistry};
use insight_core::section::{SectionId, SectionStatus};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use strum::{Display, EnumString, IntoEnumIterator};
use tokio_util::sync::CancellationToken;

const COMMANDS: &[&str] = &["analyze", "dissect", "extract", "reset", "status", "help", "quit"];

#[derive(Args, Debug)]
pub struct ReplArgs {}

/// One line typed at the prompt.
#[derive(Parser, Debug)]
#[command(name = "insight>", no_binary_name = true)]
struct ReplLine {
    #[command(subcommand)]
    command: ReplCommand,
}

#[derive(Subcommand, Debug)]
enum ReplCommand {
    /// Explain a data file, look for security issues and suggest visualizations
    Analyze(AnalyzeArgs),
    /// Explain, optimize or reduce the cost of a query snippet
    Dissect(DissectArgs),
    /// Turn unstructured text into JSON
    Extract(ExtractArgs),
    /// Forget generated sections of a page (file, code, json or all)
    Reset {
        #[arg(default_value_t = Page::All)]
        page: Page,
    },
    /// Show which sections hold a stored result
    Status,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum Page {
    File,
    Code,
    Json,
    All,
}

impl Page {
    fn sections(self) -> Vec<SectionId> {
        match self {
            Self::File => vec![
                SectionId::Explanation,
                SectionId::ExplanationHeaderless,
                SectionId::Security,
                SectionId::Visualization,
            ],
            Self::Code => CodeTask::iter().map(CodeTask::section).collect(),
            Self::Json => vec![SectionId::JsonExtraction],
            Self::All => [Self::File, Self::Code, Self::Json]
                .into_iter()
                .flat_map(Self::sections)
                .collect(),
        }
    }
}

/// Completes command names at the start of the line.
struct ReplHelper;

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if line.contains(' ') {
            return Ok((0, Vec::new()));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|command| command.starts_with(line))
            .map(|command| Pair {
                display: command.to_string(),
                replacement: command.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

pub async fn run(cli: &Cli, _args: &ReplArgs) -> Result<()> {
    // Ctrl-C is handled by the line editor here, not by a one-shot token.
    let context = AppContext::build_with_cancellation(cli, CancellationToken::new()).await?;
    let registry = SessionRegistry::new();
    let (session_id, session) = registry.open().await;
    tracing::info!(session_id = %session_id, "Interactive session started");

    let mut editor: Editor<ReplHelper, _> = Editor::new()?;
    editor.set_helper(Some(ReplHelper));

    println!("=== Data Insight ===");
    println!("Type 'help' for commands, or 'quit' to exit.");

    let outcome: Result<()> = loop {
        let line = match editor.readline("insight> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("Ctrl-C detected. Type 'quit' to exit.");
                continue;
            }
            Err(ReadlineError::Eof) => break Ok(()),
            Err(err) => break Err(err.into()),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(trimmed);

        let command = match parse_line(trimmed) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        if matches!(command, ReplCommand::Quit) {
            break Ok(());
        }

        let mut session = session.lock().await;
        if let Err(err) = execute(&context, &mut session, &command).await {
            eprintln!("Error: {err:#}");
        }
    };

    registry.close(&session_id).await;
    println!("Goodbye!");
    outcome
}

fn parse_line(line: &str) -> std::result::Result<ReplCommand, String> {
    let words = split_words(line)?;
    ReplLine::try_parse_from(words)
        .map(|parsed| parsed.command)
        .map_err(|err| err.render().to_string())
}

async fn execute(
    context: &AppContext,
    session: &mut AnalysisSession,
    command: &ReplCommand,
) -> Result<()> {
    match command {
        ReplCommand::Analyze(args) => analyze::execute(context, session, args).await,
        ReplCommand::Dissect(args) => dissect::execute(context, session, args).await,
        ReplCommand::Extract(args) => extract::execute(context, session, args).await,
        ReplCommand::Reset { page } => {
            reset(session, *page);
            println!("Cleared {page} sections.");
            Ok(())
        }
        ReplCommand::Status => {
            print_status(session);
            Ok(())
        }
        ReplCommand::Quit => Ok(()),
    }
}

fn reset(session: &mut AnalysisSession, page: Page) {
    for section in page.sections() {
        session.sections.reset(section);
    }
}

fn print_status(session: &AnalysisSession) {
    println!("Session {}", session.id);
    for section in Page::All.sections() {
        let record = session.sections.get(section);
        let state = match (record.status, &record.bound_artifact_identity) {
            (SectionStatus::Done, Some(identity)) => format!("done ({identity})"),
            (SectionStatus::Done, None) => "done".to_string(),
            (SectionStatus::NotStarted, _) => "not started".to_string(),
        };
        println!("  {:<28} {state}", section.heading());
    }
}

/// Splits a command line into words, honoring single and double quotes and
/// backslash escapes.
fn split_words(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(open), ch) if ch == open => quote = None,
            (Some('"') | None, '\\') => match chars.next() {
                Some(escaped) => {
                    current.push(escaped);
                    in_word = true;
                }
                None => return Err("Trailing backslash".to_string()),
            },
            (Some(_), ch) => current.push(ch),
            (None, '"' | '\'') => {
                quote = Some(ch);
                in_word = true;
            }
            (None, ch) if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, ch) => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if let Some(open) = quote {
        return Err(format!("Unclosed quote {open}"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
