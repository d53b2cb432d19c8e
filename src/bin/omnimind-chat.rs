//! Interactive chat application for conversing with an OmniMind engine.
//!
//! This binary provides a REPL interface for chatting with a locally
//! running engine over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with the persisted (or default) engine URL
//! omnimind-chat
//!
//! # Point at a specific engine
//! omnimind-chat --engine-url http://localhost:9000
//!
//! # Disable colors (useful for piping output)
//! omnimind-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/engine [url]` - Show or change the engine URL
//! - `/upload <file>` - Upload a document for analysis
//! - `/open <path|n>` - Open a file or folder on the engine's machine
//! - `/quit` - Exit the application
//!
//! Press Ctrl-C while a request is running to cancel it; the query
//! returns to the input line for correction.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use omnimind::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, Settings, help_text, parse_command,
};
use omnimind::markdown::{self, Block, Document, Inline, RenderMode, TableCell};
use omnimind::types::{RecordSummary, Turn, TurnRole};
use omnimind::HttpEngine;

/// Main entry point for the omnimind-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("omnimind-chat [OPTIONS]");
    let settings = Settings::load().unwrap_or_default();
    let config = ChatConfig::resolve(args, &settings);
    let style = Style {
        color: config.use_color,
    };
    let health_check = config.health_check;
    let transcript_path = config.transcript_path.clone();

    let engine = HttpEngine::new(&config.engine_url)?;
    let mut session = ChatSession::new(engine, config);
    session.set_transcript_path(transcript_path);
    let mut rl = DefaultEditor::new()?;

    // Ctrl-C cancels the in-flight exchange; at the prompt it is a no-op
    // here because rustyline reads it as a key.
    let cancel = session.cancel_handle();
    ctrlc::set_handler(move || {
        cancel.cancel();
    })?;

    println!("OmniMind Chat (engine: {})", session.engine_url());
    if health_check {
        match session.check_connection().await {
            Ok(()) => println!("{}", style.dim("engine online")),
            Err(err) => {
                println!("{}", style.warn(&format!("engine unreachable: {err}")));
                println!(
                    "{}",
                    style.dim("start the engine or use /engine <url> to change the address")
                );
            }
        }
    }
    println!("Type /help for commands, /quit to exit\n");

    // Targets from the most recently rendered batch, addressable as
    // /open <n>.
    let mut open_targets: Vec<String> = Vec::new();

    loop {
        let restored = session.take_restored_input();
        let readline = match restored {
            Some(initial) => rl.readline_with_initial("You: ", (initial.as_str(), "")),
            None => rl.readline("You: "),
        };

        match readline {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if let Some(cmd) = parse_command(&line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            open_targets.clear();
                            println!("{}", style.dim("Conversation cleared."));
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Engine(None) => {
                            println!("Engine URL: {}", session.engine_url());
                        }
                        ChatCommand::Engine(Some(url)) => match HttpEngine::new(&url) {
                            Ok(engine) => {
                                session.set_engine(url.clone(), engine);
                                let settings = Settings {
                                    engine_url: Some(url.clone()),
                                };
                                if let Err(err) = settings.save() {
                                    println!(
                                        "{}",
                                        style.warn(&format!("could not persist setting: {err}"))
                                    );
                                }
                                match session.check_connection().await {
                                    Ok(()) => println!("Engine URL set to {url} (online)"),
                                    Err(err) => println!(
                                        "Engine URL set to {url} ({})",
                                        style.warn(&format!("unreachable: {err}"))
                                    ),
                                }
                            }
                            Err(err) => println!("{}", style.error(&err.to_string())),
                        },
                        ChatCommand::Upload(path) => {
                            let before = session.turns().len();
                            let _ = session.upload(Path::new(&path)).await;
                            render_new_turns(
                                session.turns(),
                                before,
                                &style,
                                &mut open_targets,
                            );
                        }
                        ChatCommand::Open(target) => {
                            let target = resolve_open_target(&target, &open_targets);
                            match session.open_path(&target).await {
                                Ok(outcome) if outcome.opened => {
                                    println!("{}", style.dim(&outcome.message));
                                }
                                Ok(outcome) => println!("{}", style.warn(&outcome.message)),
                                Err(err) => println!("{}", style.error(&err.to_string())),
                            }
                        }
                        ChatCommand::Records => match session.refresh_records().await {
                            Ok(_) => print_records(session.records(), &style),
                            Err(err) => println!("{}", style.error(&err.to_string())),
                        },
                        ChatCommand::Facts => match session.refresh_facts().await {
                            Ok(_) => print_facts(session.facts(), &style),
                            Err(err) => println!("{}", style.error(&err.to_string())),
                        },
                        ChatCommand::TranscriptPath(path) => {
                            session.set_transcript_path(Some(PathBuf::from(&path)));
                            println!("{}", style.dim(&format!("Transcript auto-save set to {path}")));
                        }
                        ChatCommand::ClearTranscriptPath => {
                            session.set_transcript_path(None);
                            println!("{}", style.dim("Transcript auto-save disabled."));
                        }
                        ChatCommand::SaveTranscript(path) => {
                            match session.save_transcript_to(&path) {
                                Ok(()) => {
                                    println!("{}", style.dim(&format!("Transcript saved to {path}")))
                                }
                                Err(err) => println!(
                                    "{}",
                                    style.error(&format!("Failed to save transcript: {err}"))
                                ),
                            }
                        }
                        ChatCommand::LoadTranscript(path) => {
                            match session.load_transcript_from(&path) {
                                Ok(()) => {
                                    open_targets.clear();
                                    render_new_turns(
                                        session.turns(),
                                        0,
                                        &style,
                                        &mut open_targets,
                                    );
                                }
                                Err(err) => println!(
                                    "{}",
                                    style.error(&format!("Failed to load transcript: {err}"))
                                ),
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            println!("{}", style.error(&message));
                        }
                    }
                    continue;
                }

                // Regular query: send to the engine with a live timer.
                let before = session.turns().len();
                let timer = spawn_timer(&style);
                let result = session.submit(&line).await;
                timer.abort();
                clear_timer_line();

                match result {
                    // Skip the echoed user turn; the prompt already
                    // shows it.
                    Ok(_) => render_new_turns(
                        session.turns(),
                        before + 1,
                        &style,
                        &mut open_targets,
                    ),
                    Err(err) => println!("{}", style.error(&err.to_string())),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C at prompt - discard the line
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                println!("{}", style.error(&format!("Input error: {err}")));
                break;
            }
        }
    }

    Ok(())
}

/// ANSI styling helpers, disabled under --no-color.
#[derive(Debug, Copy, Clone)]
struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn italic(&self, text: &str) -> String {
        self.paint("3", text)
    }

    fn underline(&self, text: &str) -> String {
        self.paint("4", text)
    }

    fn code(&self, text: &str) -> String {
        self.paint("36", text)
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn warn(&self, text: &str) -> String {
        self.paint("33", text)
    }

    fn error(&self, text: &str) -> String {
        self.paint("31", text)
    }

    fn role(&self, text: &str) -> String {
        self.paint("1;32", text)
    }
}

/// Spawns the in-flight timer: "Thinking... 1.2s", updated every 100ms.
fn spawn_timer(style: &Style) -> tokio::task::JoinHandle<()> {
    let style = *style;
    tokio::spawn(async move {
        let start = Instant::now();
        let mut interval = tokio::time::interval(Duration::from_millis(100));
        loop {
            interval.tick().await;
            let secs = (start.elapsed().as_secs_f64() * 10.0).round() / 10.0;
            print!("\r{}", style.dim(&format!("Thinking... {secs:.1}s")));
            let _ = std::io::stdout().flush();
        }
    })
}

fn clear_timer_line() {
    print!("\r\x1b[2K");
    let _ = std::io::stdout().flush();
}

/// Resolves a `/open` argument: a number picks from the last rendered
/// batch's targets, anything else is used as a path.
fn resolve_open_target(argument: &str, open_targets: &[String]) -> String {
    if let Ok(index) = argument.parse::<usize>()
        && index >= 1
        && index <= open_targets.len()
    {
        return open_targets[index - 1].clone();
    }
    argument.to_string()
}

/// Renders turns appended since `from`, collecting open targets into a
/// fresh numbered registry.
fn render_new_turns(turns: &[Turn], from: usize, style: &Style, open_targets: &mut Vec<String>) {
    let new = &turns[from.min(turns.len())..];
    if new.is_empty() {
        return;
    }
    open_targets.clear();
    for turn in new {
        let (header, mode) = match turn.role {
            TurnRole::User => ("You", RenderMode::User),
            TurnRole::Assistant => ("OmniMind", RenderMode::Assistant),
        };
        println!("{}:", style.role(header));
        let doc = markdown::render(&turn.content, mode);
        print_document(&doc, style, open_targets);
        if let Some(elapsed) = turn.elapsed_seconds {
            println!("{}", style.dim(&format!("  ({elapsed:.1}s)")));
        }
        println!();
    }
    if !open_targets.is_empty() {
        let listing = open_targets
            .iter()
            .enumerate()
            .map(|(i, target)| format!("[{}] {}", i + 1, target))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", style.dim(&format!("open with /open <n>: {listing}")));
        println!();
    }
}

fn print_document(doc: &Document, style: &Style, open_targets: &mut Vec<String>) {
    print_blocks(&doc.blocks, "  ", style, open_targets);
}

fn print_blocks(blocks: &[Block], indent: &str, style: &Style, open_targets: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(inlines) => {
                println!("{indent}{}", render_inlines(inlines, style, open_targets));
            }
            Block::Heading { level, inlines } => {
                let marker = "#".repeat(*level as usize);
                let text = render_inlines(inlines, style, open_targets);
                println!("{indent}{}", style.heading(&format!("{marker} {text}")));
            }
            Block::List {
                ordered,
                start,
                items,
            } => {
                for (offset, item) in items.iter().enumerate() {
                    let bullet = if *ordered {
                        format!("{}.", start + offset as u64)
                    } else {
                        "-".to_string()
                    };
                    println!(
                        "{indent}{bullet} {}",
                        render_inlines(item, style, open_targets)
                    );
                }
            }
            Block::BlockQuote(inner) => {
                let deeper = format!("{indent}| ");
                print_blocks(inner, &deeper, style, open_targets);
            }
            Block::CodeBlock { code, .. } => {
                for line in code.lines() {
                    println!("{indent}    {}", style.code(line));
                }
            }
            Block::Table { header, rows } => {
                print_table(header, rows, indent, style, open_targets);
            }
            Block::Rule => {
                println!("{indent}{}", style.dim("----------------------------------------"));
            }
        }
    }
}

fn render_inlines(inlines: &[Inline], style: &Style, open_targets: &mut Vec<String>) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Italic(text) => out.push_str(&style.italic(text)),
            Inline::Bold { text, open_target } => match open_target {
                Some(target) => {
                    open_targets.push(target.clone());
                    out.push_str(&style.underline(&style.bold(text)));
                    out.push_str(&style.dim(&format!("[{}]", open_targets.len())));
                }
                None => out.push_str(&style.bold(text)),
            },
            Inline::Code { text, open_target } => match open_target {
                Some(target) => {
                    open_targets.push(target.clone());
                    out.push_str(&style.underline(&style.code(text)));
                    out.push_str(&style.dim(&format!("[{}]", open_targets.len())));
                }
                None => out.push_str(&style.code(text)),
            },
        }
    }
    out
}

fn print_table(
    header: &[TableCell],
    rows: &[Vec<TableCell>],
    indent: &str,
    style: &Style,
    open_targets: &mut Vec<String>,
) {
    // Cells print as flattened text; interactive cells get a numbered
    // marker like inline spans do.
    let flat = |cell: &TableCell, open_targets: &mut Vec<String>| -> String {
        let text: String = cell
            .inlines
            .iter()
            .map(|inline| match inline {
                Inline::Text(t) | Inline::Italic(t) => t.clone(),
                Inline::Bold { text, .. } | Inline::Code { text, .. } => text.clone(),
            })
            .collect();
        match &cell.open_target {
            Some(target) => {
                open_targets.push(target.clone());
                format!("{text}[{}]", open_targets.len())
            }
            None => text,
        }
    };

    let mut all_rows: Vec<Vec<String>> = Vec::new();
    all_rows.push(header.iter().map(|c| flat(c, open_targets)).collect());
    for row in rows {
        all_rows.push(row.iter().map(|c| flat(c, open_targets)).collect());
    }

    let columns = all_rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in &all_rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    for (index, row) in all_rows.iter().enumerate() {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ");
        if index == 0 {
            println!("{indent}{}", style.bold(&line));
            let rule = widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-");
            println!("{indent}{}", style.dim(&rule));
        } else {
            println!("{indent}{line}");
        }
    }
}

fn print_records(records: &[RecordSummary], style: &Style) {
    if records.is_empty() {
        println!("{}", style.dim("No records extracted yet."));
        return;
    }
    println!("    Extracted records:");
    for record in records {
        let vendor = record.vendor_name.as_deref().unwrap_or("(unknown vendor)");
        let material = record.material.as_deref().unwrap_or("-");
        let total = match (&record.total, &record.currency) {
            (Some(total), Some(currency)) => format!("{total} {currency}"),
            (Some(total), None) => total.clone(),
            _ => "-".to_string(),
        };
        let delivery = record
            .delivery_weeks
            .map(|w| format!("{w} wk"))
            .unwrap_or_else(|| "-".to_string());
        println!("      {vendor}: {material}, {total}, delivery {delivery}");
    }
}

fn print_facts(facts: &[String], style: &Style) {
    if facts.is_empty() {
        println!("{}", style.dim("Nothing learned yet."));
        return;
    }
    println!("    Learned facts:");
    for fact in facts {
        println!("      - {fact}");
    }
}

fn print_stats<G: omnimind::EngineGateway>(session: &ChatSession<G>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Engine: {}", stats.engine_url);
    println!("      Turns: {}", stats.turn_count);
    println!(
        "      Exchanges: {} ({} cancelled, {} failed)",
        stats.exchange_count, stats.cancelled_count, stats.failed_count
    );
    println!(
        "      Cached: {} records, {} facts",
        stats.cached_records, stats.cached_facts
    );
    match stats.transcript_path {
        Some(ref path) => println!("      Transcript file: {}", path.display()),
        None => println!("      Transcript file: (disabled)"),
    }
}
