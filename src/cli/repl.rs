//! Interactive shell for running directives.
//!
//! Lines containing `[BOT:` are executed as directives. Tab completes slash
//! commands, categories after `[BOT:` and command ids after `[BOT:<category>:`.
//!
//! ## Commands
//!
//! - `/help` - Show available commands
//! - `/quit` or `/exit` - Exit the shell
//! - `/categories` - List categories
//! - `/commands [category]` - List commands
//! - `/examples` - Example directives
//! - `/list` - Executions in the store
//! - `/status <id>` - Show one execution record

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use rustyline::completion::Completer;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Editor, Helper};
use tokio::sync::mpsc;
use uuid::Uuid;

use botcommander::commander::{BotCategory, BotCommander, CommandRegistry};
use botcommander::directive;
use botcommander::settings::Settings;

const SLASH_COMMANDS: &[&str] = &[
    "/help",
    "/quit",
    "/exit",
    "/categories",
    "/commands",
    "/examples",
    "/list",
    "/status",
];

const DIRECTIVE_MARKER: &str = "[BOT:";

/// Rustyline helper completing slash commands and directive parts.
struct ReplHelper {
    categories: Vec<&'static str>,
    commands: HashMap<BotCategory, Vec<String>>,
}

impl ReplHelper {
    fn new(registry: &CommandRegistry) -> Self {
        Self {
            categories: directive::supported_categories(),
            commands: BotCategory::ALL
                .into_iter()
                .map(|c| (c, registry.command_ids(c)))
                .collect(),
        }
    }

    /// Completion start offset and candidates for the text before the cursor.
    fn candidates(&self, prefix: &str) -> (usize, Vec<String>) {
        if prefix.starts_with('/') && !prefix.contains(' ') {
            let matches = SLASH_COMMANDS
                .iter()
                .filter(|cmd| cmd.starts_with(prefix))
                .map(|cmd| cmd.to_string())
                .collect();
            return (0, matches);
        }

        let Some(marker) = prefix.to_ascii_uppercase().rfind(DIRECTIVE_MARKER) else {
            return (0, vec![]);
        };
        let after = marker + DIRECTIVE_MARKER.len();
        let tail = &prefix[after..];

        match tail.split_once(':') {
            None => {
                let partial = tail.trim_start();
                let start = after + (tail.len() - partial.len());
                let matches = self
                    .categories
                    .iter()
                    .filter(|c| c.starts_with(&partial.to_ascii_lowercase()))
                    .map(|c| format!("{c}:"))
                    .collect();
                (start, matches)
            }
            Some((category, partial)) => {
                if partial.contains([',', ']']) {
                    return (0, vec![]);
                }
                let Some(ids) = BotCategory::parse(category)
                    .ok()
                    .and_then(|c| self.commands.get(&c))
                else {
                    return (0, vec![]);
                };
                let trimmed = partial.trim_start();
                let start = after + category.len() + 1 + (partial.len() - trimmed.len());
                let matches = ids
                    .iter()
                    .filter(|id| id.starts_with(trimmed))
                    .cloned()
                    .collect();
                (start, matches)
            }
        }
    }
}

impl Completer for ReplHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok(self.candidates(&line[..pos]))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if !line.starts_with('/') || pos < line.len() {
            return None;
        }

        SLASH_COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && **cmd != line)
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Highlighter for ReplHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{hint}\x1b[0m"))
    }
}

impl Validator for ReplHelper {}
impl Helper for ReplHelper {}

fn history_path() -> std::path::PathBuf {
    Settings::default_dir().join("history")
}

fn print_help() {
    println!("Enter a directive such as:");
    println!("  // [BOT:trading:risk_warden, human_approval=true, risk_threshold=0.1]");
    println!();
    println!("  /categories            list categories");
    println!("  /commands [category]   list commands");
    println!("  /examples              example directives");
    println!("  /list                  executions in the store");
    println!("  /status <id>           show one execution");
    println!("  /quit                  exit");
}

/// Line editing runs on its own thread and feeds lines to the async loop.
fn spawn_reader(helper: ReplHelper) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);

    std::thread::spawn(move || {
        let config = match Config::builder().history_ignore_dups(true) {
            Ok(builder) => builder
                .auto_add_history(true)
                .completion_type(CompletionType::List)
                .build(),
            Err(e) => {
                eprintln!("Failed to configure line editor: {e}");
                return;
            }
        };

        let mut rl = match Editor::with_config(config) {
            Ok(editor) => editor,
            Err(e) => {
                eprintln!("Failed to initialize line editor: {e}");
                return;
            }
        };
        rl.set_helper(Some(helper));

        let hist_path = history_path();
        if let Some(parent) = hist_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.load_history(&hist_path);

        loop {
            match rl.readline("\x1b[1;36mbot\u{203A}\x1b[0m ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.blocking_send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("Input error: {e}");
                    break;
                }
            }
        }

        let _ = rl.save_history(&hist_path);
    });

    rx
}

pub async fn run(commander: BotCommander) -> anyhow::Result<()> {
    let commander = Arc::new(commander);
    let mut lines = spawn_reader(ReplHelper::new(commander.registry()));

    println!("\x1b[1mBotCommander\x1b[0m  /help for commands, /quit to exit");
    println!();

    while let Some(line) = lines.recv().await {
        let (head, arg) = match line.split_once(char::is_whitespace) {
            Some((head, arg)) => (head, Some(arg.trim())),
            None => (line.as_str(), None),
        };

        match head.to_lowercase().as_str() {
            "/quit" | "/exit" => break,
            "/help" => print_help(),
            "/categories" => {
                for summary in commander.list_categories() {
                    println!(
                        "  {:<16} {:>3} commands{}",
                        summary.category.alias(),
                        summary.command_count,
                        if summary.handler_available {
                            ""
                        } else {
                            "  (no handler)"
                        }
                    );
                }
            }
            "/commands" => match commander.list_commands(arg.filter(|a| !a.is_empty())) {
                Ok(commands) => {
                    for cmd in commands {
                        println!(
                            "  {}:{:<26} {}",
                            cmd.category.alias(),
                            cmd.command_id,
                            cmd.description
                        );
                    }
                }
                Err(e) => eprintln!("{e}"),
            },
            "/examples" => {
                for example in directive::examples() {
                    println!("  {}", example.example);
                }
            }
            "/list" => {
                for execution in commander.list_executions().await {
                    println!(
                        "  {}  {:<10} {}",
                        execution.execution_id,
                        execution.status,
                        execution.command.key()
                    );
                }
            }
            "/status" => match arg.map(Uuid::parse_str) {
                Some(Ok(id)) => match commander.get_execution_status(&id).await {
                    Some(execution) => println!("{}", serde_json::to_string_pretty(&execution)?),
                    None => eprintln!("No execution with id {id}"),
                },
                Some(Err(e)) => eprintln!("Invalid execution id: {e}"),
                None => eprintln!("Usage: /status <execution id>"),
            },
            _ if line.to_ascii_uppercase().contains(DIRECTIVE_MARKER) => {
                match commander.execute_directive(&line).await {
                    Ok(execution) => {
                        println!("{}", serde_json::to_string_pretty(&execution)?)
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            _ => eprintln!("Not a directive. Try /examples or /help."),
        }
    }

    let cancelled = commander.shutdown().await;
    if !cancelled.is_empty() {
        println!("Cancelled {} running executions", cancelled.len());
    }
    Ok(())
}
