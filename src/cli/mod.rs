//! Command-line interface.

mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use botcommander::bootstrap;
use botcommander::commander::{BotCommander, Parameters};
use botcommander::config::Config;
use botcommander::directive;
use botcommander::error::{CommandError, Error};
use botcommander::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "botcommander", version, about = "Execute and inspect bot commands")]
pub struct Cli {
    /// TOML config file (default: ~/.botcommander/config.toml)
    #[arg(long, global = true, env = "BOTCOMMANDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one `// [BOT:...]` directive and print the execution record
    Run {
        directive: String,
        /// Context object passed to the handler, as JSON
        #[arg(long)]
        context: Option<String>,
    },
    /// Validate directive syntax without executing it
    Check { directive: String },
    /// List registered commands
    Commands {
        #[arg(long, short)]
        category: Option<String>,
        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// List bot categories with command counts
    Categories,
    /// Print one example directive per category
    Examples,
    /// Interactive shell
    Repl,
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Command::Config {
        action: ConfigAction::Init { force },
    } = &cli.command
    {
        return init_config(cli.config.clone(), *force);
    }

    let mut config = Config::from_env_with_toml(cli.config.as_deref())
        .context("failed to load configuration")?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    bootstrap::init_logging(&config.logging);

    let commander = BotCommander::builder().config(&config).build();

    match cli.command {
        Command::Run { directive, context } => run_directive(&commander, &directive, context).await,
        Command::Check { directive } => Ok(if check(&directive) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }),
        Command::Commands { category, json } => list_commands(&commander, category.as_deref(), json),
        Command::Categories => {
            print_categories(&commander);
            Ok(ExitCode::SUCCESS)
        }
        Command::Examples => {
            for example in directive::examples() {
                println!("{:<16} {}", example.category, example.example);
                println!("{:<16} {}", "", example.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Repl => {
            repl::run(commander).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { .. } => {
            println!("{config:#?}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_directive(
    commander: &BotCommander,
    text: &str,
    context: Option<String>,
) -> anyhow::Result<ExitCode> {
    let parsed = match directive::validate_syntax(text) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let context: Option<Parameters> = context
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .context("--context must be a JSON object")?;

    let execution = match commander
        .execute_command(&parsed.category, &parsed.command, parsed.params, context)
        .await
    {
        Ok(execution) => execution,
        Err(e @ CommandError::NotFound { .. }) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(Error::from(e).into()),
    };

    println!("{}", serde_json::to_string_pretty(&execution)?);
    Ok(ExitCode::SUCCESS)
}

fn check(text: &str) -> bool {
    match directive::validate_syntax(text) {
        Ok(parsed) => {
            println!(
                "Command syntax is valid: {}:{} ({} parameters)",
                parsed.category,
                parsed.command,
                parsed.params.len()
            );
            true
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

fn list_commands(
    commander: &BotCommander,
    category: Option<&str>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let commands = match commander.list_commands(category) {
        Ok(commands) => commands,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&commands)?);
        return Ok(ExitCode::SUCCESS);
    }

    for cmd in &commands {
        println!(
            "{:<22} {:<26} {:>4}s  {}",
            cmd.category.alias(),
            cmd.command_id,
            cmd.execution_timeout,
            cmd.description
        );
    }
    println!("\n{} commands", commands.len());
    Ok(ExitCode::SUCCESS)
}

fn print_categories(commander: &BotCommander) {
    for summary in commander.list_categories() {
        println!(
            "{:<16} {:<22} {:>3} commands  handler: {}",
            summary.category.alias(),
            summary.display_name,
            summary.command_count,
            if summary.handler_available { "yes" } else { "no" }
        );
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<ExitCode> {
    let path = path.unwrap_or_else(Settings::default_toml_path);
    if path.exists() && !force {
        eprintln!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
        return Ok(ExitCode::FAILURE);
    }
    Settings::default()
        .save_toml(&path)
        .map_err(anyhow::Error::msg)?;
    println!("Wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_context() {
        let cli = Cli::try_parse_from([
            "botcommander",
            "run",
            "// [BOT:game:anti_detect]",
            "--context",
            "{\"session\": 1}",
        ])
        .unwrap();
        match cli.command {
            Command::Run { directive, context } => {
                assert_eq!(directive, "// [BOT:game:anti_detect]");
                assert_eq!(context.as_deref(), Some("{\"session\": 1}"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli =
            Cli::try_parse_from(["botcommander", "commands", "-c", "trading", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Commands { category: Some(ref c), json: false } if c == "trading"
        ));
    }

    #[test]
    fn check_reports_validity() {
        assert!(check("// [BOT:meta:bot_architect]"));
        assert!(!check("// [BOT:nope:x]"));
    }
}
