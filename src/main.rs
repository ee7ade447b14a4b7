use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use resalloc::{Engine, PolicyKind, export};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "resalloc - Deadlock analysis over resource-allocation snapshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a JSON request file ("-" reads stdin)
    Run {
        request: PathBuf,

        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,

        /// Record the analysis event to this log file
        #[arg(long, value_name = "PATH")]
        log: Option<PathBuf>,

        /// Victim policy for recovery requests that name none
        #[arg(long, value_enum, default_value_t = PolicyKind::MinAllocation)]
        policy: PolicyKind,
    },
    /// Print the share token for a log file
    Export {
        /// Path to the log file
        log_file: PathBuf,
    },
}

fn read_request(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read request from stdin")?;
        Ok(input)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path.display()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            request,
            pretty,
            log,
            policy,
        } => {
            let mut config = Engine::builder().victim_policy(policy);
            if let Some(path) = log {
                config = config.with_log(path);
            }
            let engine = config.build()?;

            let input = read_request(&request)?;
            let response = engine.handle_value(&input);
            let output = if pretty {
                serde_json::to_string_pretty(&response)?
            } else {
                response.to_string()
            };
            println!("{output}");

            engine.flush()?;
        }
        Command::Export { log_file } => {
            println!("{}", export::export(log_file)?);
        }
    }

    Ok(())
}
