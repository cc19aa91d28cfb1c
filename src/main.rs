mod cli;
mod commands;
mod db;
mod error;
mod filter;
mod keywords;
mod model;
mod util;

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::error::{EXIT_FAILURE, EXIT_INTERRUPTED, exit_code_for};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

fn main() {
    init_tracing();

    // clap would exit with 2 on usage errors, which is reserved for a missing table.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { EXIT_FAILURE } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    if let Err(err) = run(cli) {
        let code = exit_code_for(&err);
        if code == EXIT_INTERRUPTED {
            warn!(error = %err, "interrupted");
        } else {
            error!(error = %err, "command failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
        }
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    if handles_interrupt(&cli.command) {
        ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    match cli.command {
        Commands::Recompute(args) => commands::recompute::run(args, &INTERRUPTED),
        Commands::Explain(args) => commands::explain::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

/// Only `recompute` polls the flag; other commands keep the default SIGINT action.
fn handles_interrupt(command: &Commands) -> bool {
    matches!(command, Commands::Recompute(_))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).expect("args should parse").command
    }

    #[test]
    fn only_recompute_installs_interrupt_handler() {
        assert!(handles_interrupt(&command(&["ckw", "recompute"])));
        assert!(!handles_interrupt(&command(&["ckw", "status"])));
        assert!(!handles_interrupt(&command(&["ckw", "explain", "--id", "7"])));
    }
}
