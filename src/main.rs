mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// `--config` override
    pub config: Option<PathBuf>,
    /// `--state` override
    pub state: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
        state: cli.state,
    };

    match cli.command {
        Command::Schema => commands::schema::run(),
        Command::Plan(args) => commands::lifecycle::plan(&ctx, &args),
        Command::Apply(args) => commands::lifecycle::apply(&ctx, &args),
        Command::Refresh(args) => commands::lifecycle::refresh(&ctx, &args),
        Command::Import { address, id } => commands::import::run(&ctx, &address, &id),
        Command::Lookup { name, json } => commands::lookup::run(&ctx, &name, json),
        Command::Destroy(args) => commands::lifecycle::destroy(&ctx, &args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "jcgroup", &mut io::stdout());
            Ok(())
        }
    }
}
