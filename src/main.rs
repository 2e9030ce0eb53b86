mod audit;
mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod runner;
mod scenario;
mod state;
mod structural;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Exit status when the diff and schema disagree
const EXIT_FATAL: u8 = 70;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
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
    };

    match run(&ctx, cli.command) {
        Ok(code) => code,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            let fatal = e
                .downcast_ref::<commit::Error>()
                .is_some_and(commit::Error::is_fatal);
            ExitCode::from(if fatal { EXIT_FATAL } else { 1 })
        }
    }
}

fn run(ctx: &Context, command: Command) -> Result<ExitCode> {
    match command {
        Command::Commit(args) => commands::commit::run(ctx, args),
        Command::Validate(args) => commands::validate::run(ctx, args),
        Command::Changed(args) => commands::changed::run(ctx, args),
        Command::Plan(args) => commands::plan::run(ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "commitctl", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}
