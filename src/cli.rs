use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "commitctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Order, run and record configuration commits", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the lifecycle scripts for every change and record the result
    Commit(CommitArgs),

    /// Run validate scripts and schema checks against the candidate
    Validate(ScenarioArgs),

    /// Exit 0 when the candidate differs from the running config, 1 otherwise
    Changed(ScenarioArgs),

    /// Show the order priority groups would run in
    Plan(PlanArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared Arguments
// ============================================================================

/// Scenario file plus per-run overrides of `commitctl.toml`
#[derive(Args, Debug, Clone)]
pub struct ScenarioArgs {
    /// JSON file holding the schema and the annotated diff
    pub scenario: PathBuf,

    /// Number of validation workers (0 = one per CPU)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Session id exported to scripts
    #[arg(long, env = "CONFIG_SESSION_ID")]
    pub session: Option<String>,

    /// User id recorded in the audit log
    #[arg(long)]
    pub user: Option<u32>,

    /// Trace actions skipped by the deferred gate
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CommitArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Run the deferred pass instead of the immediate one
    #[arg(long)]
    pub deferred: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn commit_flags_parse() {
        let cli = Cli::parse_from([
            "commitctl", "-vv", "commit", "candidate.json", "--deferred", "-y", "-j", "4",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Commit(args) = cli.command else {
            panic!("expected commit");
        };
        assert!(args.deferred);
        assert!(args.yes);
        assert_eq!(args.scenario.jobs, Some(4));
        assert_eq!(args.scenario.scenario, PathBuf::from("candidate.json"));
    }
}
