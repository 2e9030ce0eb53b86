use anyhow::Result;
use colored::Colorize;
use commit::CommitOutcome;
use std::process::ExitCode;

use super::{Session, plan};
use crate::Context;
use crate::audit::FileAudit;
use crate::cli::CommitArgs;
use crate::progress::GroupProgress;
use crate::state::EffectiveStore;
use crate::ui;

pub fn run(ctx: &Context, args: CommitArgs) -> Result<ExitCode> {
    let session = Session::open(&args.scenario)?;
    let base = session.context();

    let preview = commit::plan(&base)?;
    let ask = session.settings.confirm && !args.yes && !preview.is_empty();
    if ask || (ctx.verbose > 0 && !ctx.quiet) {
        plan::print(&preview);
    }
    if ask && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(ExitCode::FAILURE);
    }

    let state_dir = session.settings.state_path()?;
    let store = EffectiveStore::open(state_dir.clone())?;
    let audit = FileAudit::open(&state_dir)?;
    let mut commit_ctx = base.with_effective(&store).with_audit(&audit);
    commit_ctx.deferred = args.deferred;

    let mut progress = GroupProgress::new(ctx.quiet);
    let outcome = commit::commit_with_progress(&commit_ctx, &mut progress)?;
    progress.finish();

    if args.deferred {
        ui::warn("Deferred pass: effective configuration left unchanged");
    } else if outcome.successes > 0 {
        store.save()?;
    }

    if !ctx.quiet {
        ui::outputs(&outcome.outputs);
    }
    ui::errors(&outcome.errors);
    print_summary(&outcome);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Commit these changes?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(outcome: &CommitOutcome) {
    println!();
    if outcome.is_success() {
        println!("  {} Commit succeeded", "✓".green().bold());
    } else if outcome.successes > 0 {
        println!("  {} Commit partially applied", "⚠".yellow().bold());
    } else {
        println!("  {} Commit failed", "✗".red().bold());
    }

    if outcome.successes > 0 {
        println!("    • {} priority groups applied", outcome.successes);
    }
    if outcome.failures > 0 {
        println!("    • {} {} failed", outcome.failures, "priority groups".red());
    }
}
