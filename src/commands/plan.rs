use anyhow::Result;
use colored::Colorize;
use commit::{CommitPlan, PlannedGroup};
use std::process::ExitCode;

use super::Session;
use crate::Context;
use crate::cli::PlanArgs;
use crate::ui;

pub fn run(ctx: &Context, args: PlanArgs) -> Result<ExitCode> {
    let session = Session::open(&args.scenario)?;
    let plan = commit::plan(&session.context())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else if plan.is_empty() {
        if !ctx.quiet {
            ui::info("No changes to commit");
        }
    } else {
        print(&plan);
    }
    Ok(ExitCode::SUCCESS)
}

/// Print delete and set groups in execution order
pub fn print(plan: &CommitPlan) {
    if !plan.delete.is_empty() {
        ui::section("Delete (highest priority first)");
        for group in &plan.delete {
            println!("  {}", line(group));
        }
    }
    if !plan.set.is_empty() {
        ui::section("Set (lowest priority first)");
        for group in &plan.set {
            println!("  {}", line(group));
        }
    }
}

fn line(group: &PlannedGroup) -> String {
    let symbol = if group.deleted { "-".red() } else { "+".green() };
    format!(
        "{symbol} {} {}",
        format!("{:>5}", group.priority).dimmed(),
        ui::group_path(&group.path)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use commit::Path;

    #[test]
    fn line_shows_priority_and_path() {
        colored::control::set_override(false);
        let group = PlannedGroup {
            priority: 300,
            path: Path::from("interfaces ethernet dp0s3"),
            deleted: true,
        };
        assert_eq!(line(&group), "-   300 interfaces ethernet dp0s3");
    }
}
