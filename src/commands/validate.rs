use anyhow::Result;
use std::process::ExitCode;

use super::Session;
use crate::Context;
use crate::cli::ScenarioArgs;
use crate::ui;

pub fn run(ctx: &Context, args: ScenarioArgs) -> Result<ExitCode> {
    let session = Session::open(&args)?;
    let outcome = commit::validate(&session.context())?;

    if !ctx.quiet {
        ui::outputs(&outcome.outputs);
    }
    ui::errors(&outcome.errors);

    if outcome.ok {
        if !ctx.quiet {
            ui::success("Validation passed");
        }
        Ok(ExitCode::SUCCESS)
    } else {
        ui::error(&format!("Validation failed with {} errors", outcome.errors.len()));
        Ok(ExitCode::FAILURE)
    }
}
