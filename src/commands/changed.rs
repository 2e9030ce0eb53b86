use anyhow::Result;
use std::process::ExitCode;

use super::Session;
use crate::Context;
use crate::cli::ScenarioArgs;
use crate::ui;

pub fn run(ctx: &Context, args: ScenarioArgs) -> Result<ExitCode> {
    let session = Session::open(&args)?;
    let changed = commit::changed(&session.context())?;

    if !ctx.quiet {
        if changed {
            ui::info("Candidate differs from the running configuration");
        } else {
            ui::dim("No changes");
        }
    }
    Ok(if changed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
