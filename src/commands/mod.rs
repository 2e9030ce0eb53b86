pub mod changed;
pub mod commit;
pub mod plan;
pub mod validate;

use anyhow::Result;
use ::commit::CommitContext;

use crate::cli::ScenarioArgs;
use crate::config::Settings;
use crate::runner::ShellExecutor;
use crate::scenario::Scenario;
use crate::structural::MandatoryValidator;

/// Settings, scenario and collaborators shared by every command
pub struct Session {
    pub settings: Settings,
    pub scenario: Scenario,
    executor: ShellExecutor,
    structural: MandatoryValidator,
}

impl Session {
    /// Load settings and the scenario, applying command-line overrides
    pub fn open(args: &ScenarioArgs) -> Result<Self> {
        let mut settings = Settings::load()?;
        if let Some(jobs) = args.jobs {
            settings.workers = jobs;
        }
        if let Some(session) = &args.session {
            settings.session_id.clone_from(session);
        }
        if let Some(user) = args.user {
            settings.user_id = user;
        }
        settings.debug |= args.debug;

        let scenario = Scenario::load(&args.scenario)?;
        let executor = ShellExecutor::new(settings.shell.clone());
        Ok(Self {
            settings,
            scenario,
            executor,
            structural: MandatoryValidator,
        })
    }

    /// Commit context without effective database or audit file
    pub fn context(&self) -> CommitContext<'_> {
        let mut ctx = CommitContext::new(&self.scenario.diff, &self.executor)
            .with_structural(&self.structural)
            .with_session(self.settings.session(), self.settings.user_id);
        ctx.debug = self.settings.debug;
        ctx.workers = self.settings.workers;
        ctx
    }
}
