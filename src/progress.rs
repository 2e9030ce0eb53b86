//! Progress bar for commit execution

use colored::Colorize;
use commit::{CommitProgress, Path};
use indicatif::{ProgressBar, ProgressStyle};

use crate::ui;

/// Renders one tick per priority group
pub struct GroupProgress {
    bar: ProgressBar,
}

impl GroupProgress {
    /// A visible bar, or a hidden one when `quiet`
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl CommitProgress for GroupProgress {
    fn on_schedule(&mut self, groups: usize) {
        self.bar.set_length(groups as u64);
    }

    fn on_group_start(&mut self, priority: u64, path: &Path) {
        self.bar.set_message(format!("{priority} {}", ui::group_path(path)));
    }

    fn on_group_complete(&mut self, path: &Path, ok: bool) {
        if !ok {
            self.bar.println(format!("  {} {}", "✗".red(), ui::group_path(path)));
        }
        self.bar.inc(1);
    }
}
