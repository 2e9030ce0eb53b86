use colored::Colorize;
use commit::{Error, Output};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print captured script output, one block per node
pub fn outputs(outputs: &[Output]) {
    if outputs.is_empty() {
        return;
    }
    section("Output");
    for output in outputs {
        println!("  {}", format!("[{}]", output.path).dimmed());
        for line in output.text.lines() {
            println!("    {line}");
        }
    }
}

/// Print collected errors
pub fn errors(errors: &[Error]) {
    if errors.is_empty() {
        return;
    }
    section("Errors");
    for err in errors {
        let origin = if err.is_structural() { "schema" } else { "script" };
        eprintln!("  {} {} {}", "✗".red(), format!("{origin}:").dimmed(), err);
    }
}

/// Format a priority group path for display
pub fn group_path(path: &commit::Path) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}
