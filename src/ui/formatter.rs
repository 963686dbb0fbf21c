//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.

use console::style;

use crate::domain::Suggestions;
use crate::workflow::{ReleaseOutcome, ReleasePlan};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print an error together with every cause beneath it
pub fn display_error_chain(error: &anyhow::Error) {
    display_error(&error.to_string());
    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", style("caused by:").dim(), cause);
    }
}

/// Numbered step list for a release plan.
///
/// # Example
/// ```ignore
/// 1. Check out branch 'develop'
/// 2. Fast-forward from the remote
/// ```
pub fn format_plan_steps(plan: &ReleasePlan) -> Vec<String> {
    plan.steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step.describe()))
        .collect()
}

/// Display what a release will do (or would do, in dry-run mode)
pub fn display_plan(plan: &ReleasePlan, remote: &str, dry_run: bool) {
    let heading = if dry_run {
        format!("Dry run: {} release {}", plan.kind, plan.tag)
    } else {
        format!("Publishing {} release {}", plan.kind, plan.tag)
    };
    println!("\n{}", style(heading).bold());
    println!("  Remote: {}", style(remote).cyan());
    for line in format_plan_steps(plan) {
        println!("  {}", line);
    }
    println!();
}

/// Display the outcome of a finished release
pub fn display_outcome(outcome: &ReleaseOutcome) {
    display_success(&format!(
        "{} {} published on {}",
        outcome.kind,
        style(&outcome.tag).green().bold(),
        style(&outcome.branch).cyan()
    ));
}

/// One-line hint shown above the interactive prompt
pub fn format_latest_hint(suggestions: &Suggestions) -> String {
    if suggestions.latest == Default::default() {
        "No release tags found yet".to_string()
    } else {
        format!("Latest release: {}", suggestions.latest)
    }
}
