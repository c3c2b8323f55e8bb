// Colored terminal output for `sieve check` and `sieve config`.

use colored::Colorize;

use crate::moderation::traits::ModerationVerdict;
use crate::pipeline::Outcome;

/// Display the outcome of a single pipeline run.
pub fn display_outcome(outcome: &Outcome) {
    let status = if outcome.is_success() {
        "PASS".green().bold()
    } else {
        "BLOCKED".red().bold()
    };

    println!("\n{} {}", status, outcome.message());

    match outcome {
        Outcome::InputRejected(verdict) => {
            println!("  Stage: {}", "input moderation".yellow());
            display_verdict(verdict);
        }
        Outcome::OutputRejected(verdict) => {
            println!("  Stage: {}", "output moderation".yellow());
            display_verdict(verdict);
        }
        Outcome::GenerationFailed => {
            println!("  Stage: {}", "generation".yellow());
            println!("  {}", "See the log output above for the upstream error.".dimmed());
        }
        Outcome::ValidationFailed => {
            println!("  Stage: {}", "validation".yellow());
        }
        Outcome::Succeeded(text) => {
            println!("\n{}", text);
        }
    }
}

fn display_verdict(verdict: &ModerationVerdict) {
    match (&verdict.violated_category, verdict.severity) {
        (Some(category), Some(severity)) => {
            println!("  Category: {} (severity {})", category.bright_red(), severity);
        }
        // Fail-closed verdicts carry no category.
        _ => println!(
            "  {}",
            "Moderation service unavailable; content blocked.".dimmed()
        ),
    }
}

/// Display a redacted configuration summary.
pub fn display_config(entries: &[(&'static str, String)]) {
    println!("\n{}", "=== Configuration ===".bold());
    for (name, value) in entries {
        println!("  {:<28} {}", name.dimmed(), value);
    }
}
