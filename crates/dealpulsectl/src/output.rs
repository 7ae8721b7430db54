//! Output formatting - ASCII-only terminal output with ANSI color.

use dealpulse_common::{SweepFailure, SweepSummary};
use owo_colors::OwoColorize;

/// Human-readable summary
pub fn render_summary(summary: &SweepSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", "[OK]".bright_green(), summary.message));

    for change in &summary.results {
        let previous = change
            .previous_health
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {} ({}): {} -> {}\n",
            change.deal_name,
            change.deal_id.dimmed(),
            previous,
            change.new_health.to_string().bold()
        ));
        for line in &change.changes {
            out.push_str(&format!("      * {}\n", line));
        }
    }

    for skipped in &summary.skipped_users {
        out.push_str(&format!(
            "{} user {} skipped: {}\n",
            "[WARN]".yellow(),
            skipped.user_id,
            skipped.reason
        ));
    }
    out
}

pub fn render_failure(failure: &SweepFailure) -> String {
    format!("{} {}\n", "[ERROR]".red(), failure.error)
}

pub fn render_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
}
