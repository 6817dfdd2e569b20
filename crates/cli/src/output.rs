//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use storysweep_common::{EntryReport, SweepSummary};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Violation blocks on stdout as entries are audited, summary table on stderr
    #[default]
    Text,
    /// One JSON summary on stdout once the sweep completes
    Json,
}

fn status(entry: &EntryReport) -> String {
    if entry.parse_error.is_some() {
        "unparsed".yellow().to_string()
    } else if entry.violations.is_empty() {
        "ok".green().to_string()
    } else {
        "violations".red().to_string()
    }
}

/// Per-entry table of a finished sweep
pub fn summary_table(summary: &SweepSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Entry", "Status", "Violations", "Screenshot"]);
    for entry in &summary.entries {
        table.add_row(vec![
            entry.name.clone(),
            status(entry),
            entry.violations.len().to_string(),
            entry
                .screenshot
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ]);
    }
    table
}

/// Print the end-of-sweep summary
pub fn print_summary(summary: &SweepSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            eprintln!("{}", summary_table(summary));
            let line = format!(
                "{} entries checked, {} with violations ({} total), {} unparsed in {} ms",
                summary.entries.len(),
                summary.failing_entries(),
                summary.violation_count(),
                summary.unparsed_entries(),
                summary.duration_ms
            );
            if summary.failing_entries() > 0 {
                print_warning(&line);
            } else {
                print_success(&line);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
    }
    Ok(())
}

/// Print success message
pub fn print_success(message: &str) {
    eprintln!("✅ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    eprintln!("⚠️  {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}
