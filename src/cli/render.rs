//! Terminal rendering of run reports.

use comfy_table::{Table, presets::UTF8_FULL};
use console::style;

use crate::config::Settings;
use crate::context::GenerateReport;
use crate::diagnostics::ConflictRow;

/// Table of nodes that lost a name conflict.
pub fn conflict_table(rows: &[ConflictRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Path", "File"]);

    for row in rows {
        table.add_row(vec![row.name.as_str(), row.path.as_str(), row.file.as_str()]);
    }
    table
}

pub fn print_report(report: &GenerateReport, settings: &Settings) {
    let sync = &report.sync;

    if sync.first_run {
        println!(
            "{} {} with {} routes",
            style("Created").green().bold(),
            settings.manifest_path().display(),
            report.nodes.len()
        );
    } else if sync.is_unchanged() {
        println!("{} {} routes", style("Up to date:").green(), report.nodes.len());
    } else {
        println!(
            "{} {} added, {} removed, {} renamed",
            style("Synced:").green().bold(),
            sync.created.len(),
            sync.deleted.len(),
            sync.renamed.len()
        );
        for (old, new) in &sync.renamed {
            println!("  {} {old} -> {new}", style("renamed").dim());
        }
        for name in &sync.deleted {
            println!("  {} {name}", style("removed").dim());
        }
        if !sync.backed_up.is_empty() {
            println!(
                "  {} {} customized route(s) saved to the backup store",
                style("backup").dim(),
                sync.backed_up.len()
            );
        }
    }

    for path in &report.emitted {
        println!("  {} {}", style("wrote").dim(), path.display());
    }

    for diagnostic in report.diagnostics.iter() {
        eprintln!("{} {}", style("warning:").yellow().bold(), diagnostic.message);
        if !diagnostic.rows.is_empty() {
            eprintln!("{}", conflict_table(&diagnostic.rows));
        }
    }
}
