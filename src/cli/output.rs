//! CLI output: error mapping and run summary.

use crate::error::StageError;
use crate::sync::SyncReport;

/// Map a fatal run error to the message shown to the operator
pub fn map_error(e: &StageError) -> String {
    format!("asset-uploader: {}", e)
}

/// One-line run summary
pub fn format_report(version: &str, report: &SyncReport) -> String {
    let verb = if report.resumed { "Resumed" } else { "Synced" };
    format!(
        "{} {}: {} files ({} new, {} extended, {} unchanged), {} carried forward, \
         {} objects uploaded, {} skipped, {} manifest entries",
        verb,
        version,
        report.files_selected,
        report.entries_new,
        report.entries_extended,
        report.entries_known,
        report.entries_carried,
        report.objects_uploaded,
        report.objects_skipped,
        report.manifest_entries
    )
}
