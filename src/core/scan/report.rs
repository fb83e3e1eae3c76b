//! Report view over a scan's output.
//!
//! Today a report is the trimmed output verbatim. Filtering or summarising
//! belongs in [`derive_report`]; the lifecycle code only calls it.

use super::store::ScanStore;

pub const EMPTY_REPORT: &str = "No output available for this scan.";

pub fn derive_report(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        EMPTY_REPORT.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLookup {
    Ready(String),
    UnknownScan,
    NotAvailable,
}

impl ScanStore {
    /// Returns the cached report, deriving it on first access.
    ///
    /// While a scan is still running the derived report is returned but not
    /// cached, since the writer will rebuild it at finalization anyway. A
    /// running scan with no output yet has no report.
    pub async fn materialize_report(&self, scan_id: &str) -> ReportLookup {
        self.with_record(scan_id, |r| {
            if let Some(report) = &r.report {
                return ReportLookup::Ready(report.clone());
            }
            if !r.status.is_terminal() {
                if r.output.trim().is_empty() {
                    return ReportLookup::NotAvailable;
                }
                return ReportLookup::Ready(derive_report(&r.output));
            }
            let report = derive_report(&r.output);
            r.report = Some(report.clone());
            ReportLookup::Ready(report)
        })
        .await
        .unwrap_or(ReportLookup::UnknownScan)
    }
}
