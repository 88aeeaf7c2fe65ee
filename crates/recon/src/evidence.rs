use crate::model::{ComparisonReport, ReconSummary};

/// Partition counts for a report.
pub fn compute_summary(report: &ComparisonReport) -> ReconSummary {
    ReconSummary {
        a_only: report.a_only.len(),
        b_only: report.b_only.len(),
        conflicts: report.conflicts.len(),
        matched: report.matched.len(),
    }
}
