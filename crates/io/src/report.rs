// JSON report export

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use billsync_recon::{
    compute_summary, ComparisonReport, Conflict, DuplicateKey, PushOutcome, Record, SyncStatus,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    /// Push-back did not fully succeed; the partitions are still complete.
    Partial,
}

/// A record plus its push-back state, flattened on the wire.
#[derive(Debug, Serialize)]
pub struct SyncedRecord<'a> {
    #[serde(flatten)]
    pub record: &'a Record,
    pub synchronized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<&'a SyncStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub a_only: usize,
    pub b_only: usize,
    pub conflicts: usize,
    pub matched: usize,
    pub synchronized: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The persisted document. Borrows from the report; never mutates it.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub status: ReportStatus,
    pub generated_at: String,
    pub engine_version: &'static str,
    pub a_only: Vec<SyncedRecord<'a>>,
    pub b_only: Vec<SyncedRecord<'a>>,
    pub conflicts: &'a [Conflict],
    pub matched: &'a [Record],
    pub duplicates: &'a [DuplicateKey],
    pub summary: ReportSummary,
    pub error: Option<String>,
}

impl<'a> ReportDocument<'a> {
    pub fn new(report: &'a ComparisonReport, outcome: &'a PushOutcome) -> Self {
        let partitions = compute_summary(report);
        let sync = outcome.counts();

        let a_only = report
            .a_only
            .iter()
            .map(|record| SyncedRecord {
                record,
                synchronized: outcome.is_synchronized(&record.key),
                sync_status: outcome.status(&record.key),
            })
            .collect();
        let b_only = report
            .b_only
            .iter()
            .map(|record| SyncedRecord {
                record,
                synchronized: false,
                sync_status: None,
            })
            .collect();

        let error = outcome.batch_error.clone().or_else(|| {
            (sync.failed > 0).then(|| format!("{} record(s) failed to sync", sync.failed))
        });

        Self {
            status: if outcome.has_failures() {
                ReportStatus::Partial
            } else {
                ReportStatus::Success
            },
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            engine_version: env!("CARGO_PKG_VERSION"),
            a_only,
            b_only,
            conflicts: &report.conflicts,
            matched: &report.matched,
            duplicates: &report.duplicates,
            summary: ReportSummary {
                a_only: partitions.a_only,
                b_only: partitions.b_only,
                conflicts: partitions.conflicts,
                matched: partitions.matched,
                synchronized: sync.synchronized,
                skipped: sync.skipped,
                failed: sync.failed,
            },
            error,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write the report document as pretty JSON, creating parent directories.
pub fn write_report(
    report: &ComparisonReport,
    outcome: &PushOutcome,
    path: &Path,
) -> Result<(), ReportError> {
    let document = ReportDocument::new(report, outcome);
    write_document(&document, path)
}

pub fn write_document(document: &ReportDocument<'_>, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.write_all(b"\n").map_err(write_err)?;
    writer.flush().map_err(write_err)?;

    log::info!("report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use billsync_recon::{compare, Origin};
    use serde_json::Value;
    use tempfile::tempdir;

    fn sample_report() -> ComparisonReport {
        let a = vec![
            Record::new("P1", Origin::A).with_counterparty("Acme").with_amount_cents(10000),
            Record::new("P2", Origin::A).with_counterparty("Beta").with_amount_cents(0),
            Record::new("P3", Origin::A).with_counterparty("Gamma").with_amount_cents(700),
        ];
        let b = vec![
            Record::new("P3", Origin::B).with_counterparty("Gamma").with_amount_cents(701),
            Record::new("P9", Origin::B).with_counterparty("Delta").with_amount_cents(5),
        ];
        compare(&a, &b)
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn creates_nested_directories_and_writes_summary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("nested").join("report.json");
        let report = sample_report();

        write_report(&report, &PushOutcome::new(), &path).unwrap();

        let doc = read(&path);
        assert_eq!(doc["status"], "success");
        assert_eq!(doc["error"], Value::Null);
        assert_eq!(doc["summary"]["a_only"], 2);
        assert_eq!(doc["summary"]["b_only"], 1);
        assert_eq!(doc["summary"]["conflicts"], 1);
        assert_eq!(doc["summary"]["matched"], 0);
        assert_eq!(doc["summary"]["synchronized"], 0);
        assert_eq!(doc["a_only"][0]["key"], "P1");
        assert_eq!(doc["a_only"][0]["amount_cents"], 10000);
        assert_eq!(doc["a_only"][0]["origin"], "a");
        assert_eq!(doc["a_only"][0]["synchronized"], false);
        assert!(doc["a_only"][0].get("sync_status").is_none());
        assert_eq!(doc["b_only"][0]["synchronized"], false);
        assert_eq!(doc["conflicts"][0]["reason"], "data_mismatch");
        assert_eq!(doc["conflicts"][0]["fields"][0], "amount");
        assert_eq!(doc["conflicts"][0]["record_b"]["amount_cents"], 701);
    }

    #[test]
    fn push_outcome_drives_synchronized_flags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = sample_report();
        let mut outcome = PushOutcome::new();
        outcome.record("P1", SyncStatus::Synchronized);
        outcome.record("P2", SyncStatus::Skipped {
            reason: "amount must be positive".into(),
        });

        write_report(&report, &outcome, &path).unwrap();

        let doc = read(&path);
        assert_eq!(doc["status"], "success");
        assert_eq!(doc["a_only"][0]["synchronized"], true);
        assert_eq!(doc["a_only"][1]["synchronized"], false);
        assert_eq!(doc["a_only"][1]["sync_status"]["state"], "skipped");
        assert_eq!(doc["summary"]["synchronized"], 1);
        assert_eq!(doc["summary"]["skipped"], 1);
    }

    #[test]
    fn batch_error_marks_partial() {
        let report = sample_report();
        let mut outcome = PushOutcome::new();
        outcome.record("P1", SyncStatus::Failed {
            reason: "upstream 503".into(),
        });
        outcome.batch_error = Some("ledger unavailable".into());

        let doc = ReportDocument::new(&report, &outcome);
        assert_eq!(doc.status, ReportStatus::Partial);
        assert_eq!(doc.error.as_deref(), Some("ledger unavailable"));
        assert!(!doc.a_only[0].synchronized);

        let json: Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["status"], "partial");
        assert_eq!(json["summary"]["failed"], 1);
    }

    #[test]
    fn write_does_not_touch_report() {
        let dir = tempdir().unwrap();
        let report = sample_report();
        let before = report.clone();
        write_report(&report, &PushOutcome::new(), &dir.path().join("r.json")).unwrap();
        assert_eq!(report, before);
    }
}
