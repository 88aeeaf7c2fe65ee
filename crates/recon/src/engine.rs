use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::error::ReconError;
use crate::matcher::{index_by_key, match_exact_key};
use crate::model::{ComparisonReport, Origin, Record};

/// What to do when one source repeats a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later record replaces the earlier one. Duplicates are still
    /// listed in `ComparisonReport::duplicates`.
    #[default]
    LastWins,
    /// Refuse to compare.
    Reject,
}

#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub on_duplicate: DuplicatePolicy,
}

/// Compare source A against source B.
///
/// Records must already have non-empty keys. Never fails: duplicate keys
/// resolve last-write-wins.
pub fn compare(source_a: &[Record], source_b: &[Record]) -> ComparisonReport {
    build_report(source_a, source_b)
}

/// Compare with explicit options.
pub fn compare_with(
    source_a: &[Record],
    source_b: &[Record],
    options: &CompareOptions,
) -> Result<ComparisonReport, ReconError> {
    let report = build_report(source_a, source_b);

    if options.on_duplicate == DuplicatePolicy::Reject && !report.duplicates.is_empty() {
        return Err(ReconError::DuplicateKeys(report.duplicates));
    }

    Ok(report)
}

fn build_report(source_a: &[Record], source_b: &[Record]) -> ComparisonReport {
    let a = index_by_key(Origin::A, source_a);
    let b = index_by_key(Origin::B, source_b);

    for dup in a.duplicates.iter().chain(b.duplicates.iter()) {
        log::warn!(
            "source {} repeats key {:?} {} times, using the last occurrence",
            dup.origin,
            dup.key,
            dup.count
        );
    }

    let pair = match_exact_key(&a, &b);
    let mut report = classify(&pair);
    report.duplicates = a.duplicates.into_iter().chain(b.duplicates).collect();

    log::info!(
        "compared {} A keys with {} B keys: {} a_only, {} b_only, {} conflicts, {} matched",
        a.order.len(),
        b.order.len(),
        report.a_only.len(),
        report.b_only.len(),
        report.conflicts.len(),
        report.matched.len()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComparedField, ConflictReason};

    fn bill(key: &str, origin: Origin, cents: i64) -> Record {
        Record::new(key, origin)
            .with_counterparty("Acme")
            .with_amount_cents(cents)
            .with_category("Utilities")
            .with_line_memo("m1")
    }

    #[test]
    fn a_only_when_b_is_empty() {
        let a = vec![bill("P1", Origin::A, 10000)];
        let report = compare(&a, &[]);
        assert_eq!(report.a_only, a);
        assert!(report.b_only.is_empty());
        assert!(report.conflicts.is_empty());
        assert!(report.matched.is_empty());
    }

    #[test]
    fn amount_difference_is_a_conflict() {
        let a = vec![bill("P1", Origin::A, 10000)];
        let b = vec![bill("P1", Origin::B, 15000)];
        let report = compare(&a, &b);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].reason, ConflictReason::DataMismatch);
        assert_eq!(report.conflicts[0].fields, vec![ComparedField::Amount]);
        assert!(report.matched.is_empty());
    }

    #[test]
    fn later_duplicate_is_compared() {
        let a = vec![bill("P1", Origin::A, 10000), bill("P1", Origin::A, 15000)];
        let b = vec![bill("P1", Origin::B, 15000)];
        let report = compare(&a, &b);
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.matched[0].amount_cents, Some(15000));
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].origin, Origin::A);
    }

    #[test]
    fn reject_policy_refuses_duplicates() {
        let a = vec![bill("P1", Origin::A, 100)];
        let b = vec![bill("P2", Origin::B, 1), bill("P2", Origin::B, 2)];
        let opts = CompareOptions {
            on_duplicate: DuplicatePolicy::Reject,
        };
        let err = compare_with(&a, &b, &opts).unwrap_err();
        match err {
            ReconError::DuplicateKeys(dups) => {
                assert_eq!(dups.len(), 1);
                assert_eq!(dups[0].key, "P2");
                assert_eq!(dups[0].origin, Origin::B);
            }
        }
    }

    #[test]
    fn reject_policy_passes_clean_input() {
        let a = vec![bill("P1", Origin::A, 100)];
        let b = vec![bill("P1", Origin::B, 100)];
        let opts = CompareOptions {
            on_duplicate: DuplicatePolicy::Reject,
        };
        let report = compare_with(&a, &b, &opts).unwrap();
        assert_eq!(report.matched.len(), 1);
    }

    #[test]
    fn output_follows_input_order() {
        let a = vec![
            bill("P3", Origin::A, 1),
            bill("P1", Origin::A, 1),
            bill("P2", Origin::A, 1),
        ];
        let b = vec![bill("Z", Origin::B, 1), bill("P1", Origin::B, 1), bill("Y", Origin::B, 1)];
        let report = compare(&a, &b);
        let a_only: Vec<_> = report.a_only.iter().map(|r| r.key.as_str()).collect();
        let b_only: Vec<_> = report.b_only.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(a_only, vec!["P3", "P2"]);
        assert_eq!(b_only, vec!["Z", "Y"]);
    }
}
