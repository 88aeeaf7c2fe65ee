use crate::matcher::PairMatchOutput;
use crate::model::{ComparedField, ComparisonReport, Conflict, ConflictReason, Record};

/// Compared fields whose values differ between the two records.
///
/// Equality is exact: strings byte-for-byte, amounts by cent value.
/// `None` only equals `None`.
pub fn differing_fields(a: &Record, b: &Record) -> Vec<ComparedField> {
    ComparedField::ALL
        .into_iter()
        .filter(|field| match field {
            ComparedField::Counterparty => a.counterparty != b.counterparty,
            ComparedField::Amount => a.amount_cents != b.amount_cents,
            ComparedField::Category => a.category != b.category,
            ComparedField::LineMemo => a.line_memo != b.line_memo,
        })
        .collect()
}

/// Turn a pair match into the four report partitions.
pub fn classify(pair_output: &PairMatchOutput<'_>) -> ComparisonReport {
    let mut conflicts = Vec::new();
    let mut matched = Vec::new();

    for m in &pair_output.matched {
        let fields = differing_fields(m.a, m.b);
        if fields.is_empty() {
            matched.push(m.a.clone());
        } else {
            conflicts.push(Conflict {
                key: m.a.key.clone(),
                reason: ConflictReason::DataMismatch,
                fields,
                record_a: m.a.clone(),
                record_b: m.b.clone(),
            });
        }
    }

    ComparisonReport {
        a_only: pair_output.a_only.iter().map(|r| (*r).clone()).collect(),
        b_only: pair_output.b_only.iter().map(|r| (*r).clone()).collect(),
        conflicts,
        matched,
        duplicates: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchedPair;
    use crate::model::Origin;
    use chrono::NaiveDate;

    fn bill(key: &str, origin: Origin) -> Record {
        Record::new(key, origin)
            .with_counterparty("Acme")
            .with_amount_cents(10000)
            .with_category("Utilities")
            .with_line_memo("m1")
    }

    #[test]
    fn identical_records_have_no_diffs() {
        assert!(differing_fields(&bill("P1", Origin::A), &bill("P1", Origin::B)).is_empty());
    }

    #[test]
    fn every_compared_field_is_detected() {
        let a = bill("P1", Origin::A);
        let b = Record::new("P1", Origin::B)
            .with_counterparty("Acme Inc")
            .with_amount_cents(10001)
            .with_category("Rent")
            .with_line_memo("m2");
        assert_eq!(differing_fields(&a, &b), ComparedField::ALL.to_vec());
    }

    #[test]
    fn missing_value_differs_from_present_value() {
        let a = bill("P1", Origin::A);
        let mut b = bill("P1", Origin::B);
        b.category = None;
        assert_eq!(differing_fields(&a, &b), vec![ComparedField::Category]);
    }

    #[test]
    fn uncompared_fields_are_ignored() {
        let a = bill("P1", Origin::A)
            .with_memo("header a")
            .with_occurred_on(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        let b = bill("P1", Origin::B)
            .with_memo("header b")
            .with_occurred_on(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert!(differing_fields(&a, &b).is_empty());
    }

    #[test]
    fn text_comparison_is_exact() {
        let a = bill("P1", Origin::A);
        let b = bill("P1", Origin::B).with_counterparty("acme");
        assert_eq!(differing_fields(&a, &b), vec![ComparedField::Counterparty]);
    }

    #[test]
    fn classify_splits_matched_and_conflicts() {
        let a1 = bill("P1", Origin::A);
        let b1 = bill("P1", Origin::B);
        let a2 = bill("P2", Origin::A);
        let b2 = bill("P2", Origin::B).with_amount_cents(15000);
        let a3 = bill("P3", Origin::A);
        let b4 = bill("P4", Origin::B);

        let pair = PairMatchOutput {
            matched: vec![
                MatchedPair { a: &a1, b: &b1 },
                MatchedPair { a: &a2, b: &b2 },
            ],
            a_only: vec![&a3],
            b_only: vec![&b4],
        };
        let report = classify(&pair);

        assert_eq!(report.matched, vec![a1.clone()]);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].key, "P2");
        assert_eq!(report.conflicts[0].reason, ConflictReason::DataMismatch);
        assert_eq!(report.conflicts[0].fields, vec![ComparedField::Amount]);
        assert_eq!(report.conflicts[0].record_a, a2);
        assert_eq!(report.conflicts[0].record_b, b2);
        assert_eq!(report.a_only, vec![a3]);
        assert_eq!(report.b_only, vec![b4]);
    }
}
