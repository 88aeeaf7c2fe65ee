use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which side of the reconciliation produced a record.
///
/// `A` is the spreadsheet export, `B` is the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    A,
    B,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "a"),
            Self::B => write!(f, "b"),
        }
    }
}

/// A single financial line item from one source.
///
/// Amounts are integer minor units (cents). Two records compare equal on
/// amount only when their cent values are identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub counterparty: Option<String>,
    pub occurred_on: Option<NaiveDate>,
    pub category: Option<String>,
    pub amount_cents: Option<i64>,
    pub memo: Option<String>,
    pub line_memo: Option<String>,
    pub origin: Origin,
}

impl Record {
    /// A record with only a key set. Adapters and tests fill in the rest.
    pub fn new(key: impl Into<String>, origin: Origin) -> Self {
        Self {
            key: key.into(),
            counterparty: None,
            occurred_on: None,
            category: None,
            amount_cents: None,
            memo: None,
            line_memo: None,
            origin,
        }
    }

    pub fn with_counterparty(mut self, v: impl Into<String>) -> Self {
        self.counterparty = Some(v.into());
        self
    }

    pub fn with_amount_cents(mut self, cents: i64) -> Self {
        self.amount_cents = Some(cents);
        self
    }

    pub fn with_category(mut self, v: impl Into<String>) -> Self {
        self.category = Some(v.into());
        self
    }

    pub fn with_line_memo(mut self, v: impl Into<String>) -> Self {
        self.line_memo = Some(v.into());
        self
    }

    pub fn with_memo(mut self, v: impl Into<String>) -> Self {
        self.memo = Some(v.into());
        self
    }

    pub fn with_occurred_on(mut self, date: NaiveDate) -> Self {
        self.occurred_on = Some(date);
        self
    }
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    DataMismatch,
    /// Reserved: one-sided keys are reported through `a_only`.
    MissingInA,
    /// Reserved: one-sided keys are reported through `b_only`.
    MissingInB,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataMismatch => write!(f, "data_mismatch"),
            Self::MissingInA => write!(f, "missing_in_a"),
            Self::MissingInB => write!(f, "missing_in_b"),
        }
    }
}

/// The fields that take part in conflict detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparedField {
    Counterparty,
    Amount,
    Category,
    LineMemo,
}

impl ComparedField {
    pub const ALL: [ComparedField; 4] = [
        ComparedField::Counterparty,
        ComparedField::Amount,
        ComparedField::Category,
        ComparedField::LineMemo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counterparty => "counterparty",
            Self::Amount => "amount",
            Self::Category => "category",
            Self::LineMemo => "line_memo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub key: String,
    pub reason: ConflictReason,
    /// Compared fields that differ, in `ComparedField::ALL` order.
    pub fields: Vec<ComparedField>,
    pub record_a: Record,
    pub record_b: Record,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A key that appeared more than once within one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub origin: Origin,
    pub key: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Result of one `compare` call.
///
/// Every key from either source lands in exactly one of `a_only`, `b_only`,
/// `conflicts` or `matched`. `duplicates` is informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    pub a_only: Vec<Record>,
    pub b_only: Vec<Record>,
    pub conflicts: Vec<Conflict>,
    pub matched: Vec<Record>,
    pub duplicates: Vec<DuplicateKey>,
}

impl ComparisonReport {
    /// Which partition each key landed in.
    pub fn partition_of_keys(&self) -> BTreeMap<&str, Partition> {
        let mut out = BTreeMap::new();
        for r in &self.a_only {
            out.insert(r.key.as_str(), Partition::AOnly);
        }
        for r in &self.b_only {
            out.insert(r.key.as_str(), Partition::BOnly);
        }
        for c in &self.conflicts {
            out.insert(c.key.as_str(), Partition::Conflict);
        }
        for r in &self.matched {
            out.insert(r.key.as_str(), Partition::Matched);
        }
        out
    }

    pub fn total_keys(&self) -> usize {
        self.a_only.len() + self.b_only.len() + self.conflicts.len() + self.matched.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    AOnly,
    BOnly,
    Conflict,
    Matched,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub a_only: usize,
    pub b_only: usize,
    pub conflicts: usize,
    pub matched: usize,
}
