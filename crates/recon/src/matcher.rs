use std::collections::HashMap;

use crate::model::{DuplicateKey, Origin, Record};

/// Records from one source indexed by key.
///
/// `order` keeps keys in first-seen order so output is deterministic for a
/// given input order. When a key repeats, the later record replaces the
/// earlier one in `by_key` but the key keeps its first position.
#[derive(Debug)]
pub struct KeyIndex<'a> {
    pub order: Vec<&'a str>,
    pub by_key: HashMap<&'a str, &'a Record>,
    pub duplicates: Vec<DuplicateKey>,
}

impl<'a> KeyIndex<'a> {
    pub fn get(&self, key: &str) -> Option<&'a Record> {
        self.by_key.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Index records by key, last write wins.
pub fn index_by_key(origin: Origin, records: &[Record]) -> KeyIndex<'_> {
    let mut order = Vec::with_capacity(records.len());
    let mut by_key: HashMap<&str, &Record> = HashMap::with_capacity(records.len());
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let key = record.key.as_str();
        if by_key.insert(key, record).is_none() {
            order.push(key);
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    let duplicates = order
        .iter()
        .filter_map(|k| {
            let count = counts[k];
            (count > 1).then(|| DuplicateKey {
                origin,
                key: (*k).to_string(),
                count,
            })
        })
        .collect();

    KeyIndex {
        order,
        by_key,
        duplicates,
    }
}

/// A key present in both sources.
#[derive(Debug, Clone)]
pub struct MatchedPair<'a> {
    pub a: &'a Record,
    pub b: &'a Record,
}

#[derive(Debug)]
pub struct PairMatchOutput<'a> {
    pub matched: Vec<MatchedPair<'a>>,
    pub a_only: Vec<&'a Record>,
    pub b_only: Vec<&'a Record>,
}

/// Match two key indexes by exact key.
pub fn match_exact_key<'a>(a: &KeyIndex<'a>, b: &KeyIndex<'a>) -> PairMatchOutput<'a> {
    let mut matched = Vec::new();
    let mut a_only = Vec::new();
    let mut b_only = Vec::new();

    for key in &a.order {
        let a_rec = a.by_key[key];
        match b.get(key) {
            Some(b_rec) => matched.push(MatchedPair { a: a_rec, b: b_rec }),
            None => a_only.push(a_rec),
        }
    }

    for key in &b.order {
        if !a.contains(key) {
            b_only.push(b.by_key[key]);
        }
    }

    PairMatchOutput {
        matched,
        a_only,
        b_only,
    }
}
