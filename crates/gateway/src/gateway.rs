//! The ledger side of a reconciliation run: fetch bills as records, push
//! spreadsheet-only records back as new bills.

use std::collections::HashMap;

use billsync_io::money::{format_minor, parse_money_minor};
use billsync_recon::{Origin, PushOutcome, Record, SyncStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::qbxml::{
    non_empty, BillAdd, BillAddRs, BillRet, ExpenseLineAdd, FullNameRef, QbxmlRequest,
    QbxmlResponse, DEFAULT_QBXML_VERSION, STATUS_NO_MATCH,
};
use crate::transport::QbxmlTransport;

/// How per-request failures inside one push batch are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Any failure marks every batched record failed.
    #[default]
    AllOrNothing,
    /// Each record takes the status of its own `requestID`.
    PerRecord,
}

/// Source B of a reconciliation run.
pub trait LedgerGateway {
    fn fetch_records(&self) -> Result<Vec<Record>, GatewayError>;

    /// Never fails as a whole: transport and protocol problems land in the
    /// returned outcome.
    fn push_records(&self, records: &[Record]) -> PushOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOptions {
    pub qbxml_version: String,
    pub batch_policy: BatchPolicy,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            qbxml_version: DEFAULT_QBXML_VERSION.to_string(),
            batch_policy: BatchPolicy::default(),
        }
    }
}

pub struct QbxmlGateway<T> {
    transport: T,
    options: GatewayOptions,
}

impl<T: QbxmlTransport> QbxmlGateway<T> {
    pub fn new(transport: T, options: GatewayOptions) -> Self {
        Self { transport, options }
    }

    fn round_trip(&self, request: &QbxmlRequest) -> Result<QbxmlResponse, GatewayError> {
        let xml = request.to_xml(&self.options.qbxml_version)?;
        let body = self.transport.process(&xml)?;
        QbxmlResponse::parse(&body)
    }
}

impl<T: QbxmlTransport> LedgerGateway for QbxmlGateway<T> {
    fn fetch_records(&self) -> Result<Vec<Record>, GatewayError> {
        let response = self.round_trip(&QbxmlRequest::bill_query("0"))?;
        let query = response
            .msgs
            .bill_queries
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Protocol("response has no BillQueryRs".to_string()))?;

        let status = query.status();
        if status.code == STATUS_NO_MATCH {
            log::info!("ledger returned no bills ({})", status.message());
            return Ok(Vec::new());
        }
        if !status.is_ok() {
            return Err(status.to_error());
        }

        let mut records = Vec::new();
        for bill in &query.bills {
            records.extend(bill_to_records(bill));
        }
        log::info!("fetched {} records from {} bills", records.len(), query.bills.len());
        Ok(records)
    }

    fn push_records(&self, records: &[Record]) -> PushOutcome {
        let mut outcome = PushOutcome::new();

        let mut batch_keys: Vec<&str> = Vec::new();
        let mut bills = Vec::new();
        for record in records {
            match bill_from_record(record) {
                Ok(bill) => {
                    batch_keys.push(&record.key);
                    bills.push(bill);
                }
                Err(reason) => {
                    log::warn!("skipping push of '{}': {}", record.key, reason);
                    outcome.record(&record.key, SyncStatus::Skipped { reason });
                }
            }
        }

        if bills.is_empty() {
            return outcome;
        }

        log::info!("pushing {} bills to ledger", bills.len());
        let response = match self.round_trip(&QbxmlRequest::bill_adds(bills)) {
            Ok(response) => response,
            Err(err) => {
                fail_batch(&mut outcome, &batch_keys, &err.to_string());
                return outcome;
            }
        };

        let by_request: HashMap<String, &BillAddRs> = response
            .msgs
            .bill_adds
            .iter()
            .filter_map(|rs| rs.request_id.clone().map(|id| (id, rs)))
            .collect();

        match self.options.batch_policy {
            BatchPolicy::AllOrNothing => {
                let first_error = batch_keys.iter().enumerate().find_map(|(idx, key)| {
                    match by_request.get(&idx.to_string()) {
                        Some(rs) if rs.status().is_ok() => None,
                        Some(rs) => Some(format!("'{}': {}", key, rs.status().to_error())),
                        None => Some(format!("'{}': no response for request {}", key, idx)),
                    }
                });
                match first_error {
                    None => {
                        for key in &batch_keys {
                            outcome.record(*key, SyncStatus::Synchronized);
                        }
                    }
                    Some(message) => fail_batch(&mut outcome, &batch_keys, &message),
                }
            }
            BatchPolicy::PerRecord => {
                for (idx, key) in batch_keys.iter().enumerate() {
                    let status = match by_request.get(&idx.to_string()) {
                        Some(rs) if rs.status().is_ok() => SyncStatus::Synchronized,
                        Some(rs) => SyncStatus::Failed {
                            reason: rs.status().to_error().to_string(),
                        },
                        None => SyncStatus::Failed {
                            reason: "no response (batch stopped on an earlier error)".to_string(),
                        },
                    };
                    if let SyncStatus::Failed { reason } = &status {
                        log::warn!("push of '{}' failed: {}", key, reason);
                    }
                    outcome.record(*key, status);
                }
            }
        }

        outcome
    }
}

fn fail_batch(outcome: &mut PushOutcome, keys: &[&str], message: &str) {
    log::warn!("push batch of {} failed: {}", keys.len(), message);
    for key in keys {
        outcome.record(*key, SyncStatus::Failed {
            reason: message.to_string(),
        });
    }
    outcome.batch_error = Some(message.to_string());
}

/// Local validation before anything is sent.
fn bill_from_record(record: &Record) -> Result<BillAdd, String> {
    let vendor = non_empty(record.counterparty.as_deref())
        .ok_or_else(|| "missing counterparty".to_string())?;
    let amount = match record.amount_cents {
        None => return Err("missing amount".to_string()),
        Some(cents) if cents <= 0 => {
            return Err(format!(
                "amount must be positive (got {})",
                format_minor(cents)
            ))
        }
        Some(cents) => cents,
    };

    let expense_line = non_empty(record.category.as_deref()).map(|account| ExpenseLineAdd {
        account: FullNameRef::new(account),
        amount: format_minor(amount),
        memo: non_empty(record.line_memo.as_deref()),
    });

    Ok(BillAdd {
        vendor: FullNameRef::new(vendor),
        txn_date: record.occurred_on.map(|d| d.format("%Y-%m-%d").to_string()),
        memo: non_empty(record.memo.as_deref()).or_else(|| Some(record.key.clone())),
        expense_line,
    })
}

/// One record per expense line, keyed by the bill memo.
fn bill_to_records(bill: &BillRet) -> Vec<Record> {
    let Some(key) = non_empty(bill.memo.as_deref()) else {
        log::warn!(
            "skipping ledger bill {} with empty memo",
            bill.txn_id.as_deref().unwrap_or("(no TxnID)")
        );
        return Vec::new();
    };

    let counterparty = bill.vendor.as_ref().and_then(|v| non_empty(v.full_name.as_deref()));
    let occurred_on = bill.txn_date.as_deref().and_then(|raw| {
        let parsed = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok();
        if parsed.is_none() {
            log::warn!("bill '{}': unrecognized TxnDate {:?}", key, raw);
        }
        parsed
    });

    bill.expense_lines
        .iter()
        .filter_map(|line| {
            let raw_amount = line.amount.as_deref().map(str::trim).filter(|s| !s.is_empty());
            let amount_cents = match raw_amount {
                None => None,
                Some(raw) => match parse_money_minor(raw) {
                    Ok(cents) => Some(cents),
                    Err(e) => {
                        log::warn!("bill '{}': skipping expense line with bad amount: {}", key, e);
                        return None;
                    }
                },
            };
            Some(Record {
                key: key.clone(),
                counterparty: counterparty.clone(),
                occurred_on,
                category: line.account.as_ref().and_then(|a| non_empty(a.full_name.as_deref())),
                amount_cents,
                memo: Some(key.clone()),
                line_memo: non_empty(line.memo.as_deref()),
                origin: Origin::B,
            })
        })
        .collect()
}
