//! qbXML message codec.
//!
//! Requests are built as typed structs and serialized with quick-xml's serde
//! support (which also handles escaping). Responses are deserialized the same
//! way; elements we do not model are ignored.

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub const DEFAULT_QBXML_VERSION: &str = "16.0";
pub const ON_ERROR_STOP: &str = "stopOnError";

/// qbXML status codes below this are success (0) or informational (1).
const FIRST_ERROR_STATUS: i64 = 2;

/// "A query request did not find a matching object."
pub const STATUS_NO_MATCH: i64 = 1;

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "QBXML")]
pub struct QbxmlRequest {
    #[serde(rename = "QBXMLMsgsRq")]
    pub msgs: MsgsRq,
}

#[derive(Debug, Clone, Serialize)]
pub struct MsgsRq {
    #[serde(rename = "@onError")]
    pub on_error: String,
    #[serde(rename = "BillQueryRq", skip_serializing_if = "Option::is_none")]
    pub bill_query: Option<BillQueryRq>,
    #[serde(rename = "BillAddRq", skip_serializing_if = "Vec::is_empty")]
    pub bill_adds: Vec<BillAddRq>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillQueryRq {
    #[serde(rename = "@requestID")]
    pub request_id: String,
    #[serde(rename = "IncludeLineItems")]
    pub include_line_items: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillAddRq {
    #[serde(rename = "@requestID")]
    pub request_id: String,
    #[serde(rename = "BillAdd")]
    pub bill: BillAdd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillAdd {
    #[serde(rename = "VendorRef")]
    pub vendor: FullNameRef,
    #[serde(rename = "TxnDate", skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<String>,
    #[serde(rename = "Memo", skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(rename = "ExpenseLineAdd", skip_serializing_if = "Option::is_none")]
    pub expense_line: Option<ExpenseLineAdd>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseLineAdd {
    #[serde(rename = "AccountRef")]
    pub account: FullNameRef,
    /// Two-decimal text, e.g. "100.00".
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Memo", skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FullNameRef {
    #[serde(rename = "FullName", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl FullNameRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            full_name: Some(name.into()),
        }
    }
}

impl QbxmlRequest {
    pub fn bill_query(request_id: impl Into<String>) -> Self {
        Self {
            msgs: MsgsRq {
                on_error: ON_ERROR_STOP.to_string(),
                bill_query: Some(BillQueryRq {
                    request_id: request_id.into(),
                    include_line_items: true,
                }),
                bill_adds: Vec::new(),
            },
        }
    }

    /// One `BillAddRq` per bill; `requestID` is the bill's batch index.
    pub fn bill_adds(bills: Vec<BillAdd>) -> Self {
        let bill_adds = bills
            .into_iter()
            .enumerate()
            .map(|(idx, bill)| BillAddRq {
                request_id: idx.to_string(),
                bill,
            })
            .collect();
        Self {
            msgs: MsgsRq {
                on_error: ON_ERROR_STOP.to_string(),
                bill_query: None,
                bill_adds,
            },
        }
    }

    /// Full document, including the XML declaration and qbXML version
    /// processing instruction.
    pub fn to_xml(&self, qbxml_version: &str) -> Result<String, GatewayError> {
        let body = quick_xml::se::to_string(self)
            .map_err(|e| GatewayError::Protocol(format!("cannot encode request: {}", e)))?;
        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<?qbxml version=\"{}\"?>\n{}",
            qbxml_version, body
        ))
    }
}

// ── Responses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct QbxmlResponse {
    #[serde(rename = "QBXMLMsgsRs")]
    pub msgs: MsgsRs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MsgsRs {
    #[serde(rename = "BillQueryRs", default)]
    pub bill_queries: Vec<BillQueryRs>,
    #[serde(rename = "BillAddRs", default)]
    pub bill_adds: Vec<BillAddRs>,
}

/// Status attributes common to every `*Rs` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStatus {
    pub request_id: Option<String>,
    pub code: i64,
    pub severity: Option<String>,
    pub message: Option<String>,
}

impl ResponseStatus {
    pub fn is_ok(&self) -> bool {
        self.code < FIRST_ERROR_STATUS
    }

    pub fn message(&self) -> String {
        self.message.clone().unwrap_or_else(|| format!("status {}", self.code))
    }

    pub fn to_error(&self) -> GatewayError {
        GatewayError::Status {
            request_id: self.request_id.clone().unwrap_or_default(),
            code: self.code,
            message: self.message(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillQueryRs {
    #[serde(rename = "@requestID", default)]
    pub request_id: Option<String>,
    #[serde(rename = "@statusCode")]
    pub status_code: i64,
    #[serde(rename = "@statusSeverity", default)]
    pub status_severity: Option<String>,
    #[serde(rename = "@statusMessage", default)]
    pub status_message: Option<String>,
    #[serde(rename = "BillRet", default)]
    pub bills: Vec<BillRet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillAddRs {
    #[serde(rename = "@requestID", default)]
    pub request_id: Option<String>,
    #[serde(rename = "@statusCode")]
    pub status_code: i64,
    #[serde(rename = "@statusSeverity", default)]
    pub status_severity: Option<String>,
    #[serde(rename = "@statusMessage", default)]
    pub status_message: Option<String>,
    #[serde(rename = "BillRet", default)]
    pub bill: Option<BillRet>,
}

impl BillQueryRs {
    pub fn status(&self) -> ResponseStatus {
        ResponseStatus {
            request_id: self.request_id.clone(),
            code: self.status_code,
            severity: self.status_severity.clone(),
            message: self.status_message.clone(),
        }
    }
}

impl BillAddRs {
    pub fn status(&self) -> ResponseStatus {
        ResponseStatus {
            request_id: self.request_id.clone(),
            code: self.status_code,
            severity: self.status_severity.clone(),
            message: self.status_message.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillRet {
    #[serde(rename = "TxnID", default)]
    pub txn_id: Option<String>,
    #[serde(rename = "VendorRef", default)]
    pub vendor: Option<FullNameRef>,
    #[serde(rename = "TxnDate", default)]
    pub txn_date: Option<String>,
    #[serde(rename = "Memo", default)]
    pub memo: Option<String>,
    #[serde(rename = "ExpenseLineRet", default)]
    pub expense_lines: Vec<ExpenseLineRet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseLineRet {
    #[serde(rename = "AccountRef", default)]
    pub account: Option<FullNameRef>,
    #[serde(rename = "Amount", default)]
    pub amount: Option<String>,
    #[serde(rename = "Memo", default)]
    pub memo: Option<String>,
}

impl QbxmlResponse {
    pub fn parse(xml: &str) -> Result<Self, GatewayError> {
        let trimmed = xml.trim_start_matches('\u{feff}').trim();
        if trimmed.is_empty() {
            return Err(GatewayError::Protocol("empty response".to_string()));
        }
        quick_xml::de::from_str(trimmed).map_err(|e| {
            GatewayError::Protocol(format!(
                "cannot decode response: {} (body: {})",
                e,
                &trimmed[..floor_char_boundary(trimmed, 200)]
            ))
        })
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut end = s.len().min(max);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Empty or whitespace-only element text reads as absent.
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_request_shape() {
        let xml = QbxmlRequest::bill_query("0").to_xml("16.0").unwrap();
        assert!(xml.starts_with(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<?qbxml version=\"16.0\"?>\n"
        ));
        assert!(xml.contains("<QBXML><QBXMLMsgsRq onError=\"stopOnError\">"));
        assert!(xml.contains(
            "<BillQueryRq requestID=\"0\"><IncludeLineItems>true</IncludeLineItems></BillQueryRq>"
        ));
        assert!(!xml.contains("BillAddRq"));
    }

    #[test]
    fn add_request_escapes_text_and_numbers_requests() {
        let bills = vec![
            BillAdd {
                vendor: FullNameRef::new("Smith & Sons <Ltd>"),
                txn_date: Some("2024-01-15".into()),
                memo: Some("P1".into()),
                expense_line: Some(ExpenseLineAdd {
                    account: FullNameRef::new("Utilities"),
                    amount: "100.00".into(),
                    memo: Some("C1".into()),
                }),
            },
            BillAdd {
                vendor: FullNameRef::new("Beta"),
                txn_date: None,
                memo: Some("P2".into()),
                expense_line: None,
            },
        ];
        let xml = QbxmlRequest::bill_adds(bills).to_xml("13.0").unwrap();

        assert!(xml.contains("<?qbxml version=\"13.0\"?>"));
        assert!(xml.contains("<BillAddRq requestID=\"0\">"));
        assert!(xml.contains("<BillAddRq requestID=\"1\">"));
        assert!(xml.contains("<FullName>Smith &amp; Sons &lt;Ltd&gt;</FullName>"));
        assert!(xml.contains("<Amount>100.00</Amount>"));
        assert!(
            xml.contains("<ExpenseLineAdd><AccountRef><FullName>Utilities</FullName></AccountRef>")
        );
        // Second bill has no category, so no expense line and no date
        let second = &xml[xml.find("requestID=\"1\"").unwrap()..];
        assert!(!second.contains("ExpenseLineAdd"));
        assert!(!second.contains("TxnDate"));
    }

    #[test]
    fn parses_query_response() {
        let xml = r#"<?xml version="1.0" ?>
<QBXML>
  <QBXMLMsgsRs>
    <BillQueryRs requestID="0" statusCode="0" statusSeverity="Info" statusMessage="Status OK">
      <BillRet>
        <TxnID>12-345</TxnID>
        <VendorRef><ListID>80000001</ListID><FullName>Acme &amp; Co</FullName></VendorRef>
        <TxnDate>2024-01-15</TxnDate>
        <Memo>P1</Memo>
        <ExpenseLineRet>
          <TxnLineID>1</TxnLineID>
          <AccountRef><FullName>Utilities</FullName></AccountRef>
          <Amount>100.00</Amount>
          <Memo>C1</Memo>
        </ExpenseLineRet>
        <ExpenseLineRet>
          <AccountRef><FullName>Supplies</FullName></AccountRef>
          <Amount>5.50</Amount>
        </ExpenseLineRet>
      </BillRet>
    </BillQueryRs>
  </QBXMLMsgsRs>
</QBXML>"#;
        let resp = QbxmlResponse::parse(xml).unwrap();
        let rs = &resp.msgs.bill_queries[0];
        assert!(rs.status().is_ok());
        assert_eq!(rs.status().request_id.as_deref(), Some("0"));
        let bill = &rs.bills[0];
        assert_eq!(bill.vendor.as_ref().and_then(|v| v.full_name.as_deref()), Some("Acme & Co"));
        assert_eq!(bill.memo.as_deref(), Some("P1"));
        assert_eq!(bill.expense_lines.len(), 2);
        assert_eq!(bill.expense_lines[1].amount.as_deref(), Some("5.50"));
        assert_eq!(bill.expense_lines[1].memo, None);
    }

    #[test]
    fn parses_add_statuses() {
        let xml = r#"<QBXML><QBXMLMsgsRs>
<BillAddRs requestID="0" statusCode="0" statusSeverity="Info" statusMessage="Status OK"><BillRet><TxnID>1</TxnID></BillRet></BillAddRs>
<BillAddRs requestID="1" statusCode="3140" statusSeverity="Error" statusMessage="Invalid reference to Vendor"/>
</QBXMLMsgsRs></QBXML>"#;
        let resp = QbxmlResponse::parse(xml).unwrap();
        let adds = &resp.msgs.bill_adds;
        assert_eq!(adds.len(), 2);
        assert!(adds[0].status().is_ok());
        assert!(!adds[1].status().is_ok());
        let err = adds[1].status().to_error().to_string();
        assert!(err.contains("3140") && err.contains("Invalid reference to Vendor"), "{}", err);
    }

    #[test]
    fn garbage_is_protocol_error() {
        assert!(matches!(QbxmlResponse::parse(""), Err(GatewayError::Protocol(_))));
        assert!(matches!(
            QbxmlResponse::parse("<html>oops</html>"),
            Err(GatewayError::Protocol(_))
        ));
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" P1 ")), Some("P1".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
