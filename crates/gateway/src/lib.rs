//! `billsync-gateway`: the QuickBooks side of a run.
//!
//! Bills are read and written as qbXML documents. [`QbxmlGateway`] speaks
//! the message layer; a [`QbxmlTransport`] (normally [`HttpTransport`])
//! carries the documents.

pub mod error;
pub mod gateway;
pub mod qbxml;
pub mod transport;

pub use error::GatewayError;
pub use gateway::{BatchPolicy, GatewayOptions, LedgerGateway, QbxmlGateway};
pub use transport::{HttpTransport, HttpTransportConfig, QbxmlTransport};
