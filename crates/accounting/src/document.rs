//! Fiscal document types and the base document-number parser.

use serde::{Deserialize, Serialize};

use arledger_core::{DomainError, DomainResult};

/// Fiscal classification of a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentInternalType {
    Invoice,
    DebitNote,
    CreditNote,
}

/// A fiscal document type (e.g. AFIP code "1" = Factura A).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentType {
    /// Code assigned by the tax authority.
    pub code: String,
    pub name: String,
    pub internal_type: DocumentInternalType,
}

impl DocumentType {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        internal_type: DocumentInternalType,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            internal_type,
        }
    }
}

/// Point of sale + sequential number of a fiscal document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentNumberParts {
    pub point_of_sale: u64,
    pub invoice_number: u64,
}

impl DocumentNumberParts {
    pub fn new(point_of_sale: u64, invoice_number: u64) -> Self {
        Self {
            point_of_sale,
            invoice_number,
        }
    }
}

impl core::fmt::Display for DocumentNumberParts {
    /// `PPPPP-NNNNNNNN`.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:05}-{:08}", self.point_of_sale, self.invoice_number)
    }
}

/// Import shipment document types carry no point of sale nor number.
const NUMBERLESS_DOCUMENT_CODES: [&str; 2] = ["66", "67"];

fn parse_part(raw: &str, what: &str, document_number: &str) -> DomainResult<u64> {
    raw.trim().parse::<u64>().map_err(|e| {
        DomainError::validation(format!("invalid {what} in document number {document_number:?}: {e}"))
    })
}

/// Base parser: `POS-NUMBER`, both parts integers.
pub fn parse_document_number(
    document_number: &str,
    document_type_code: &str,
) -> DomainResult<DocumentNumberParts> {
    if NUMBERLESS_DOCUMENT_CODES.contains(&document_type_code) {
        return Ok(DocumentNumberParts::new(0, 0));
    }

    let mut parts = document_number.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(pos), Some(number), None) => Ok(DocumentNumberParts::new(
            parse_part(pos, "point of sale", document_number)?,
            parse_part(number, "invoice number", document_number)?,
        )),
        _ => Err(DomainError::validation(format!(
            "document number {document_number:?} is not in POS-NUMBER format"
        ))),
    }
}
