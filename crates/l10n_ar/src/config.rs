//! Localization settings.

use serde::{Deserialize, Serialize};

use arledger_core::CountryCode;

/// Localized invoice report template.
pub const AR_INVOICE_REPORT: &str = "l10n_ar.report_invoice_document";

/// Document types whose number is a bare sequence without point of sale.
pub const LEGACY_NUMBER_ONLY_CODES: [&str; 4] = ["33", "99", "331", "332"];

/// Document types valid for both invoices and credit notes.
pub const INVOICE_AND_REFUND_CODES: [&str; 4] = ["99", "186", "188", "189"];

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    /// Fiscal country the rules apply to.
    pub country: CountryCode,
    pub invoice_report: String,
    pub legacy_number_only_codes: Vec<String>,
    pub invoice_and_refund_codes: Vec<String>,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            country: CountryCode::argentina(),
            invoice_report: AR_INVOICE_REPORT.to_string(),
            legacy_number_only_codes: codes(&LEGACY_NUMBER_ONLY_CODES),
            invoice_and_refund_codes: codes(&INVOICE_AND_REFUND_CODES),
        }
    }
}

impl ArConfig {
    /// Defaults overridden by `ARLEDGER_AR_COUNTRY`, `ARLEDGER_AR_REPORT`,
    /// `ARLEDGER_AR_LEGACY_DOC_CODES` and `ARLEDGER_AR_INV_AND_REF_CODES`
    /// (comma separated).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("ARLEDGER_AR_COUNTRY") {
            match CountryCode::new(&raw) {
                Ok(country) => config.country = country,
                Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring ARLEDGER_AR_COUNTRY"),
            }
        }

        if let Some(report) = lookup("ARLEDGER_AR_REPORT").filter(|r| !r.trim().is_empty()) {
            config.invoice_report = report.trim().to_string();
        }

        if let Some(codes) = code_list(&lookup, "ARLEDGER_AR_LEGACY_DOC_CODES") {
            config.legacy_number_only_codes = codes;
        }
        if let Some(codes) = code_list(&lookup, "ARLEDGER_AR_INV_AND_REF_CODES") {
            config.invoice_and_refund_codes = codes;
        }

        config
    }

    pub fn is_number_only_code(&self, document_type_code: &str) -> bool {
        self.legacy_number_only_codes.iter().any(|c| c == document_type_code)
    }

    pub fn is_invoice_and_refund_code(&self, document_type_code: &str) -> bool {
        self.invoice_and_refund_codes.iter().any(|c| c == document_type_code)
    }
}

/// Comma-separated code list; `None` (with a warning) when set but empty.
fn code_list(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Vec<String>> {
    let raw = lookup(key)?;
    let codes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if codes.is_empty() {
        tracing::warn!(key, value = %raw, "ignoring empty code list");
        return None;
    }
    Some(codes)
}
