//! Argentine localization of the accounting base.
//!
//! Plugs into the move lifecycle through [`ArLocalization`], which implements
//! [`arledger_accounting::MoveExtension`]:
//! - stored/preview currency rates for foreign-currency invoices,
//! - legacy document-number formats,
//! - duplicate vendor-reference check limited to moves without fiscal documents,
//! - posting at the tracked rate,
//! - localized invoice report.

pub mod config;
pub mod currency_rate;
pub mod document_number;
pub mod localization;
pub mod posting;

pub use config::{ArConfig, AR_INVOICE_REPORT};
pub use currency_rate::{computed_currency_rate, is_foreign_ar_invoice, stored_rate_update, RateUpdate};
pub use document_number::parse_document_number;
pub use localization::ArLocalization;
pub use posting::post_moves;
