//! Overridable hooks of the move lifecycle.
//!
//! Localizations implement [`MoveExtension`] and override only the hooks they
//! change; every default is the base behavior, so an override can run its own
//! rule and then call the base function itself.

use arledger_core::DomainResult;

use crate::account_move::{AccountMove, MoveId};
use crate::book::{MoveBook, PostContext};
use crate::company::Company;
use crate::currency::CurrencyRates;
use crate::document::{self, DocumentNumberParts, DocumentType};
use crate::journal::Journal;

/// Report template used to print invoices when no localization applies.
pub const BASE_INVOICE_REPORT: &str = "account.report_invoice_document";

pub trait MoveExtension {
    /// Runs right after a move is created (stored computed fields).
    fn on_move_created<R: CurrencyRates>(&self, book: &mut MoveBook<R>, id: MoveId) -> DomainResult<()> {
        let _ = (book, id);
        Ok(())
    }

    /// Splits a fiscal document number into point of sale and number.
    fn parse_document_number(
        &self,
        document_number: &str,
        document_type_code: &str,
    ) -> DomainResult<DocumentNumberParts> {
        document::parse_document_number(document_number, document_type_code)
    }

    /// Moves the duplicate vendor-reference constraint applies to.
    fn duplicate_reference_scope<R: CurrencyRates>(
        &self,
        book: &MoveBook<R>,
        ids: &[MoveId],
    ) -> DomainResult<Vec<MoveId>> {
        let _ = book;
        Ok(ids.to_vec())
    }

    /// Document types `mv` may use in `journal`, out of `available`.
    fn allowed_document_types(
        &self,
        mv: &AccountMove,
        company: &Company,
        journal: &Journal,
        available: &[DocumentType],
    ) -> Vec<DocumentType> {
        let _ = (company, journal);
        let allowed = mv.move_type().document_internal_types();
        available
            .iter()
            .filter(|dt| allowed.contains(&dt.internal_type))
            .cloned()
            .collect()
    }

    fn post<R: CurrencyRates>(&self, book: &mut MoveBook<R>, ids: &[MoveId]) -> DomainResult<()> {
        book.post_with(ids, &PostContext::default())
    }

    /// Template used to print `mv` when `report_id` is requested.
    fn invoice_report_name(&self, mv: &AccountMove, company: &Company, report_id: &str) -> String {
        let _ = (mv, company);
        report_id.to_string()
    }
}

/// No localization: every hook keeps its base behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseMoves;

impl MoveExtension for BaseMoves {}
