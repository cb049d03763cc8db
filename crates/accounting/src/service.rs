use chrono::NaiveDate;
use rust_decimal::Decimal;

use arledger_core::{CompanyId, DomainError, DomainResult};

use crate::account_move::MoveId;
use crate::book::{MoveBook, NewMove};
use crate::company::Company;
use crate::currency::CurrencyRates;
use crate::document::DocumentType;
use crate::extension::MoveExtension;
use crate::journal::Journal;

/// Move lifecycle entry point: base book + the installed extension hooks.
#[derive(Debug)]
pub struct MoveService<R, X> {
    book: MoveBook<R>,
    extension: X,
}

impl<R: CurrencyRates, X: MoveExtension> MoveService<R, X> {
    pub fn new(rates: R, extension: X) -> Self {
        Self {
            book: MoveBook::new(rates),
            extension,
        }
    }

    pub fn book(&self) -> &MoveBook<R> {
        &self.book
    }

    pub fn extension(&self) -> &X {
        &self.extension
    }

    pub fn add_company(&mut self, company: Company) -> CompanyId {
        self.book.add_company(company)
    }

    pub fn create_move(&mut self, input: NewMove) -> DomainResult<MoveId> {
        let id = self.book.create_move(input)?;
        self.extension.on_move_created(&mut self.book, id)?;
        Ok(id)
    }

    pub fn set_invoice_date(&mut self, id: MoveId, invoice_date: NaiveDate) -> DomainResult<()> {
        self.book.set_invoice_date(id, invoice_date)
    }

    pub fn set_reference(&mut self, id: MoveId, reference: Option<String>) -> DomainResult<()> {
        self.book.set_reference(id, reference)
    }

    pub fn set_currency_rate(&mut self, id: MoveId, currency_rate: Option<Decimal>) -> DomainResult<()> {
        self.book.set_currency_rate(id, currency_rate)
    }

    /// Parses `document_number` against the move's document type and stores it.
    pub fn set_document_number(&mut self, id: MoveId, document_number: &str) -> DomainResult<()> {
        let code = self
            .book
            .get(id)?
            .document_type()
            .map(|dt| dt.code.clone())
            .ok_or_else(|| DomainError::invariant("move has no document type"))?;
        let parts = self.extension.parse_document_number(document_number, &code)?;
        self.book.set_document_number(id, document_number.to_string(), parts)
    }

    pub fn cancel(&mut self, id: MoveId) -> DomainResult<()> {
        self.book.cancel(id)
    }

    /// Runs the (scoped) duplicate-reference constraint, then posts. Either
    /// every move in `ids` is posted or none is.
    pub fn post(&mut self, ids: &[MoveId]) -> DomainResult<()> {
        let scoped = self.extension.duplicate_reference_scope(&self.book, ids)?;
        self.book.check_duplicate_vendor_reference(&scoped)?;
        let extension = &self.extension;
        self.book.atomically(|book| extension.post(book, ids))
    }

    pub fn allowed_document_types(
        &self,
        id: MoveId,
        journal: &Journal,
        available: &[DocumentType],
    ) -> DomainResult<Vec<DocumentType>> {
        let mv = self.book.get(id)?;
        let company = self.book.company_of(id)?;
        Ok(self.extension.allowed_document_types(mv, company, journal, available))
    }

    /// Report template to print `id` with, given the requested `report_id`.
    pub fn invoice_report_name(&self, id: MoveId, report_id: &str) -> DomainResult<String> {
        let mv = self.book.get(id)?;
        let company = self.book.company_of(id)?;
        Ok(self.extension.invoice_report_name(mv, company, report_id))
    }
}
