use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use arledger_accounting::{
    AccountMove, BASE_INVOICE_REPORT, BaseMoves, Company, CurrencyRates, DocumentNumberParts, DocumentType, Journal,
    MoveBook, MoveExtension, MoveId,
};
use arledger_core::DomainResult;

use crate::config::ArConfig;
use crate::currency_rate::{computed_currency_rate, stored_rate_update, RateUpdate};
use crate::document_number::parse_document_number;
use crate::posting::post_moves;

/// Argentine localization of the move lifecycle.
#[derive(Debug, Clone, Default)]
pub struct ArLocalization {
    config: ArConfig,
    today: Option<NaiveDate>,
}

impl ArLocalization {
    pub fn new(config: ArConfig) -> Self {
        Self { config, today: None }
    }

    /// Pins the business date used when a move has no invoice date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &ArConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Preview of the conversion rate of `id`; never stored.
    pub fn computed_currency_rate<R: CurrencyRates>(&self, book: &MoveBook<R>, id: MoveId) -> DomainResult<Decimal> {
        computed_currency_rate(book.get(id)?, book.company_of(id)?, book.rates(), self.today())
    }

    /// Stored rate of `id` (`None` when empty).
    pub fn l10n_ar_currency_rate<R: CurrencyRates>(&self, book: &MoveBook<R>, id: MoveId) -> DomainResult<Option<Decimal>> {
        Ok(book.get(id)?.currency_rate())
    }

    /// Applies the stored-rate rule to `id`.
    pub fn compute_l10n_ar_currency_rate<R: CurrencyRates>(
        &self,
        book: &mut MoveBook<R>,
        id: MoveId,
    ) -> DomainResult<()> {
        let (update, current) = {
            let mv = book.get(id)?;
            let reversed = match mv.reversed_entry_id() {
                Some(original) => Some(book.get(original)?),
                None => None,
            };
            let update = stored_rate_update(mv, reversed, book.company_of(id)?, &self.config);
            (update, mv.currency_rate())
        };

        match update {
            RateUpdate::Set(rate) if rate != current => book.set_currency_rate(id, rate),
            _ => Ok(()),
        }
    }
}

impl MoveExtension for ArLocalization {
    fn on_move_created<R: CurrencyRates>(&self, book: &mut MoveBook<R>, id: MoveId) -> DomainResult<()> {
        self.compute_l10n_ar_currency_rate(book, id)
    }

    fn parse_document_number(
        &self,
        document_number: &str,
        document_type_code: &str,
    ) -> DomainResult<DocumentNumberParts> {
        parse_document_number(document_number, document_type_code, &self.config)
    }

    /// Moves numbered with fiscal document types already enforce unique
    /// numbers, so only the others keep the vendor-reference check.
    fn duplicate_reference_scope<R: CurrencyRates>(
        &self,
        book: &MoveBook<R>,
        ids: &[MoveId],
    ) -> DomainResult<Vec<MoveId>> {
        let mut scoped = Vec::with_capacity(ids.len());
        for id in ids {
            if !book.get(*id)?.use_documents() {
                scoped.push(*id);
            }
        }
        Ok(scoped)
    }

    /// Argentine journals with their own document types restrict moves to
    /// them; among those, codes valid for invoices and refunds alike skip
    /// the direction filter.
    fn allowed_document_types(
        &self,
        mv: &AccountMove,
        company: &Company,
        journal: &Journal,
        available: &[DocumentType],
    ) -> Vec<DocumentType> {
        if !company.is_country(&self.config.country) || !journal.use_specific_document_types() {
            return BaseMoves.allowed_document_types(mv, company, journal, available);
        }
        let internal_types = mv.move_type().document_internal_types();
        available
            .iter()
            .filter(|dt| journal.allows_document_type(&dt.code))
            .filter(|dt| {
                self.config.is_invoice_and_refund_code(&dt.code) || internal_types.contains(&dt.internal_type)
            })
            .cloned()
            .collect()
    }

    fn post<R: CurrencyRates>(&self, book: &mut MoveBook<R>, ids: &[MoveId]) -> DomainResult<()> {
        post_moves(book, ids, &self.config, self.today())
    }

    /// Argentine companies print invoices with the localized layout whether
    /// or not they use documents; other reports pass through.
    fn invoice_report_name(&self, _mv: &AccountMove, company: &Company, report_id: &str) -> String {
        if company.is_country(&self.config.country) && report_id == BASE_INVOICE_REPORT {
            self.config.invoice_report.clone()
        } else {
            report_id.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arledger_accounting::{
        DocumentInternalType, ExchangeRate, InMemoryRateTable, MoveService, MoveType, NewLine, NewMove,
    };
    use arledger_core::{CompanyId, CountryCode, CurrencyCode, DomainError, PartnerId};
    use rust_decimal_macros::dec;

    use crate::config::AR_INVOICE_REPORT;

    fn ars() -> CurrencyCode {
        CurrencyCode::new("ARS").unwrap()
    }

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn rates() -> InMemoryRateTable {
        let rates = InMemoryRateTable::new();
        rates.set_rate(ExchangeRate::new(usd(), ars(), dec!(900), day(1))).unwrap();
        rates
    }

    fn setup() -> (MoveService<InMemoryRateTable, ArLocalization>, CompanyId) {
        let mut service = MoveService::new(rates(), ArLocalization::default().with_today(day(20)));
        let company = service.add_company(Company::new("Acme SA", ars(), Some(CountryCode::argentina())));
        (service, company)
    }

    fn usd_invoice(company: CompanyId, move_type: MoveType) -> NewMove {
        let mut input = NewMove::new(company, move_type, usd(), day(5));
        input.invoice_date = Some(day(5));
        input.lines = vec![NewLine::new("1.1.3", dec!(100)), NewLine::new("4.1.1", dec!(-100))];
        input
    }

    #[test]
    fn computed_rate_for_foreign_and_local_moves() {
        let (mut service, company) = setup();
        let foreign = service.create_move(usd_invoice(company, MoveType::OutInvoice)).unwrap();
        let local = service
            .create_move(NewMove::new(company, MoveType::OutInvoice, ars(), day(5)))
            .unwrap();

        let ar = service.extension();
        assert_eq!(ar.computed_currency_rate(service.book(), foreign).unwrap(), dec!(900));
        assert_eq!(ar.computed_currency_rate(service.book(), local).unwrap(), Decimal::ONE);
    }

    #[test]
    fn computed_rate_without_invoice_date_uses_today() {
        let (mut service, company) = setup();
        service
            .book()
            .rates()
            .set_rate(ExchangeRate::new(usd(), ars(), dec!(950.5), day(15)))
            .unwrap();
        let id = service
            .create_move(NewMove::new(company, MoveType::OutInvoice, usd(), day(2)))
            .unwrap();
        assert_eq!(
            service.extension().computed_currency_rate(service.book(), id).unwrap(),
            dec!(950.5)
        );
    }

    #[test]
    fn plain_entry_rate_is_cleared() {
        let (mut service, company) = setup();
        let mut input = usd_invoice(company, MoveType::Entry);
        input.currency_rate = Some(dec!(905));
        let id = service.create_move(input).unwrap();
        assert_eq!(service.extension().l10n_ar_currency_rate(service.book(), id).unwrap(), None);
    }

    #[test]
    fn credit_note_inherits_original_rate() {
        let (mut service, company) = setup();
        let mut original = usd_invoice(company, MoveType::OutInvoice);
        original.currency_rate = Some(dec!(912.34));
        let original = service.create_move(original).unwrap();

        let mut refund = usd_invoice(company, MoveType::OutRefund);
        refund.reversed_entry_id = Some(original);
        refund.currency_rate = Some(dec!(1000));
        let refund = service.create_move(refund).unwrap();

        assert_eq!(service.book().get(refund).unwrap().currency_rate(), Some(dec!(912.34)));
    }

    #[test]
    fn reversal_in_other_currency_keeps_its_rate() {
        let (mut service, company) = setup();
        let mut original = usd_invoice(company, MoveType::OutInvoice);
        original.currency_rate = Some(dec!(912.34));
        let original = service.create_move(original).unwrap();

        let mut refund = NewMove::new(company, MoveType::OutRefund, ars(), day(6));
        refund.reversed_entry_id = Some(original);
        refund.currency_rate = Some(dec!(1));
        let refund = service.create_move(refund).unwrap();

        assert_eq!(service.book().get(refund).unwrap().currency_rate(), Some(dec!(1)));
    }

    #[test]
    fn non_argentine_credit_note_is_left_alone() {
        let mut service = MoveService::new(rates(), ArLocalization::default());
        let company = service.add_company(Company::new("Acme UY", ars(), Some(CountryCode::new("UY").unwrap())));
        let mut original = usd_invoice(company, MoveType::OutInvoice);
        original.currency_rate = Some(dec!(912.34));
        let original = service.create_move(original).unwrap();

        let mut refund = usd_invoice(company, MoveType::OutRefund);
        refund.reversed_entry_id = Some(original);
        let refund = service.create_move(refund).unwrap();

        assert_eq!(service.book().get(refund).unwrap().currency_rate(), None);
        assert_eq!(
            service.invoice_report_name(refund, BASE_INVOICE_REPORT).unwrap(),
            BASE_INVOICE_REPORT
        );
    }

    #[test]
    fn report_name_is_localized_for_argentina() {
        let (mut service, company) = setup();
        let id = service.create_move(usd_invoice(company, MoveType::OutInvoice)).unwrap();
        assert_eq!(service.invoice_report_name(id, BASE_INVOICE_REPORT).unwrap(), AR_INVOICE_REPORT);
        assert_eq!(
            service.invoice_report_name(id, "account.report_payment_receipt").unwrap(),
            "account.report_payment_receipt"
        );
    }

    fn ar_document_types() -> Vec<DocumentType> {
        vec![
            DocumentType::new("1", "FACTURAS A", DocumentInternalType::Invoice),
            DocumentType::new("2", "NOTAS DE DEBITO A", DocumentInternalType::DebitNote),
            DocumentType::new("3", "NOTAS DE CREDITO A", DocumentInternalType::CreditNote),
            DocumentType::new("6", "FACTURAS B", DocumentInternalType::Invoice),
            DocumentType::new("99", "OTROS COMPROBANTES", DocumentInternalType::Invoice),
        ]
    }

    fn allowed_codes(
        service: &MoveService<InMemoryRateTable, ArLocalization>,
        id: MoveId,
        journal: &Journal,
    ) -> Vec<String> {
        service
            .allowed_document_types(id, journal, &ar_document_types())
            .unwrap()
            .into_iter()
            .map(|dt| dt.code)
            .collect()
    }

    #[test]
    fn journal_document_types_restrict_argentine_moves() {
        let (mut service, company) = setup();
        let journal = Journal::new("0001", "Ventas 0001", true).with_document_types(["1", "3", "99"]);
        let invoice = service
            .create_move(NewMove::new(company, MoveType::OutInvoice, ars(), day(3)))
            .unwrap();
        let refund = service
            .create_move(NewMove::new(company, MoveType::OutRefund, ars(), day(3)))
            .unwrap();

        assert_eq!(allowed_codes(&service, invoice, &journal), vec!["1", "99"]);
        assert_eq!(allowed_codes(&service, refund, &journal), vec!["3", "99"]);
    }

    #[test]
    fn unrestricted_journal_falls_back_to_direction_filter() {
        let (mut service, company) = setup();
        let journal = Journal::new("0002", "Ventas 0002", true);
        let refund = service
            .create_move(NewMove::new(company, MoveType::InRefund, ars(), day(3)))
            .unwrap();
        assert_eq!(allowed_codes(&service, refund, &journal), vec!["3"]);
    }

    #[test]
    fn non_argentine_company_ignores_journal_restriction() {
        let mut service = MoveService::new(rates(), ArLocalization::default());
        let company = service.add_company(Company::new("Acme UY", ars(), Some(CountryCode::new("UY").unwrap())));
        let journal = Journal::new("0001", "Ventas", true).with_document_types(["1"]);
        let invoice = service
            .create_move(NewMove::new(company, MoveType::OutInvoice, ars(), day(3)))
            .unwrap();
        assert_eq!(allowed_codes(&service, invoice, &journal), vec!["1", "2", "6", "99"]);
    }

    #[test]
    fn document_moves_skip_duplicate_reference_check() {
        let (mut service, company) = setup();
        let partner = PartnerId::new();
        let bill = |use_documents: bool, reference: &str| {
            let mut input = NewMove::new(company, MoveType::InInvoice, ars(), day(3));
            input.partner_id = Some(partner);
            input.reference = Some(reference.to_string());
            input.use_documents = use_documents;
            input.document_type = use_documents
                .then(|| DocumentType::new("1", "FACTURAS A", DocumentInternalType::Invoice));
            input.lines = vec![NewLine::new("5.1", dec!(10)), NewLine::new("2.1", dec!(-10))];
            input
        };

        let first = service.create_move(bill(true, "0001-00000077")).unwrap();
        service.post(&[first]).unwrap();
        let second = service.create_move(bill(true, "0001-00000077")).unwrap();
        service.post(&[second]).unwrap();

        let third = service.create_move(bill(false, "REM-77")).unwrap();
        service.post(&[third]).unwrap();
        let fourth = service.create_move(bill(false, "REM-77")).unwrap();
        let err = service.post(&[fourth]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn base_extension_still_checks_document_moves() {
        let mut service = MoveService::new(rates(), BaseMoves);
        let company = service.add_company(Company::new("Acme SA", ars(), Some(CountryCode::argentina())));
        let partner = PartnerId::new();
        let bill = || {
            let mut input = NewMove::new(company, MoveType::InInvoice, ars(), day(3));
            input.partner_id = Some(partner);
            input.reference = Some("X-1".to_string());
            input.use_documents = true;
            input.lines = vec![NewLine::new("5.1", dec!(10)), NewLine::new("2.1", dec!(-10))];
            input
        };
        let first = service.create_move(bill()).unwrap();
        service.post(&[first]).unwrap();
        let second = service.create_move(bill()).unwrap();
        assert!(service.post(&[second]).is_err());
    }

    #[test]
    fn legacy_document_number_is_accepted_on_moves() {
        let (mut service, company) = setup();
        let mut input = NewMove::new(company, MoveType::InInvoice, ars(), day(3));
        input.use_documents = true;
        input.document_type = Some(DocumentType::new("1", "FACTURAS A", DocumentInternalType::Invoice));
        let id = service.create_move(input).unwrap();

        service.set_document_number(id, "000100000123").unwrap();
        let parts = service.book().get(id).unwrap().document_parts().unwrap();
        assert_eq!((parts.point_of_sale, parts.invoice_number), (1, 123));
        assert!(service.set_document_number(id, "ABC").is_err());
    }
}
