//! End-to-end lifecycle of Argentine moves through the base move service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use arledger_accounting::{
    BaseMoves, Company, ExchangeRate, InMemoryRateTable, MoveEvent, MoveService, MoveState, MoveType,
    NewLine, NewMove,
};
use arledger_core::{CompanyId, CountryCode, CurrencyCode};
use arledger_events::Event;
use arledger_l10n_ar::{ArConfig, ArLocalization};

fn ars() -> CurrencyCode {
    CurrencyCode::new("ARS").unwrap()
}

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD").unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
}

fn rate_table() -> InMemoryRateTable {
    let rates = InMemoryRateTable::new();
    rates
        .set_rate(ExchangeRate::new(usd(), ars(), dec!(900), day(1)))
        .unwrap();
    rates
}

fn ar_company() -> Company {
    Company::new("Acme SA", ars(), Some(CountryCode::argentina()))
}

fn usd_invoice(company: CompanyId, move_type: MoveType, amount: Decimal) -> NewMove {
    let mut input = NewMove::new(company, move_type, usd(), day(5));
    input.invoice_date = Some(day(5));
    input.lines = vec![NewLine::new("1.1.3.01", amount), NewLine::new("4.1.1.01", -amount)];
    input
}

fn ar_service() -> (MoveService<InMemoryRateTable, ArLocalization>, CompanyId) {
    arledger_observability::init();
    let localization = ArLocalization::new(ArConfig::default()).with_today(day(20));
    let mut service = MoveService::new(rate_table(), localization);
    let company = service.add_company(ar_company());
    (service, company)
}

fn balances(service: &MoveService<InMemoryRateTable, ArLocalization>, id: arledger_accounting::MoveId) -> Vec<Decimal> {
    service.book().get(id).unwrap().lines().iter().map(|l| l.balance).collect()
}

#[test]
fn posting_uses_the_stored_rate_not_the_entry_time_rate() {
    let (mut service, company) = ar_service();
    let id = service
        .create_move(usd_invoice(company, MoveType::OutInvoice, dec!(100)))
        .unwrap();
    assert_eq!(balances(&service, id), vec![dec!(90000), dec!(-90000)]);

    service.set_currency_rate(id, Some(dec!(951.25))).unwrap();
    service.post(&[id]).unwrap();

    let mv = service.book().get(id).unwrap();
    assert_eq!(mv.state(), MoveState::Posted);
    assert_eq!(mv.currency_rate(), Some(dec!(951.25)));
    assert_eq!(balances(&service, id), vec![dec!(95125), dec!(-95125)]);

    let posted = service
        .book()
        .events()
        .iter()
        .rev()
        .find_map(|e| match e.payload() {
            MoveEvent::MovePosted(p) if p.move_id == id => Some(p.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(posted.lines[0].balance, dec!(95125));
}

#[test]
fn rate_change_after_entry_is_picked_up_only_with_the_localization() {
    // Base behavior: balances stay at the rate in effect when lines were entered.
    let mut base = MoveService::new(rate_table(), BaseMoves);
    let base_company = base.add_company(ar_company());
    let base_id = base
        .create_move(usd_invoice(base_company, MoveType::OutInvoice, dec!(10)))
        .unwrap();
    base.book()
        .rates()
        .set_rate(ExchangeRate::new(usd(), ars(), dec!(1000), day(4)))
        .unwrap();
    base.post(&[base_id]).unwrap();
    let stale: Vec<Decimal> = base.book().get(base_id).unwrap().lines().iter().map(|l| l.balance).collect();
    assert_eq!(stale, vec![dec!(9000), dec!(-9000)]);

    // Localized: the empty stored rate is filled at posting and forced.
    let (mut service, company) = ar_service();
    let id = service
        .create_move(usd_invoice(company, MoveType::OutInvoice, dec!(10)))
        .unwrap();
    service
        .book()
        .rates()
        .set_rate(ExchangeRate::new(usd(), ars(), dec!(1000), day(4)))
        .unwrap();
    service.post(&[id]).unwrap();

    assert_eq!(service.book().get(id).unwrap().currency_rate(), Some(dec!(1000)));
    assert_eq!(balances(&service, id), vec![dec!(10000), dec!(-10000)]);
}

#[test]
fn credit_note_posts_at_the_original_rate() {
    let (mut service, company) = ar_service();
    let mut original = usd_invoice(company, MoveType::OutInvoice, dec!(40));
    original.currency_rate = Some(dec!(925.5));
    let original = service.create_move(original).unwrap();
    service.post(&[original]).unwrap();

    service
        .book()
        .rates()
        .set_rate(ExchangeRate::new(usd(), ars(), dec!(1100), day(6)))
        .unwrap();

    let mut refund = NewMove::new(company, MoveType::OutRefund, usd(), day(8));
    refund.invoice_date = Some(day(8));
    refund.reversed_entry_id = Some(original);
    refund.lines = vec![NewLine::new("4.1.1.01", dec!(40)), NewLine::new("1.1.3.01", dec!(-40))];
    let refund = service.create_move(refund).unwrap();
    assert_eq!(service.book().get(refund).unwrap().currency_rate(), Some(dec!(925.5)));

    // The preview still reflects the table.
    assert_eq!(
        service.extension().computed_currency_rate(service.book(), refund).unwrap(),
        dec!(1100)
    );

    service.post(&[refund]).unwrap();
    assert_eq!(balances(&service, refund), vec![dec!(37020), dec!(-37020)]);
}

#[test]
fn mixed_batch_posts_matching_and_remaining_moves() {
    let (mut service, company) = ar_service();
    let foreign = service
        .create_move(usd_invoice(company, MoveType::InInvoice, dec!(3)))
        .unwrap();
    service.set_currency_rate(foreign, Some(dec!(901))).unwrap();

    let mut entry = NewMove::new(company, MoveType::Entry, ars(), day(5));
    entry.lines = vec![NewLine::new("1.1.1", dec!(500)), NewLine::new("3.1.1", dec!(-500))];
    let entry = service.create_move(entry).unwrap();

    let mut local = NewMove::new(company, MoveType::OutInvoice, ars(), day(5));
    local.lines = vec![NewLine::new("1.1.3.01", dec!(121)), NewLine::new("4.1.1.01", dec!(-121))];
    let local = service.create_move(local).unwrap();

    service.post(&[entry, foreign, local]).unwrap();

    for id in [entry, foreign, local] {
        assert_eq!(service.book().get(id).unwrap().state(), MoveState::Posted);
    }
    assert_eq!(balances(&service, foreign), vec![dec!(2703), dec!(-2703)]);
    assert_eq!(service.book().get(entry).unwrap().currency_rate(), None);
    assert_eq!(service.book().get(local).unwrap().currency_rate(), None);

    let posted_order: Vec<_> = service
        .book()
        .events()
        .iter()
        .filter(|e| e.payload().event_type() == "accounting.move.posted")
        .map(|e| e.aggregate_id())
        .collect();
    assert_eq!(posted_order, vec![foreign.0, entry.0, local.0]);
}

#[test]
fn nothing_is_posted_when_one_move_is_not_postable() {
    let (mut service, company) = ar_service();
    let good = service
        .create_move(usd_invoice(company, MoveType::OutInvoice, dec!(1)))
        .unwrap();
    let empty = service
        .create_move(NewMove::new(company, MoveType::OutInvoice, usd(), day(5)))
        .unwrap();

    assert!(service.post(&[good, empty]).is_err());
    assert_eq!(service.book().get(good).unwrap().state(), MoveState::Draft);
    assert_eq!(service.book().get(good).unwrap().currency_rate(), None);
}

#[test]
fn failing_batch_leaves_foreign_invoices_untouched() {
    let (mut service, company) = ar_service();
    let good = service
        .create_move(usd_invoice(company, MoveType::OutInvoice, dec!(2)))
        .unwrap();

    let mut unbalanced = NewMove::new(company, MoveType::OutInvoice, ars(), day(5));
    unbalanced.lines = vec![NewLine::new("1.1.3.01", dec!(10)), NewLine::new("4.1.1.01", dec!(-9))];
    let unbalanced = service.create_move(unbalanced).unwrap();

    assert!(service.post(&[good, unbalanced]).is_err());
    let mv = service.book().get(good).unwrap();
    assert_eq!(mv.state(), MoveState::Draft);
    assert_eq!(mv.currency_rate(), None);
    assert!(
        !service
            .book()
            .events()
            .iter()
            .any(|e| e.payload().event_type() == "accounting.move.posted")
    );
}

#[test]
fn receipts_keep_their_entry_time_balances() {
    let (mut service, company) = ar_service();
    let mut receipt = usd_invoice(company, MoveType::OutReceipt, dec!(10));
    receipt.currency_rate = Some(dec!(950));
    let receipt = service.create_move(receipt).unwrap();

    service.post(&[receipt]).unwrap();
    assert_eq!(balances(&service, receipt), vec![dec!(9000), dec!(-9000)]);
    assert_eq!(service.book().get(receipt).unwrap().currency_rate(), Some(dec!(950)));
}

#[test]
fn journal_entries_reject_a_stored_rate() {
    let (mut service, company) = ar_service();
    let mut entry = NewMove::new(company, MoveType::Entry, usd(), day(5));
    entry.lines = vec![NewLine::new("1.1.1", dec!(1)), NewLine::new("3.1.1", dec!(-1))];
    let entry = service.create_move(entry).unwrap();

    assert!(service.set_currency_rate(entry, Some(dec!(777))).is_err());
    service.post(&[entry]).unwrap();
    assert_eq!(service.book().get(entry).unwrap().currency_rate(), None);
}
