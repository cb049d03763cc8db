//! Currency-rate fields of Argentine moves.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use arledger_accounting::{AccountMove, Company, CurrencyRates, MoveType};
use arledger_core::{DomainError, DomainResult};

use crate::config::ArConfig;

/// Preview rate: 1 unit of the move currency in company currency at the
/// invoice date (or `today`), unrounded. `1` for company-currency moves.
pub fn computed_currency_rate<R: CurrencyRates>(
    mv: &AccountMove,
    company: &Company,
    rates: &R,
    today: NaiveDate,
) -> DomainResult<Decimal> {
    let currency = mv
        .currency()
        .ok_or_else(|| DomainError::invariant("move without currency"))?;
    if *currency == company.currency {
        return Ok(Decimal::ONE);
    }

    let date = mv.invoice_date().unwrap_or(today);
    let rate = rates.convert(Decimal::ONE, currency, &company.currency, date, None)?;
    tracing::debug!(move_id = %mv.id_typed(), %currency, %date, %rate, "computed currency rate");
    Ok(rate)
}

/// Outcome of the stored-rate rule for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUpdate {
    /// Leave the stored value as it is.
    Keep,
    /// Overwrite it (`None` clears it).
    Set(Option<Decimal>),
}

/// Stored rate rule:
/// - plain entries never carry a rate;
/// - a credit/debit note of an Argentine company in a foreign currency
///   inherits the rate of the entry it reverses when both share the currency.
pub fn stored_rate_update(
    mv: &AccountMove,
    reversed: Option<&AccountMove>,
    company: &Company,
    config: &ArConfig,
) -> RateUpdate {
    if mv.move_type() == MoveType::Entry {
        return RateUpdate::Set(None);
    }

    match reversed {
        Some(original)
            if mv.is_invoice(false)
                && company.is_country(&config.country)
                && mv.currency() != Some(&company.currency)
                && original.currency() == mv.currency() =>
        {
            RateUpdate::Set(original.currency_rate())
        }
        _ => RateUpdate::Keep,
    }
}

/// Invoices (receipts excluded) of an Argentine company in a foreign currency.
pub fn is_foreign_ar_invoice(mv: &AccountMove, company: &Company, config: &ArConfig) -> bool {
    mv.is_invoice(false)
        && company.is_country(&config.country)
        && mv.currency().is_some_and(|c| *c != company.currency)
}
