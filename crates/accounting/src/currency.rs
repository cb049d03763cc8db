//! Exchange rates and the currency-conversion service.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use arledger_core::{CurrencyCode, DomainError, DomainResult};

/// Exchange rate between two currencies: 1 `from_currency` = `rate` `to_currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    pub rate: Decimal,
    /// First date this rate applies to.
    pub effective_date: NaiveDate,
}

impl ExchangeRate {
    pub fn new(
        from_currency: CurrencyCode,
        to_currency: CurrencyCode,
        rate: Decimal,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            from_currency,
            to_currency,
            rate,
            effective_date,
        }
    }
}

/// Rounds with banker's rounding (half to even).
pub fn round_amount(amount: Decimal, decimal_places: u32) -> Decimal {
    amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}

/// `amount × rate`, failing instead of overflowing.
pub fn checked_product(amount: Decimal, rate: Decimal) -> DomainResult<Decimal> {
    amount.checked_mul(rate).ok_or_else(|| {
        DomainError::validation(format!("amount {amount} at rate {rate} is out of range"))
    })
}

/// Currency-conversion service consumed by the move lifecycle.
pub trait CurrencyRates {
    /// Spot rate converting 1 unit of `from` into `to` as of `date`.
    fn rate(&self, from: &CurrencyCode, to: &CurrencyCode, date: NaiveDate) -> DomainResult<Decimal>;

    /// Convert `amount`; `round` gives the target precision, `None` keeps the
    /// full precision.
    fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: NaiveDate,
        round: Option<u32>,
    ) -> DomainResult<Decimal> {
        let converted = checked_product(amount, self.rate(from, to, date)?)?;
        Ok(match round {
            Some(dp) => round_amount(converted, dp),
            None => converted,
        })
    }
}

impl<T: CurrencyRates + ?Sized> CurrencyRates for &T {
    fn rate(&self, from: &CurrencyCode, to: &CurrencyCode, date: NaiveDate) -> DomainResult<Decimal> {
        (**self).rate(from, to, date)
    }
}

type RateSeries = BTreeMap<NaiveDate, Decimal>;

/// In-memory dated rate table.
///
/// The rate for a date is the latest one effective on or before it; dates
/// older than every known rate fall back to the earliest rate. A pair known
/// only in the opposite direction is inverted.
#[derive(Debug, Default)]
pub struct InMemoryRateTable {
    inner: RwLock<HashMap<(CurrencyCode, CurrencyCode), RateSeries>>,
}

impl InMemoryRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rate(&self, rate: ExchangeRate) -> DomainResult<()> {
        if rate.rate <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "exchange rate {}/{} must be positive",
                rate.from_currency, rate.to_currency
            )));
        }
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("rate table lock poisoned"))?;
        map.entry((rate.from_currency, rate.to_currency))
            .or_default()
            .insert(rate.effective_date, rate.rate);
        Ok(())
    }

    fn pick(series: &RateSeries, date: NaiveDate) -> Option<Decimal> {
        series
            .range(..=date)
            .next_back()
            .or_else(|| series.iter().next())
            .map(|(_, r)| *r)
    }
}

impl CurrencyRates for InMemoryRateTable {
    fn rate(&self, from: &CurrencyCode, to: &CurrencyCode, date: NaiveDate) -> DomainResult<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::invariant("rate table lock poisoned"))?;

        if let Some(rate) = map.get(&(from.clone(), to.clone())).and_then(|s| Self::pick(s, date)) {
            return Ok(rate);
        }
        if let Some(rate) = map.get(&(to.clone(), from.clone())).and_then(|s| Self::pick(s, date)) {
            return Decimal::ONE
                .checked_div(rate)
                .ok_or_else(|| DomainError::invariant("zero exchange rate"));
        }
        Err(DomainError::validation(format!(
            "no exchange rate {from}/{to} available for {date}"
        )))
    }
}
