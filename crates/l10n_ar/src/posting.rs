//! Posting with the tracked rate forced into the recompute step.

use chrono::NaiveDate;

use arledger_accounting::{CurrencyRates, MoveBook, MoveId, PostContext};
use arledger_core::DomainResult;

use crate::config::ArConfig;
use crate::currency_rate::{computed_currency_rate, is_foreign_ar_invoice};

/// Posts `ids`. Foreign-currency Argentine invoices go first, one by one,
/// recomputed and posted at their stored rate (filled from the preview rate
/// when empty); everything else is posted by the base step afterwards.
pub fn post_moves<R: CurrencyRates>(
    book: &mut MoveBook<R>,
    ids: &[MoveId],
    config: &ArConfig,
    today: NaiveDate,
) -> DomainResult<()> {
    book.ensure_postable(ids)?;

    let mut forced = Vec::new();
    let mut rest = Vec::new();
    for id in ids {
        if is_foreign_ar_invoice(book.get(*id)?, book.company_of(*id)?, config) {
            forced.push(*id);
        } else {
            rest.push(*id);
        }
    }

    for id in forced {
        let rate = match book.get(id)?.currency_rate() {
            Some(rate) => rate,
            None => {
                let rate = computed_currency_rate(book.get(id)?, book.company_of(id)?, book.rates(), today)?;
                book.set_currency_rate(id, Some(rate))?;
                rate
            }
        };

        // Base posting keeps entry-time balances unless a rate is forced.
        book.post_with(&[id], &PostContext::forced(rate))?;
        tracing::info!(move_id = %id, %rate, "posted at tracked currency rate");
    }

    book.post_with(&rest, &PostContext::default())
}
