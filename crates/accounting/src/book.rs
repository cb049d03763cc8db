//! In-memory book of moves: the base lifecycle the localizations hook into.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use arledger_core::{AggregateId, AggregateRoot, CompanyId, CurrencyCode, DomainError, DomainResult, PartnerId};
use arledger_events::{execute, EventEnvelope};

use crate::account_move::{
    AccountMove, CancelMove, CreateMove, MoveCommand, MoveEvent, MoveId, MoveLine, MoveState, MoveType,
    PostMove, RecomputeBalances, SetCurrencyRate, SetDocumentNumber, SetInvoiceDate, SetReference,
};
use crate::company::Company;
use crate::currency::CurrencyRates;
use crate::document::{DocumentNumberParts, DocumentType};

/// Line input: amount in the move currency, balance is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
    pub account_code: String,
    pub label: Option<String>,
    /// Signed, positive = debit.
    pub amount_currency: Decimal,
}

impl NewLine {
    pub fn new(account_code: impl Into<String>, amount_currency: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            label: None,
            amount_currency,
        }
    }
}

/// Input for creating a draft move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMove {
    pub company_id: CompanyId,
    pub move_type: MoveType,
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    pub invoice_date: Option<NaiveDate>,
    pub partner_id: Option<PartnerId>,
    pub reference: Option<String>,
    pub reversed_entry_id: Option<MoveId>,
    pub use_documents: bool,
    pub document_type: Option<DocumentType>,
    pub lines: Vec<NewLine>,
    pub currency_rate: Option<Decimal>,
}

impl NewMove {
    pub fn new(company_id: CompanyId, move_type: MoveType, currency: CurrencyCode, date: NaiveDate) -> Self {
        Self {
            company_id,
            move_type,
            currency,
            date,
            invoice_date: None,
            partner_id: None,
            reference: None,
            reversed_entry_id: None,
            use_documents: false,
            document_type: None,
            lines: Vec::new(),
            currency_rate: None,
        }
    }
}

/// Context flags threaded through posting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostContext {
    /// When set, balances are recomputed at this rate before posting.
    pub forced_rate: Option<Decimal>,
}

impl PostContext {
    pub fn forced(rate: Decimal) -> Self {
        Self {
            forced_rate: Some(rate),
        }
    }
}

/// Moves, companies and the rate service of one ledger.
#[derive(Debug)]
pub struct MoveBook<R> {
    rates: R,
    companies: HashMap<CompanyId, Company>,
    moves: HashMap<MoveId, AccountMove>,
    events: Vec<EventEnvelope<MoveEvent>>,
}

impl<R: CurrencyRates> MoveBook<R> {
    pub fn new(rates: R) -> Self {
        Self {
            rates,
            companies: HashMap::new(),
            moves: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn rates(&self) -> &R {
        &self.rates
    }

    pub fn add_company(&mut self, company: Company) -> CompanyId {
        let id = company.id;
        self.companies.insert(id, company);
        id
    }

    pub fn company(&self, id: CompanyId) -> DomainResult<&Company> {
        self.companies.get(&id).ok_or_else(DomainError::not_found)
    }

    pub fn get(&self, id: MoveId) -> DomainResult<&AccountMove> {
        self.moves.get(&id).ok_or_else(DomainError::not_found)
    }

    /// Company of an existing move.
    pub fn company_of(&self, id: MoveId) -> DomainResult<&Company> {
        let company_id = self
            .get(id)?
            .company_id()
            .ok_or_else(|| DomainError::invariant("move without company"))?;
        self.company(company_id)
    }

    pub fn moves(&self) -> impl Iterator<Item = &AccountMove> {
        self.moves.values()
    }

    /// Every event emitted so far, in order.
    pub fn events(&self) -> &[EventEnvelope<MoveEvent>] {
        &self.events
    }

    /// Creates a draft move. Line balances are converted with the table rate
    /// at the invoice date (or accounting date) in effect right now.
    pub fn create_move(&mut self, input: NewMove) -> DomainResult<MoveId> {
        let company = self.company(input.company_id)?;
        let rate_date = input.invoice_date.unwrap_or(input.date);
        let rate = self.rates.rate(&input.currency, &company.currency, rate_date)?;
        let draft: Vec<MoveLine> = input
            .lines
            .into_iter()
            .map(|l| MoveLine {
                account_code: l.account_code,
                label: l.label,
                amount_currency: l.amount_currency,
                balance: Decimal::ZERO,
            })
            .collect();
        let lines = crate::account_move::lines_at_rate(&draft, rate, company.currency_decimals)?;

        if let Some(reversed) = input.reversed_entry_id {
            self.get(reversed)?;
        }

        let move_id = MoveId::new(AggregateId::new());
        let cmd = MoveCommand::CreateMove(CreateMove {
            move_id,
            company_id: input.company_id,
            move_type: input.move_type,
            currency: input.currency,
            date: input.date,
            invoice_date: input.invoice_date,
            partner_id: input.partner_id,
            reference: input.reference,
            reversed_entry_id: input.reversed_entry_id,
            use_documents: input.use_documents,
            document_type: input.document_type,
            lines,
            currency_rate: input.currency_rate,
            occurred_at: Utc::now(),
        });

        let mut mv = AccountMove::empty(move_id);
        let events = execute(&mut mv, &cmd)?;
        self.record(input.company_id, move_id, mv.version(), events);
        self.moves.insert(move_id, mv);
        Ok(move_id)
    }

    pub fn set_invoice_date(&mut self, id: MoveId, invoice_date: NaiveDate) -> DomainResult<()> {
        self.dispatch(
            id,
            MoveCommand::SetInvoiceDate(SetInvoiceDate {
                invoice_date,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn set_reference(&mut self, id: MoveId, reference: Option<String>) -> DomainResult<()> {
        self.dispatch(
            id,
            MoveCommand::SetReference(SetReference {
                reference,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn set_currency_rate(&mut self, id: MoveId, currency_rate: Option<Decimal>) -> DomainResult<()> {
        self.dispatch(
            id,
            MoveCommand::SetCurrencyRate(SetCurrencyRate {
                currency_rate,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn set_document_number(
        &mut self,
        id: MoveId,
        document_number: String,
        parts: DocumentNumberParts,
    ) -> DomainResult<()> {
        self.dispatch(
            id,
            MoveCommand::SetDocumentNumber(SetDocumentNumber {
                document_number,
                parts,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn cancel(&mut self, id: MoveId) -> DomainResult<()> {
        self.dispatch(id, MoveCommand::CancelMove(CancelMove { occurred_at: Utc::now() }))
    }

    /// Recompute step: only acts when the context forces a rate. Without one
    /// the balances computed at line entry are kept.
    pub fn recompute_balances(&mut self, id: MoveId, ctx: &PostContext) -> DomainResult<()> {
        let Some(rate) = ctx.forced_rate else {
            return Ok(());
        };
        let decimal_places = self.company_of(id)?.currency_decimals;
        self.dispatch(
            id,
            MoveCommand::RecomputeBalances(RecomputeBalances {
                rate,
                decimal_places,
                occurred_at: Utc::now(),
            }),
        )
    }

    /// Fails without side effects if any of `ids` cannot be posted.
    pub fn ensure_postable(&self, ids: &[MoveId]) -> DomainResult<()> {
        for id in ids {
            self.get(*id)?.ensure_postable()?;
        }
        Ok(())
    }

    /// Base posting.
    pub fn post_with(&mut self, ids: &[MoveId], ctx: &PostContext) -> DomainResult<()> {
        self.ensure_postable(ids)?;
        for id in ids {
            self.recompute_balances(*id, ctx)?;
            let mv = self.get(*id)?;
            if mv.is_invoice(true) && mv.invoice_date().is_none() {
                let date = mv
                    .date()
                    .ok_or_else(|| DomainError::invariant("move without accounting date"))?;
                self.set_invoice_date(*id, date)?;
            }
            self.dispatch(*id, MoveCommand::PostMove(PostMove { occurred_at: Utc::now() }))?;
            tracing::info!(move_id = %id, forced_rate = ?ctx.forced_rate, "move posted");
        }
        Ok(())
    }

    /// Base duplicate vendor-reference constraint over `ids`.
    ///
    /// A vendor bill/refund with a reference and a partner may not share
    /// company, partner, type and reference with any other non-cancelled move,
    /// drafts and the rest of `ids` included.
    pub fn check_duplicate_vendor_reference(&self, ids: &[MoveId]) -> DomainResult<()> {
        for id in ids {
            let mv = self.get(*id)?;
            let (Some(reference), Some(partner)) = (mv.reference(), mv.partner_id()) else {
                continue;
            };
            if !mv.move_type().is_purchase_document() {
                continue;
            }
            let duplicate = self.moves.values().any(|other| {
                other.id_typed() != mv.id_typed()
                    && other.state() != MoveState::Cancel
                    && other.company_id() == mv.company_id()
                    && other.partner_id() == Some(partner)
                    && other.move_type() == mv.move_type()
                    && other.reference() == Some(reference)
            });
            if duplicate {
                return Err(DomainError::validation(format!(
                    "duplicated vendor reference detected: {reference}"
                )));
            }
        }
        Ok(())
    }

    /// Runs `f` against the book; if it fails, every move and event it
    /// touched is restored.
    pub fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> DomainResult<T>) -> DomainResult<T> {
        let moves = self.moves.clone();
        let event_count = self.events.len();
        let result = f(self);
        if let Err(e) = &result {
            tracing::warn!(error = %e, rolled_back = self.events.len() - event_count, "rolling back move batch");
            self.moves = moves;
            self.events.truncate(event_count);
        }
        result
    }

    fn dispatch(&mut self, id: MoveId, cmd: MoveCommand) -> DomainResult<()> {
        let mv = self.moves.get_mut(&id).ok_or_else(DomainError::not_found)?;
        let events = execute(mv, &cmd)?;
        let company_id = mv
            .company_id()
            .ok_or_else(|| DomainError::invariant("move without company"))?;
        let version = mv.version();
        self.record(company_id, id, version, events);
        Ok(())
    }

    /// Wraps freshly applied events; `version` is the aggregate version after them.
    fn record(&mut self, company_id: CompanyId, id: MoveId, version: u64, events: Vec<MoveEvent>) {
        let first = version + 1 - events.len() as u64;
        for (offset, event) in events.into_iter().enumerate() {
            self.events.push(EventEnvelope::new(
                company_id,
                id.0,
                first + offset as u64,
                event,
            ));
        }
    }
}
