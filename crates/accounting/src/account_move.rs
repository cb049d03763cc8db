use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use arledger_core::{
    Aggregate, AggregateId, AggregateRoot, CompanyId, CurrencyCode, DomainError, DomainResult, PartnerId,
};
use arledger_events::Event;

use crate::currency::{checked_product, round_amount};
use crate::document::{DocumentInternalType, DocumentNumberParts, DocumentType};

/// Move (journal entry) identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveId(pub AggregateId);

impl MoveId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MoveId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Kind of move. Invoices, refunds and receipts specialize plain entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    Entry,
    OutInvoice,
    OutRefund,
    InInvoice,
    InRefund,
    OutReceipt,
    InReceipt,
}

impl MoveType {
    pub fn is_invoice(self, include_receipts: bool) -> bool {
        match self {
            MoveType::OutInvoice | MoveType::OutRefund | MoveType::InInvoice | MoveType::InRefund => true,
            MoveType::OutReceipt | MoveType::InReceipt => include_receipts,
            MoveType::Entry => false,
        }
    }

    /// Vendor bills and refunds (receipts excluded).
    pub fn is_purchase_document(self) -> bool {
        matches!(self, MoveType::InInvoice | MoveType::InRefund)
    }

    pub fn is_refund(self) -> bool {
        matches!(self, MoveType::OutRefund | MoveType::InRefund)
    }

    /// Document classes a move of this type may be numbered with.
    pub fn document_internal_types(self) -> &'static [DocumentInternalType] {
        if self.is_refund() {
            &[DocumentInternalType::CreditNote]
        } else {
            &[DocumentInternalType::Invoice, DocumentInternalType::DebitNote]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveState {
    Draft,
    Posted,
    Cancel,
}

/// Journal item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLine {
    pub account_code: String,
    pub label: Option<String>,
    /// Signed amount in the move currency (positive = debit).
    pub amount_currency: Decimal,
    /// Signed amount in the company currency (positive = debit).
    pub balance: Decimal,
}

impl MoveLine {
    pub fn debit(&self) -> Decimal {
        self.balance.max(Decimal::ZERO)
    }

    pub fn credit(&self) -> Decimal {
        (-self.balance).max(Decimal::ZERO)
    }
}

/// Converts every line at `rate` and pushes the rounding residual onto the
/// last line so the entry stays balanced.
pub fn lines_at_rate(lines: &[MoveLine], rate: Decimal, decimal_places: u32) -> DomainResult<Vec<MoveLine>> {
    let mut out = Vec::with_capacity(lines.len());
    for l in lines {
        out.push(MoveLine {
            balance: round_amount(checked_product(l.amount_currency, rate)?, decimal_places),
            ..l.clone()
        });
    }

    let currency_total = checked_sum(lines.iter().map(|l| l.amount_currency))?;
    if currency_total.is_zero() {
        let residual = checked_sum(out.iter().map(|l| l.balance))?;
        if let Some(last) = out.last_mut() {
            last.balance = last
                .balance
                .checked_sub(residual)
                .ok_or_else(|| DomainError::validation("line balance is out of range"))?;
        }
    }
    Ok(out)
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> DomainResult<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v)
            .ok_or_else(|| DomainError::validation("move total is out of range"))
    })
}

/// Aggregate root: AccountMove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMove {
    id: MoveId,
    company_id: Option<CompanyId>,
    move_type: MoveType,
    state: MoveState,
    currency: Option<CurrencyCode>,
    date: Option<NaiveDate>,
    invoice_date: Option<NaiveDate>,
    partner_id: Option<PartnerId>,
    reference: Option<String>,
    reversed_entry_id: Option<MoveId>,
    use_documents: bool,
    document_type: Option<DocumentType>,
    document_number: Option<String>,
    document_parts: Option<DocumentNumberParts>,
    lines: Vec<MoveLine>,
    currency_rate: Option<Decimal>,
    version: u64,
    created: bool,
}

impl AccountMove {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: MoveId) -> Self {
        Self {
            id,
            company_id: None,
            move_type: MoveType::Entry,
            state: MoveState::Draft,
            currency: None,
            date: None,
            invoice_date: None,
            partner_id: None,
            reference: None,
            reversed_entry_id: None,
            use_documents: false,
            document_type: None,
            document_number: None,
            document_parts: None,
            lines: Vec::new(),
            currency_rate: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> MoveId {
        self.id
    }

    pub fn company_id(&self) -> Option<CompanyId> {
        self.company_id
    }

    pub fn move_type(&self) -> MoveType {
        self.move_type
    }

    pub fn state(&self) -> MoveState {
        self.state
    }

    pub fn currency(&self) -> Option<&CurrencyCode> {
        self.currency.as_ref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn invoice_date(&self) -> Option<NaiveDate> {
        self.invoice_date
    }

    pub fn partner_id(&self) -> Option<PartnerId> {
        self.partner_id
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn reversed_entry_id(&self) -> Option<MoveId> {
        self.reversed_entry_id
    }

    /// Whether the move is numbered with fiscal document types.
    pub fn use_documents(&self) -> bool {
        self.use_documents
    }

    pub fn document_type(&self) -> Option<&DocumentType> {
        self.document_type.as_ref()
    }

    pub fn document_number(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    pub fn document_parts(&self) -> Option<DocumentNumberParts> {
        self.document_parts
    }

    pub fn lines(&self) -> &[MoveLine] {
        &self.lines
    }

    /// Explicitly tracked conversion rate (company currency per unit of move
    /// currency). `None` means empty.
    pub fn currency_rate(&self) -> Option<Decimal> {
        self.currency_rate
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_invoice(&self, include_receipts: bool) -> bool {
        self.move_type.is_invoice(include_receipts)
    }

    /// Sum of balances in company currency; zero for a balanced entry.
    pub fn balance_total(&self) -> DomainResult<Decimal> {
        checked_sum(self.lines.iter().map(|l| l.balance))
    }

    /// Checks that `PostMove` would be accepted, without emitting anything.
    pub fn ensure_postable(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.state != MoveState::Draft {
            return Err(DomainError::conflict(format!("move {} is not in draft", self.id)));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot post a move without lines"));
        }
        if !self.balance_total()?.is_zero() {
            return Err(DomainError::invariant("debits must equal credits"));
        }
        Ok(())
    }
}

impl AggregateRoot for AccountMove {
    type Id = MoveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateMove. Line balances are already converted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMove {
    pub move_id: MoveId,
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
    pub lines: Vec<MoveLine>,
    pub currency_rate: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInvoiceDate {
    pub invoice_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetReference {
    pub reference: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCurrencyRate {
    pub currency_rate: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetDocumentNumber. `parts` come from the (possibly localized) parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDocumentNumber {
    pub document_number: String,
    pub parts: DocumentNumberParts,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecomputeBalances at an explicit rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeBalances {
    pub rate: Decimal,
    pub decimal_places: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMove {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelMove {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCommand {
    CreateMove(CreateMove),
    SetInvoiceDate(SetInvoiceDate),
    SetReference(SetReference),
    SetCurrencyRate(SetCurrencyRate),
    SetDocumentNumber(SetDocumentNumber),
    RecomputeBalances(RecomputeBalances),
    PostMove(PostMove),
    CancelMove(CancelMove),
}

/// Event: MoveCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCreated {
    pub move_id: MoveId,
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
    pub lines: Vec<MoveLine>,
    pub currency_rate: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDateSet {
    pub move_id: MoveId,
    pub invoice_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSet {
    pub move_id: MoveId,
    pub reference: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRateSet {
    pub move_id: MoveId,
    pub currency_rate: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNumberSet {
    pub move_id: MoveId,
    pub document_number: String,
    pub parts: DocumentNumberParts,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancesRecomputed {
    pub move_id: MoveId,
    pub rate: Decimal,
    pub lines: Vec<MoveLine>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePosted {
    pub move_id: MoveId,
    pub company_id: CompanyId,
    pub lines: Vec<MoveLine>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCancelled {
    pub move_id: MoveId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveEvent {
    MoveCreated(MoveCreated),
    InvoiceDateSet(InvoiceDateSet),
    ReferenceSet(ReferenceSet),
    CurrencyRateSet(CurrencyRateSet),
    DocumentNumberSet(DocumentNumberSet),
    BalancesRecomputed(BalancesRecomputed),
    MovePosted(MovePosted),
    MoveCancelled(MoveCancelled),
}

impl Event for MoveEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MoveEvent::MoveCreated(_) => "accounting.move.created",
            MoveEvent::InvoiceDateSet(_) => "accounting.move.invoice_date_set",
            MoveEvent::ReferenceSet(_) => "accounting.move.reference_set",
            MoveEvent::CurrencyRateSet(_) => "accounting.move.currency_rate_set",
            MoveEvent::DocumentNumberSet(_) => "accounting.move.document_number_set",
            MoveEvent::BalancesRecomputed(_) => "accounting.move.balances_recomputed",
            MoveEvent::MovePosted(_) => "accounting.move.posted",
            MoveEvent::MoveCancelled(_) => "accounting.move.cancelled",
        }
    }
}

impl Aggregate for AccountMove {
    type Command = MoveCommand;
    type Event = MoveEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            MoveEvent::MoveCreated(e) => {
                self.id = e.move_id;
                self.company_id = Some(e.company_id);
                self.move_type = e.move_type;
                self.state = MoveState::Draft;
                self.currency = Some(e.currency.clone());
                self.date = Some(e.date);
                self.invoice_date = e.invoice_date;
                self.partner_id = e.partner_id;
                self.reference = e.reference.clone();
                self.reversed_entry_id = e.reversed_entry_id;
                self.use_documents = e.use_documents;
                self.document_type = e.document_type.clone();
                self.lines = e.lines.clone();
                self.currency_rate = e.currency_rate;
                self.created = true;
            }
            MoveEvent::InvoiceDateSet(e) => {
                self.invoice_date = Some(e.invoice_date);
            }
            MoveEvent::ReferenceSet(e) => {
                self.reference = e.reference.clone();
            }
            MoveEvent::CurrencyRateSet(e) => {
                self.currency_rate = e.currency_rate;
            }
            MoveEvent::DocumentNumberSet(e) => {
                self.document_number = Some(e.document_number.clone());
                self.document_parts = Some(e.parts);
            }
            MoveEvent::BalancesRecomputed(e) => {
                self.lines = e.lines.clone();
            }
            MoveEvent::MovePosted(_) => {
                self.state = MoveState::Posted;
            }
            MoveEvent::MoveCancelled(_) => {
                self.state = MoveState::Cancel;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            MoveCommand::CreateMove(cmd) => self.handle_create(cmd),
            MoveCommand::SetInvoiceDate(cmd) => {
                self.ensure_draft()?;
                Ok(vec![MoveEvent::InvoiceDateSet(InvoiceDateSet {
                    move_id: self.id,
                    invoice_date: cmd.invoice_date,
                    occurred_at: cmd.occurred_at,
                })])
            }
            MoveCommand::SetReference(cmd) => {
                self.ensure_draft()?;
                Ok(vec![MoveEvent::ReferenceSet(ReferenceSet {
                    move_id: self.id,
                    reference: normalize_reference(cmd.reference.as_deref()),
                    occurred_at: cmd.occurred_at,
                })])
            }
            MoveCommand::SetCurrencyRate(cmd) => self.handle_set_rate(cmd),
            MoveCommand::SetDocumentNumber(cmd) => self.handle_document_number(cmd),
            MoveCommand::RecomputeBalances(cmd) => self.handle_recompute(cmd),
            MoveCommand::PostMove(cmd) => self.handle_post(cmd),
            MoveCommand::CancelMove(cmd) => self.handle_cancel(cmd),
        }
    }
}

fn normalize_reference(reference: Option<&str>) -> Option<String> {
    reference
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

impl AccountMove {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_draft(&self) -> Result<(), DomainError> {
        self.ensure_created()?;
        if self.state != MoveState::Draft {
            return Err(DomainError::conflict(format!(
                "move {} can only be modified in draft",
                self.id
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateMove) -> Result<Vec<MoveEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("move already exists"));
        }
        if cmd.move_id != self.id {
            return Err(DomainError::invariant("move_id mismatch"));
        }
        if cmd.reversed_entry_id == Some(cmd.move_id) {
            return Err(DomainError::invariant("a move cannot reverse itself"));
        }
        if cmd.currency_rate.is_some_and(|r| r <= Decimal::ZERO) {
            return Err(DomainError::validation("currency rate must be positive"));
        }

        Ok(vec![MoveEvent::MoveCreated(MoveCreated {
            move_id: cmd.move_id,
            company_id: cmd.company_id,
            move_type: cmd.move_type,
            currency: cmd.currency.clone(),
            date: cmd.date,
            invoice_date: cmd.invoice_date,
            partner_id: cmd.partner_id,
            reference: normalize_reference(cmd.reference.as_deref()),
            reversed_entry_id: cmd.reversed_entry_id,
            use_documents: cmd.use_documents,
            document_type: cmd.document_type.clone(),
            lines: cmd.lines.clone(),
            // Plain entries never carry a rate.
            currency_rate: cmd.currency_rate.filter(|_| cmd.move_type != MoveType::Entry),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_rate(&self, cmd: &SetCurrencyRate) -> Result<Vec<MoveEvent>, DomainError> {
        self.ensure_draft()?;
        if cmd.currency_rate.is_some_and(|r| r <= Decimal::ZERO) {
            return Err(DomainError::validation("currency rate must be positive"));
        }
        if self.move_type == MoveType::Entry && cmd.currency_rate.is_some() {
            return Err(DomainError::validation("journal entries do not carry a currency rate"));
        }
        Ok(vec![MoveEvent::CurrencyRateSet(CurrencyRateSet {
            move_id: self.id,
            currency_rate: cmd.currency_rate,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_document_number(&self, cmd: &SetDocumentNumber) -> Result<Vec<MoveEvent>, DomainError> {
        self.ensure_draft()?;
        if !self.use_documents || self.document_type.is_none() {
            return Err(DomainError::invariant(
                "document numbers require a move with a fiscal document type",
            ));
        }
        Ok(vec![MoveEvent::DocumentNumberSet(DocumentNumberSet {
            move_id: self.id,
            document_number: cmd.document_number.trim().to_string(),
            parts: cmd.parts,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_recompute(&self, cmd: &RecomputeBalances) -> Result<Vec<MoveEvent>, DomainError> {
        self.ensure_draft()?;
        if cmd.rate <= Decimal::ZERO {
            return Err(DomainError::validation("currency rate must be positive"));
        }
        Ok(vec![MoveEvent::BalancesRecomputed(BalancesRecomputed {
            move_id: self.id,
            rate: cmd.rate,
            lines: lines_at_rate(&self.lines, cmd.rate, cmd.decimal_places)?,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_post(&self, cmd: &PostMove) -> Result<Vec<MoveEvent>, DomainError> {
        self.ensure_postable()?;

        let company_id = self
            .company_id
            .ok_or_else(|| DomainError::invariant("move without company"))?;

        Ok(vec![MoveEvent::MovePosted(MovePosted {
            move_id: self.id,
            company_id,
            lines: self.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelMove) -> Result<Vec<MoveEvent>, DomainError> {
        self.ensure_created()?;
        if self.state == MoveState::Cancel {
            return Err(DomainError::conflict("move is already cancelled"));
        }
        Ok(vec![MoveEvent::MoveCancelled(MoveCancelled {
            move_id: self.id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
