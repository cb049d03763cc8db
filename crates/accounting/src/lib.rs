//! Accounting base (moves, currencies, fiscal document types).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! lifecycle exposes [`MoveExtension`] hooks for country localizations.

pub mod account_move;
pub mod book;
pub mod company;
pub mod currency;
pub mod document;
pub mod extension;
pub mod journal;
pub mod service;

pub use account_move::{
    AccountMove, MoveCommand, MoveEvent, MoveId, MoveLine, MoveState, MoveType,
};
pub use book::{MoveBook, NewLine, NewMove, PostContext};
pub use company::Company;
pub use currency::{CurrencyRates, ExchangeRate, InMemoryRateTable};
pub use document::{parse_document_number, DocumentInternalType, DocumentNumberParts, DocumentType};
pub use extension::{BaseMoves, MoveExtension, BASE_INVOICE_REPORT};
pub use journal::Journal;
pub use service::MoveService;
