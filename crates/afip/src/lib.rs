//! `arledger-afip` — catalog of AFIP electronic-invoicing web service error
//! codes.

pub mod access;
pub mod catalog;
pub mod error_code;
pub mod store;

pub use access::Actor;
pub use catalog::AfipErrorCatalog;
pub use error_code::{AFIP_CODE_LEN, AFIP_NAME_MAX_LEN, AfipErrorCode, AfipErrorCodeChanges, AfipErrorCodeId, NewAfipErrorCode};
pub use store::{AfipErrorCodeStore, AfipErrorCodeStoreError, InMemoryAfipErrorCodeStore};
