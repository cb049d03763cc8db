//! Storage for the error-code table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use arledger_core::DomainError;

use crate::error_code::{AfipErrorCode, AfipErrorCodeId};

pub trait AfipErrorCodeStore: Send + Sync {
    fn get(&self, id: AfipErrorCodeId) -> Result<Option<AfipErrorCode>, AfipErrorCodeStoreError>;

    fn find_by_code(&self, code: &str) -> Result<Option<AfipErrorCode>, AfipErrorCodeStoreError>;

    /// Inserts or replaces `record`, unless another record already holds its
    /// code. Check and write happen under one lock.
    fn insert_unique(&self, record: AfipErrorCode) -> Result<(), AfipErrorCodeStoreError>;

    fn remove(&self, id: AfipErrorCodeId) -> Result<Option<AfipErrorCode>, AfipErrorCodeStoreError>;

    fn list(&self) -> Result<Vec<AfipErrorCode>, AfipErrorCodeStoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AfipErrorCodeStoreError {
    #[error("AFIP error code {0} already exists")]
    DuplicateCode(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<AfipErrorCodeStoreError> for DomainError {
    fn from(err: AfipErrorCodeStoreError) -> Self {
        match err {
            AfipErrorCodeStoreError::DuplicateCode(_) => DomainError::conflict(err.to_string()),
            AfipErrorCodeStoreError::Storage(_) => DomainError::invariant(err.to_string()),
        }
    }
}

impl<S> AfipErrorCodeStore for Arc<S>
where
    S: AfipErrorCodeStore + ?Sized,
{
    fn get(&self, id: AfipErrorCodeId) -> Result<Option<AfipErrorCode>, AfipErrorCodeStoreError> {
        (**self).get(id)
    }

    fn find_by_code(&self, code: &str) -> Result<Option<AfipErrorCode>, AfipErrorCodeStoreError> {
        (**self).find_by_code(code)
    }

    fn insert_unique(&self, record: AfipErrorCode) -> Result<(), AfipErrorCodeStoreError> {
        (**self).insert_unique(record)
    }

    fn remove(&self, id: AfipErrorCodeId) -> Result<Option<AfipErrorCode>, AfipErrorCodeStoreError> {
        (**self).remove(id)
    }

    fn list(&self) -> Result<Vec<AfipErrorCode>, AfipErrorCodeStoreError> {
        (**self).list()
    }
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAfipErrorCodeStore {
    inner: RwLock<HashMap<AfipErrorCodeId, AfipErrorCode>>,
}

impl InMemoryAfipErrorCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AfipErrorCodeStoreError {
    AfipErrorCodeStoreError::Storage("lock poisoned".to_string())
}

impl AfipErrorCodeStore for InMemoryAfipErrorCodeStore {
    fn get(&self, id: AfipErrorCodeId) -> Result<Option<AfipErrorCode>, AfipErrorCodeStoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.get(&id).cloned())
    }

    fn find_by_code(&self, code: &str) -> Result<Option<AfipErrorCode>, AfipErrorCodeStoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.values().find(|r| r.code == code).cloned())
    }

    fn insert_unique(&self, record: AfipErrorCode) -> Result<(), AfipErrorCodeStoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        if map.values().any(|r| r.code == record.code && r.id != record.id) {
            return Err(AfipErrorCodeStoreError::DuplicateCode(record.code));
        }
        map.insert(record.id, record);
        Ok(())
    }

    fn remove(&self, id: AfipErrorCodeId) -> Result<Option<AfipErrorCode>, AfipErrorCodeStoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        Ok(map.remove(&id))
    }

    fn list(&self) -> Result<Vec<AfipErrorCode>, AfipErrorCodeStoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.values().cloned().collect())
    }
}
