//! Code → name → description lookup table with admin-only maintenance.

use std::io::Read;
use std::path::Path;

use anyhow::Context;

use arledger_core::{DomainError, DomainResult};

use crate::access::Actor;
use crate::error_code::{AfipErrorCode, AfipErrorCodeChanges, AfipErrorCodeId, NewAfipErrorCode};
use crate::store::AfipErrorCodeStore;

#[derive(Debug)]
pub struct AfipErrorCatalog<S> {
    store: S,
}

impl<S: AfipErrorCodeStore> AfipErrorCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get(&self, id: AfipErrorCodeId) -> DomainResult<AfipErrorCode> {
        self.store.get(id)?.ok_or_else(DomainError::not_found)
    }

    pub fn find_by_code(&self, code: &str) -> DomainResult<Option<AfipErrorCode>> {
        Ok(self.store.find_by_code(code.trim())?)
    }

    /// All codes, ordered by code.
    pub fn list(&self) -> DomainResult<Vec<AfipErrorCode>> {
        let mut records = self.store.list()?;
        records.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(records)
    }

    pub fn create(&self, actor: Actor, input: &NewAfipErrorCode) -> DomainResult<AfipErrorCode> {
        actor.ensure_can_manage_catalog()?;
        let record = AfipErrorCode::new(&input.code, &input.name, input.description.as_deref())?;
        self.store.insert_unique(record.clone())?;
        tracing::info!(code = %record.code, ?actor, "AFIP error code created");
        Ok(record)
    }

    pub fn update(
        &self,
        actor: Actor,
        id: AfipErrorCodeId,
        changes: &AfipErrorCodeChanges,
    ) -> DomainResult<AfipErrorCode> {
        actor.ensure_can_manage_catalog()?;
        let mut record = self.get(id)?;
        record.apply_changes(changes)?;
        self.store.insert_unique(record.clone())?;
        Ok(record)
    }

    pub fn delete(&self, actor: Actor, id: AfipErrorCodeId) -> DomainResult<AfipErrorCode> {
        actor.ensure_can_manage_catalog()?;
        let removed = self.store.remove(id)?.ok_or_else(DomainError::not_found)?;
        tracing::info!(code = %removed.code, ?actor, "AFIP error code deleted");
        Ok(removed)
    }

    /// Loads a JSON array of `{code, name, description}`; existing codes are
    /// updated in place. Returns how many records were written.
    ///
    /// The whole payload is validated before anything is stored.
    pub fn import_json<Rd: Read>(&self, reader: Rd) -> DomainResult<usize> {
        let rows: Vec<NewAfipErrorCode> = serde_json::from_reader(reader)
            .map_err(|e| DomainError::validation(format!("invalid AFIP error code data: {e}")))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut record = AfipErrorCode::new(&row.code, &row.name, row.description.as_deref())?;
            if records.iter().any(|r: &AfipErrorCode| r.code == record.code) {
                return Err(DomainError::conflict(format!(
                    "AFIP error code {} appears twice in import",
                    record.code
                )));
            }
            if let Some(existing) = self.store.find_by_code(&record.code)? {
                record.id = existing.id;
            }
            records.push(record);
        }

        let count = records.len();
        for record in records {
            self.store.insert_unique(record)?;
        }
        tracing::info!(count, actor = ?Actor::DataImport, "AFIP error codes imported");
        Ok(count)
    }

    /// [`Self::import_json`] from a seed file.
    pub fn import_json_file(&self, path: &Path) -> anyhow::Result<usize> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening AFIP error code seed {}", path.display()))?;
        let count = self
            .import_json(std::io::BufReader::new(file))
            .with_context(|| format!("importing AFIP error codes from {}", path.display()))?;
        Ok(count)
    }
}
