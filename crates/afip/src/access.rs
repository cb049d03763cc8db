use serde::{Deserialize, Serialize};

use arledger_core::{DomainError, DomainResult, UserId};

/// Who is touching the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    Administrator(UserId),
    User(UserId),
    /// Bulk data load (seed files, migrations).
    DataImport,
}

impl Actor {
    pub fn can_manage_catalog(&self) -> bool {
        matches!(self, Actor::Administrator(_) | Actor::DataImport)
    }

    pub fn ensure_can_manage_catalog(&self) -> DomainResult<()> {
        if self.can_manage_catalog() {
            Ok(())
        } else {
            Err(DomainError::Unauthorized)
        }
    }
}
