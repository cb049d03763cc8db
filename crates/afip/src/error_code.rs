use serde::{Deserialize, Serialize};

use arledger_core::{AggregateId, DomainError, DomainResult, Entity};

/// Length of an AFIP web-service error code.
pub const AFIP_CODE_LEN: usize = 2;

/// Longest accepted error name, in characters.
pub const AFIP_NAME_MAX_LEN: usize = 64;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AfipErrorCodeId(pub AggregateId);

impl AfipErrorCodeId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AfipErrorCodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Error code returned by the AFIP electronic invoicing web service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfipErrorCode {
    pub id: AfipErrorCodeId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

fn validate_code(code: &str) -> DomainResult<String> {
    let code = code.trim();
    if code.chars().count() != AFIP_CODE_LEN {
        return Err(DomainError::validation(format!(
            "AFIP error code must be {AFIP_CODE_LEN} characters, got {code:?}"
        )));
    }
    Ok(code.to_string())
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("AFIP error name is required"));
    }
    if name.chars().count() > AFIP_NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "AFIP error name must be at most {AFIP_NAME_MAX_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

impl AfipErrorCode {
    pub fn new(code: &str, name: &str, description: Option<&str>) -> DomainResult<Self> {
        Ok(Self {
            id: AfipErrorCodeId::new(AggregateId::new()),
            code: validate_code(code)?,
            name: validate_name(name)?,
            description: normalize_description(description),
        })
    }

    /// Applies `changes`, validating every provided field first.
    pub fn apply_changes(&mut self, changes: &AfipErrorCodeChanges) -> DomainResult<()> {
        let code = changes.code.as_deref().map(validate_code).transpose()?;
        let name = changes.name.as_deref().map(validate_name).transpose()?;

        if let Some(code) = code {
            self.code = code;
        }
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = &changes.description {
            self.description = normalize_description(description.as_deref());
        }
        Ok(())
    }
}

impl Entity for AfipErrorCode {
    type Id = AfipErrorCodeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for AfipErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} - {}", self.code, self.name)
    }
}

/// Import/create payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAfipErrorCode {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update; `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfipErrorCodeChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}
