//! Journals: where moves are recorded and numbered.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub code: String,
    pub name: String,
    /// Moves in this journal are numbered with fiscal document types.
    pub use_documents: bool,
    /// Document type codes this journal is restricted to; empty = no restriction.
    #[serde(default)]
    pub document_type_codes: Vec<String>,
}

impl Journal {
    pub fn new(code: impl Into<String>, name: impl Into<String>, use_documents: bool) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            use_documents,
            document_type_codes: Vec::new(),
        }
    }

    pub fn with_document_types<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document_type_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the journal limits moves to its own list of document types.
    pub fn use_specific_document_types(&self) -> bool {
        self.use_documents && !self.document_type_codes.is_empty()
    }

    pub fn allows_document_type(&self, code: &str) -> bool {
        self.document_type_codes.iter().any(|c| c == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_types_need_documents_and_a_list() {
        let plain = Journal::new("VEN", "Ventas", true);
        assert!(!plain.use_specific_document_types());

        let restricted = Journal::new("VEN", "Ventas", true).with_document_types(["1", "3"]);
        assert!(restricted.use_specific_document_types());
        assert!(restricted.allows_document_type("3"));
        assert!(!restricted.allows_document_type("6"));

        let no_documents = Journal::new("MISC", "Varios", false).with_document_types(["1"]);
        assert!(!no_documents.use_specific_document_types());
    }
}
