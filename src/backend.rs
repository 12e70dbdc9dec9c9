use thiserror::Error;
use time::Date;

/// The backend RPC surface the document core consumes. The host shell
/// supplies the transport; the core only depends on this call contract.
pub trait JournalBackend {
    fn load_document(&self, date: Date) -> Result<LoadedDocument, BackendError>;
    fn validate_document(&self, document: &str) -> Result<ValidationOutcome, BackendError>;
    fn apply_document(
        &self,
        document: &str,
        date: Date,
        deleted_entity_ids: &[String],
    ) -> Result<ApplyCounts, BackendError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend rejected the call: {0}")]
    Rejected(String),
    #[error("backend unreachable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn message(&self) -> &str {
        match self {
            BackendError::Rejected(msg) | BackendError::Unavailable(msg) => msg,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: String,
    pub entries: Vec<LoadedEntry>,
}

/// Entry record as returned by `LoadDocument`, joined to document lines
/// by the session at load time.
#[derive(Debug, Clone)]
pub struct LoadedEntry {
    pub entity_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }
}

/// Line-scoped message from the backend validator. Replaced wholesale on
/// every validation round-trip, never accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub line_number: usize,
    pub message: String,
    pub quick_fixes: Vec<String>,
}

/// Mutation counts reported by a successful `ApplyDocument`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyCounts {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub migrated: usize,
}
