use serde::{Deserialize, Serialize};

use super::catalog::BookRecord;
use super::domain::{BookId, LoanRecord};

/// Read side the alert job scans once per run.
pub trait LoanSource: Send + Sync {
    /// Only loans with a non-empty borrower and due date. An empty result is not an error.
    fn fetch_active_loans(&self) -> Result<Vec<LoanRecord>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("loan source unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification channel bound to one pre-provisioned topic.
pub trait AlertDispatcher: Send + Sync {
    fn publish(&self, subject: &str, body: &str) -> Result<DeliveryId, DispatchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub String);

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("alert dispatch unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for the book catalog.
pub trait CatalogRepository: Send + Sync {
    fn insert(&self, book: BookRecord) -> Result<BookRecord, RepositoryError>;
    fn update(&self, book: BookRecord) -> Result<BookRecord, RepositoryError>;
    fn fetch(&self, id: &BookId) -> Result<Option<BookRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<BookRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
