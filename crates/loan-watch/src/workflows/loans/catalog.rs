use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::classify::parse_due_date;
use super::domain::{BookId, LoanRecord};
use super::repository::{CatalogRepository, LoanSource, RepositoryError, SourceError};

/// A catalog entry. A book is on loan when both `borrower` and `due_date` are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl BookRecord {
    pub fn as_active_loan(&self) -> Option<LoanRecord> {
        let borrower = non_blank(self.borrower.as_deref())?;
        let due_date = non_blank(self.due_date.as_deref())?;
        Some(LoanRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            borrower: borrower.to_string(),
            due_date: due_date.to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Payload for adding a book.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookDraft {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub borrower: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub borrower: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.borrower.is_none()
            && self.due_date.is_none()
    }

    fn apply(self, book: &mut BookRecord) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = Some(author);
        }
        if let Some(borrower) = self.borrower {
            book.borrower = Some(borrower);
        }
        if let Some(due_date) = self.due_date {
            book.due_date = Some(due_date);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error("Book not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn next_book_id() -> BookId {
    BookId(Uuid::new_v4().to_string())
}

/// Create/read/update operations over the catalog repository.
pub struct CatalogService<R> {
    repository: Arc<R>,
}

impl<R> CatalogService<R>
where
    R: CatalogRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(&self, draft: BookDraft) -> Result<BookRecord, CatalogError> {
        if draft.title.trim().is_empty() {
            return Err(CatalogError::Validation("Book title is required".to_string()));
        }
        validate_due_date(draft.due_date.as_deref())?;

        let book = BookRecord {
            id: next_book_id(),
            title: draft.title,
            author: draft.author,
            borrower: draft.borrower,
            due_date: draft.due_date,
        };
        let stored = self.repository.insert(book)?;
        info!(book_id = %stored.id, on_loan = stored.as_active_loan().is_some(), "book added");
        Ok(stored)
    }

    pub fn list(&self) -> Result<Vec<BookRecord>, CatalogError> {
        Ok(self.repository.list()?)
    }

    pub fn get(&self, id: &str) -> Result<BookRecord, CatalogError> {
        let id = require_id(id)?;
        self.repository.fetch(&id)?.ok_or(CatalogError::NotFound)
    }

    pub fn update(&self, id: &str, patch: BookPatch) -> Result<BookRecord, CatalogError> {
        let id = require_id(id)?;
        if patch.is_empty() {
            return Err(CatalogError::Validation("No fields to update".to_string()));
        }
        if matches!(patch.title.as_deref(), Some(title) if title.trim().is_empty()) {
            return Err(CatalogError::Validation("Book title is required".to_string()));
        }
        validate_due_date(patch.due_date.as_deref())?;

        let mut book = self.repository.fetch(&id)?.ok_or(CatalogError::NotFound)?;
        patch.apply(&mut book);

        let stored = match self.repository.update(book) {
            Err(RepositoryError::NotFound) => return Err(CatalogError::NotFound),
            other => other?,
        };
        info!(book_id = %stored.id, on_loan = stored.as_active_loan().is_some(), "book updated");
        Ok(stored)
    }
}

fn require_id(id: &str) -> Result<BookId, CatalogError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CatalogError::Validation("Book ID is required".to_string()));
    }
    Ok(BookId(id.to_string()))
}

/// Blank values are allowed and mean "not on loan".
fn validate_due_date(due_date: Option<&str>) -> Result<(), CatalogError> {
    match non_blank(due_date) {
        Some(raw) if parse_due_date(raw).is_none() => Err(CatalogError::Validation(format!(
            "due_date '{raw}' must be a YYYY-MM-DD date"
        ))),
        _ => Ok(()),
    }
}

/// Exposes the books currently on loan from any catalog repository.
pub struct CatalogLoanSource<R> {
    repository: Arc<R>,
}

impl<R> CatalogLoanSource<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R> LoanSource for CatalogLoanSource<R>
where
    R: CatalogRepository,
{
    fn fetch_active_loans(&self) -> Result<Vec<LoanRecord>, SourceError> {
        let books = self
            .repository
            .list()
            .map_err(|err| SourceError::Unavailable(err.to_string()))?;
        Ok(books.iter().filter_map(BookRecord::as_active_loan).collect())
    }
}
