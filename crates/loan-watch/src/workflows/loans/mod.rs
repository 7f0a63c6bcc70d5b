//! Book loans: the catalog, due-date classification, and the alert job that
//! publishes one aggregated notice per run.

pub mod catalog;
mod classify;
pub mod domain;
pub mod job;
pub mod report;
pub mod repository;
pub mod router;

pub use catalog::{
    BookDraft, BookPatch, BookRecord, CatalogError, CatalogLoanSource, CatalogService,
};
pub use classify::{parse_due_date, DueDateClassifier};
pub use domain::{BookId, ClassifiedLoan, DueBucket, LoanRecord, MalformedRecord};
pub use job::{DueDateAlertJob, JobError, JobOutcome, JobResponse, JobRun, SharedAlertJob};
pub use report::{aggregate, compose, AlertMessage, AlertReport};
pub use repository::{
    AlertDispatcher, CatalogRepository, DeliveryId, DispatchError, LoanSource, RepositoryError,
    SourceError,
};
pub use router::loan_router;
