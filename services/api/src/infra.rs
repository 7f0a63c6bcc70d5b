use chrono::NaiveDate;
use loan_watch::error::AppError;
use loan_watch::workflows::loans::{
    AlertDispatcher, BookId, BookRecord, CatalogRepository, DeliveryId, DispatchError,
    RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local book table, keyed by id.
#[derive(Clone)]
pub(crate) struct InMemoryCatalog {
    table: String,
    books: Arc<Mutex<BTreeMap<BookId, BookRecord>>>,
}

impl InMemoryCatalog {
    pub(crate) fn named(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            books: Arc::default(),
        }
    }

    pub(crate) fn seed(&self, books: Vec<BookRecord>) -> Result<usize, RepositoryError> {
        let mut guard = self.guard()?;
        let count = books.len();
        for book in books {
            guard.insert(book.id.clone(), book);
        }
        Ok(count)
    }

    /// Loads a JSON array of books, replacing entries with the same id.
    pub(crate) fn seed_from_path(&self, path: &Path) -> Result<usize, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let books: Vec<BookRecord> = serde_json::from_str(&raw).map_err(|err| {
            AppError::Input(format!("failed to parse seed file {}: {err}", path.display()))
        })?;
        let count = self
            .seed(books)
            .map_err(|err| AppError::Input(err.to_string()))?;
        info!(table = %self.table, count, seed = %path.display(), "catalog seeded");
        Ok(count)
    }

    fn guard(&self) -> Result<MutexGuard<'_, BTreeMap<BookId, BookRecord>>, RepositoryError> {
        self.books
            .lock()
            .map_err(|_| RepositoryError::Unavailable(format!("table '{}' lock poisoned", self.table)))
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn insert(&self, book: BookRecord) -> Result<BookRecord, RepositoryError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&book.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(book.id.clone(), book.clone());
        Ok(book)
    }

    fn update(&self, book: BookRecord) -> Result<BookRecord, RepositoryError> {
        let mut guard = self.guard()?;
        match guard.get_mut(&book.id) {
            Some(slot) => {
                *slot = book.clone();
                Ok(book)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &BookId) -> Result<Option<BookRecord>, RepositoryError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<BookRecord>, RepositoryError> {
        Ok(self.guard()?.values().cloned().collect())
    }
}

/// Dispatcher that writes each alert to the log stream under its topic.
pub(crate) struct LogDispatcher {
    topic: String,
    sequence: AtomicU64,
}

impl LogDispatcher {
    pub(crate) fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            sequence: AtomicU64::new(1),
        }
    }
}

impl AlertDispatcher for LogDispatcher {
    fn publish(&self, subject: &str, body: &str) -> Result<DeliveryId, DispatchError> {
        if self.topic.trim().is_empty() {
            return Err(DispatchError::Unavailable(
                "no alert topic configured".to_string(),
            ));
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let delivery_id = DeliveryId(format!("{}:{sequence}", self.topic));
        info!(
            topic = %self.topic,
            delivery_id = %delivery_id.0,
            subject,
            body,
            "alert published"
        );
        Ok(delivery_id)
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, borrower: Option<&str>) -> BookRecord {
        BookRecord {
            id: BookId(id.to_string()),
            title: format!("Title {id}"),
            author: None,
            borrower: borrower.map(str::to_string),
            due_date: borrower.map(|_| "2025-10-15".to_string()),
        }
    }

    #[test]
    fn catalog_rejects_duplicate_inserts_and_unknown_updates() {
        let catalog = InMemoryCatalog::named("books");
        catalog.insert(book("b1", None)).expect("inserted");
        assert!(matches!(
            catalog.insert(book("b1", None)),
            Err(RepositoryError::Conflict)
        ));
        assert!(matches!(
            catalog.update(book("b2", None)),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn seed_from_path_loads_json_books() {
        let path = std::env::temp_dir().join(format!(
            "loan-watch-seed-{}.json",
            std::process::id()
        ));
        let payload = serde_json::to_string(&vec![book("b1", Some("Ana")), book("b2", None)])
            .expect("serializes");
        std::fs::write(&path, payload).expect("seed written");

        let catalog = InMemoryCatalog::named("books");
        let loaded = catalog.seed_from_path(&path).expect("seed loads");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, 2);
        let stored = catalog.fetch(&BookId("b1".to_string())).expect("fetch");
        assert_eq!(stored.and_then(|b| b.borrower).as_deref(), Some("Ana"));
    }

    #[test]
    fn seed_from_path_reports_malformed_json() {
        let path = std::env::temp_dir().join(format!(
            "loan-watch-bad-seed-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").expect("seed written");

        let result = InMemoryCatalog::named("books").seed_from_path(&path);
        std::fs::remove_file(&path).ok();

        match result {
            Err(AppError::Input(message)) => assert!(message.contains("failed to parse seed file")),
            other => panic!("expected input error, got {other:?}"),
        }
    }

    #[test]
    fn log_dispatcher_numbers_deliveries_per_topic() {
        let dispatcher = LogDispatcher::new("loan-due-alerts");
        let first = dispatcher.publish("subject", "body").expect("published");
        let second = dispatcher.publish("subject", "body").expect("published");
        assert_eq!(first.0, "loan-due-alerts:1");
        assert_eq!(second.0, "loan-due-alerts:2");
    }

    #[test]
    fn log_dispatcher_without_topic_is_unavailable() {
        let dispatcher = LogDispatcher::new(" ");
        assert!(matches!(
            dispatcher.publish("subject", "body"),
            Err(DispatchError::Unavailable(_))
        ));
    }

    #[test]
    fn parse_date_reports_the_raw_value() {
        assert_eq!(
            parse_date(" 2025-10-15 "),
            Ok(NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid"))
        );
        assert!(parse_date("15/10/2025")
            .expect_err("rejected")
            .contains("15/10/2025"));
    }
}
