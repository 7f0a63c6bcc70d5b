use super::domain::{ClassifiedLoan, DueBucket, LoanRecord, MalformedRecord};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::warn;

/// Buckets loans by whole civil days between `today` and their due date.
#[derive(Debug, Clone, Copy)]
pub struct DueDateClassifier {
    today: NaiveDate,
    threshold_days: i64,
}

impl DueDateClassifier {
    pub fn new(today: NaiveDate, threshold_days: i64) -> Self {
        Self {
            today,
            threshold_days,
        }
    }

    /// Resolves "today" as the civil date of `now` in the reference offset.
    pub fn at_instant(now: DateTime<Utc>, reference: FixedOffset, threshold_days: i64) -> Self {
        Self::new(now.with_timezone(&reference).date_naive(), threshold_days)
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn threshold_days(&self) -> i64 {
        self.threshold_days
    }

    pub fn classify(&self, record: LoanRecord) -> Result<ClassifiedLoan, MalformedRecord> {
        let due_on = match parse_due_date(&record.due_date) {
            Some(date) => date,
            None => {
                return Err(MalformedRecord {
                    raw: record.due_date,
                    id: record.id,
                })
            }
        };

        let days_remaining = (due_on - self.today).num_days();
        Ok(ClassifiedLoan {
            bucket: DueBucket::for_offset(days_remaining, self.threshold_days),
            record,
            due_on,
            days_remaining,
        })
    }

    /// Classifies a batch in input order, skipping records with unreadable due dates.
    pub fn classify_all<I>(&self, records: I) -> Vec<ClassifiedLoan>
    where
        I: IntoIterator<Item = LoanRecord>,
    {
        records
            .into_iter()
            .filter_map(|record| match self.classify(record) {
                Ok(classified) => Some(classified),
                Err(err) => {
                    warn!(book_id = %err.id, raw = %err.raw, "skipping loan with malformed due date");
                    None
                }
            })
            .collect()
    }
}

/// Reads `YYYY-MM-DD`; a trailing `T...` time part is ignored.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = match trimmed.split_once('T') {
        Some((date, _)) => date,
        None => trimmed,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
