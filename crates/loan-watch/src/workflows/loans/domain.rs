use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for catalog books.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A book currently lent out, as handed over by the record source.
///
/// `due_date` stays in its stored textual form; parsing happens during
/// classification so a malformed value only ever drops its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: BookId,
    pub title: String,
    pub borrower: String,
    pub due_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueBucket {
    Overdue,
    DueToday,
    DueSoon,
    NotAlertable,
}

impl DueBucket {
    /// Alertable buckets in report priority order.
    pub const fn alertable() -> [Self; 3] {
        [Self::Overdue, Self::DueToday, Self::DueSoon]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Overdue => "Overdue",
            Self::DueToday => "Due today",
            Self::DueSoon => "Due soon",
            Self::NotAlertable => "Not alertable",
        }
    }

    pub const fn is_alertable(self) -> bool {
        !matches!(self, Self::NotAlertable)
    }

    pub fn for_offset(days_remaining: i64, threshold_days: i64) -> Self {
        match days_remaining {
            d if d < 0 => Self::Overdue,
            0 => Self::DueToday,
            d if d <= threshold_days => Self::DueSoon,
            _ => Self::NotAlertable,
        }
    }
}

/// A loan annotated with its distance to the due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedLoan {
    #[serde(flatten)]
    pub record: LoanRecord,
    pub due_on: NaiveDate,
    pub days_remaining: i64,
    pub bucket: DueBucket,
}

/// A loan whose due date could not be read as a civil date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("loan {id} has an unreadable due date '{raw}'")]
pub struct MalformedRecord {
    pub id: BookId,
    pub raw: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_map_to_buckets() {
        assert_eq!(DueBucket::for_offset(-30, 3), DueBucket::Overdue);
        assert_eq!(DueBucket::for_offset(-1, 3), DueBucket::Overdue);
        assert_eq!(DueBucket::for_offset(0, 3), DueBucket::DueToday);
        assert_eq!(DueBucket::for_offset(1, 3), DueBucket::DueSoon);
        assert_eq!(DueBucket::for_offset(3, 3), DueBucket::DueSoon);
        assert_eq!(DueBucket::for_offset(4, 3), DueBucket::NotAlertable);
    }

    #[test]
    fn zero_threshold_leaves_only_today_and_overdue() {
        assert_eq!(DueBucket::for_offset(1, 0), DueBucket::NotAlertable);
        assert_eq!(DueBucket::for_offset(0, 0), DueBucket::DueToday);
    }
}
