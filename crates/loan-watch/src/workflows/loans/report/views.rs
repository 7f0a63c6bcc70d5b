use super::super::domain::{BookId, ClassifiedLoan, DueBucket};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanAlertView {
    pub id: BookId,
    pub title: String,
    pub borrower: String,
    pub due_date: NaiveDate,
    pub days_remaining: i64,
    pub bucket: DueBucket,
    pub bucket_label: &'static str,
}

impl From<&ClassifiedLoan> for LoanAlertView {
    fn from(loan: &ClassifiedLoan) -> Self {
        Self {
            id: loan.record.id.clone(),
            title: loan.record.title.clone(),
            borrower: loan.record.borrower.clone(),
            due_date: loan.due_on,
            days_remaining: loan.days_remaining,
            bucket: loan.bucket,
            bucket_label: loan.bucket.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub overdue: usize,
    pub due_today: usize,
    pub due_soon: usize,
    pub total: usize,
}
