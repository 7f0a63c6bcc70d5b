use super::super::domain::{ClassifiedLoan, DueBucket};
use super::views::{BucketCounts, LoanAlertView};

/// Alertable loans grouped by urgency, each group in record-source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertReport {
    pub overdue: Vec<ClassifiedLoan>,
    pub due_today: Vec<ClassifiedLoan>,
    pub due_soon: Vec<ClassifiedLoan>,
    pub total: usize,
}

impl AlertReport {
    pub fn group(&self, bucket: DueBucket) -> &[ClassifiedLoan] {
        match bucket {
            DueBucket::Overdue => &self.overdue,
            DueBucket::DueToday => &self.due_today,
            DueBucket::DueSoon => &self.due_soon,
            DueBucket::NotAlertable => &[],
        }
    }

    /// Every alertable loan, overdue first, then due today, then due soon.
    pub fn loans(&self) -> impl Iterator<Item = &ClassifiedLoan> {
        DueBucket::alertable()
            .into_iter()
            .flat_map(move |bucket| self.group(bucket).iter())
    }

    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            overdue: self.overdue.len(),
            due_today: self.due_today.len(),
            due_soon: self.due_soon.len(),
            total: self.total,
        }
    }

    pub fn views(&self) -> Vec<LoanAlertView> {
        self.loans().map(LoanAlertView::from).collect()
    }
}

/// Keeps the alertable loans and partitions them by bucket.
///
/// Returns `None` when nothing is alertable so callers can skip dispatch.
pub fn aggregate<I>(classified: I) -> Option<AlertReport>
where
    I: IntoIterator<Item = ClassifiedLoan>,
{
    let mut report = AlertReport::default();

    for loan in classified {
        match loan.bucket {
            DueBucket::Overdue => report.overdue.push(loan),
            DueBucket::DueToday => report.due_today.push(loan),
            DueBucket::DueSoon => report.due_soon.push(loan),
            DueBucket::NotAlertable => continue,
        }
        report.total += 1;
    }

    if report.total == 0 {
        None
    } else {
        Some(report)
    }
}
