use super::super::domain::{ClassifiedLoan, DueBucket};
use super::summary::AlertReport;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt::Write as _;

const RULE: &str = "================================";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Subject and body handed to the alert dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

impl AlertReport {
    pub fn subject(&self) -> String {
        format!(
            "Loan alert: {} book{} due or overdue",
            self.total,
            if self.total == 1 { "" } else { "s" }
        )
    }

    pub fn message(&self, checked_at: DateTime<FixedOffset>) -> AlertMessage {
        AlertMessage {
            subject: self.subject(),
            body: compose(self, checked_at),
        }
    }
}

/// Renders the alert body. `checked_at` is printed in its own offset, so pass
/// it already converted to the reference offset.
pub fn compose(report: &AlertReport, checked_at: DateTime<FixedOffset>) -> String {
    let mut content = String::new();
    writeln!(&mut content, "LOAN DUE-DATE ALERT").expect("write title");
    writeln!(&mut content, "{RULE}").expect("write rule");
    content.push('\n');

    for bucket in DueBucket::alertable() {
        let loans = report.group(bucket);
        if loans.is_empty() {
            continue;
        }

        writeln!(&mut content, "{}:", section_heading(bucket)).expect("write heading");
        for loan in loans {
            write_entry(&mut content, loan);
        }
    }

    writeln!(&mut content, "{RULE}").expect("write rule");
    writeln!(&mut content, "Total loans on alert: {}", report.total).expect("write total");
    write!(
        &mut content,
        "Checked at: {}",
        checked_at.format(TIMESTAMP_FORMAT)
    )
    .expect("write timestamp");

    content
}

fn section_heading(bucket: DueBucket) -> &'static str {
    match bucket {
        DueBucket::Overdue => "OVERDUE",
        DueBucket::DueToday => "DUE TODAY",
        DueBucket::DueSoon => "DUE SOON",
        DueBucket::NotAlertable => "NOT ALERTABLE",
    }
}

fn write_entry(content: &mut String, loan: &ClassifiedLoan) {
    writeln!(
        content,
        "• \"{}\" - Borrowed by: {}",
        loan.record.title, loan.record.borrower
    )
    .expect("write entry");

    let status = match loan.bucket {
        DueBucket::Overdue => format!("Overdue by {}", pluralize_days(loan.days_remaining.abs())),
        DueBucket::DueToday => "Due today".to_string(),
        DueBucket::DueSoon | DueBucket::NotAlertable => {
            format!("Due in {}", pluralize_days(loan.days_remaining))
        }
    };
    writeln!(content, "  {} (due {})", status, loan.due_on).expect("write status");
    content.push('\n');
}

pub fn pluralize_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}
