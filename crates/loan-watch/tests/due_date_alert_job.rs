//! End-to-end behavior of the due-date alert job through its public facade:
//! scan, classify, aggregate, publish once, and answer in `{statusCode, body}` form.

mod common {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

    use loan_watch::config::AlertConfig;
    use loan_watch::workflows::loans::{
        AlertDispatcher, BookId, DeliveryId, DispatchError, DueDateAlertJob, LoanRecord,
        LoanSource, SourceError,
    };

    pub(super) fn loan(id: &str, title: &str, borrower: &str, due_date: &str) -> LoanRecord {
        LoanRecord {
            id: BookId(id.to_string()),
            title: title.to_string(),
            borrower: borrower.to_string(),
            due_date: due_date.to_string(),
        }
    }

    pub(super) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid date")
    }

    pub(super) fn checked_at() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(4 * 3600)
            .expect("valid offset")
            .with_ymd_and_hms(2025, 10, 15, 9, 0, 0)
            .single()
            .expect("unambiguous instant")
    }

    pub(super) struct StaticSource(pub(super) Result<Vec<LoanRecord>, String>);

    impl LoanSource for StaticSource {
        fn fetch_active_loans(&self) -> Result<Vec<LoanRecord>, SourceError> {
            self.0.clone().map_err(SourceError::Unavailable)
        }
    }

    #[derive(Default)]
    pub(super) struct RecordingDispatcher {
        pub(super) published: Mutex<Vec<(String, String)>>,
        pub(super) fail_with: Option<String>,
    }

    impl RecordingDispatcher {
        pub(super) fn failing(reason: &str) -> Self {
            Self {
                fail_with: Some(reason.to_string()),
                ..Self::default()
            }
        }

        pub(super) fn published(&self) -> Vec<(String, String)> {
            self.published.lock().expect("dispatcher mutex poisoned").clone()
        }
    }

    impl AlertDispatcher for RecordingDispatcher {
        fn publish(&self, subject: &str, body: &str) -> Result<DeliveryId, DispatchError> {
            if let Some(reason) = &self.fail_with {
                return Err(DispatchError::Unavailable(reason.clone()));
            }
            let mut guard = self.published.lock().expect("dispatcher mutex poisoned");
            guard.push((subject.to_string(), body.to_string()));
            Ok(DeliveryId(format!("msg-{}", guard.len())))
        }
    }

    pub(super) fn job(
        loans: Result<Vec<LoanRecord>, String>,
        dispatcher: Arc<RecordingDispatcher>,
    ) -> DueDateAlertJob<StaticSource, RecordingDispatcher> {
        DueDateAlertJob::new(
            Arc::new(StaticSource(loans)),
            dispatcher,
            AlertConfig::default(),
        )
    }
}

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::*;
use loan_watch::workflows::loans::{JobOutcome, JobResponse};

#[test]
fn no_active_loans_skips_dispatch() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let result = job(Ok(Vec::new()), dispatcher.clone()).run(today(), checked_at());

    let run = result.as_ref().expect("job succeeds");
    assert!(matches!(run.outcome, JobOutcome::NoActiveLoans));
    assert!(dispatcher.published().is_empty());

    let response = JobResponse::from(&result);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["message"], "No books are currently on loan");
}

#[test]
fn nothing_within_threshold_skips_dispatch() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let loans = vec![
        loan("b1", "Far Away", "Ana", "2025-10-25"),
        loan("b2", "Just Outside", "Beto", "2025-10-19"),
    ];
    let result = job(Ok(loans), dispatcher.clone()).run(today(), checked_at());

    let run = result.as_ref().expect("job succeeds");
    assert!(matches!(run.outcome, JobOutcome::NothingDue { scanned: 2 }));
    assert!(dispatcher.published().is_empty());

    let response = JobResponse::from(&result);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["message"], "No loans are due soon");
    assert_eq!(response.body["scanned"], 2);
}

#[test]
fn alertable_loans_are_published_once_in_priority_order() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let loans = vec![
        loan("b1", "Soon", "Ana", "2025-10-16"),
        loan("b2", "Late", "Beto", "2025-10-13"),
        loan("b3", "Today", "Cata", "2025-10-15"),
        loan("b4", "Edge", "Dani", "2025-10-18"),
        loan("b5", "Later", "Eli", "2025-10-25"),
    ];
    let result = job(Ok(loans), dispatcher.clone()).run(today(), checked_at());

    let published = dispatcher.published();
    assert_eq!(published.len(), 1);
    let (subject, body) = &published[0];
    assert_eq!(subject, "Loan alert: 4 books due or overdue");

    let late = body.find("\"Late\"").expect("overdue entry present");
    let today_entry = body.find("\"Today\"").expect("due-today entry present");
    let soon = body.find("\"Soon\"").expect("due-soon entry present");
    assert!(late < today_entry && today_entry < soon);
    assert!(body.contains("Overdue by 2 days (due 2025-10-13)"));
    assert!(body.contains("Due in 3 days"));
    assert!(!body.contains("\"Later\""));
    assert!(body.ends_with("Checked at: 2025-10-15 09:00:00 -04:00"));

    let response = JobResponse::from(&result);
    assert!(response.is_success());
    assert_eq!(response.body["notified"], 4);
    assert_eq!(response.body["counts"]["overdue"], 1);
    assert_eq!(response.body["counts"]["dueToday"], 1);
    assert_eq!(response.body["counts"]["dueSoon"], 2);
    assert_eq!(response.body["deliveryId"], "msg-1");
    assert!(response.body.get("delivery_id").is_none());
    let details = response.body["details"].as_array().expect("details listed");
    assert_eq!(details[0]["title"], "Late");
    assert_eq!(details[0]["daysRemaining"], -2);
    assert_eq!(details[0]["dueDate"], "2025-10-13");
    assert_eq!(details[0]["bucketLabel"], "Overdue");
}

#[test]
fn malformed_due_dates_never_reach_the_alert() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let loans = vec![
        loan("b1", "Broken", "Ana", "someday"),
        loan("b2", "Due", "Beto", "2025-10-15"),
    ];
    let result = job(Ok(loans), dispatcher.clone()).run(today(), checked_at());

    match &result.as_ref().expect("job succeeds").outcome {
        JobOutcome::Dispatched { scanned, report, .. } => {
            assert_eq!(*scanned, 2);
            assert_eq!(report.total, 1);
        }
        other => panic!("expected dispatch, got {other:?}"),
    }
    let published = dispatcher.published();
    assert!(!published[0].1.contains("Broken"));
    assert_eq!(published[0].0, "Loan alert: 1 book due or overdue");
}

#[test]
fn source_failure_maps_to_server_error() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let result = job(Err("scan throttled".to_string()), dispatcher.clone())
        .run(today(), checked_at());

    assert!(result.is_err());
    assert!(dispatcher.published().is_empty());
    let response = JobResponse::from(&result);
    assert_eq!(response.status_code, 500);
    assert_eq!(response.body["message"], "Failed to process due-date alerts");
    assert!(response.body["error"]
        .as_str()
        .expect("error text")
        .contains("scan throttled"));
}

#[test]
fn dispatch_failure_maps_to_server_error() {
    let dispatcher = Arc::new(RecordingDispatcher::failing("topic missing"));
    let loans = vec![loan("b1", "Due", "Ana", "2025-10-15")];
    let result = job(Ok(loans), dispatcher).run(today(), checked_at());

    let response = JobResponse::from(&result);
    assert_eq!(response.status_code, 500);
    assert!(response.body["error"]
        .as_str()
        .expect("error text")
        .contains("topic missing"));
}

#[test]
fn run_at_uses_reference_offset_for_today() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let loans = vec![loan("b1", "Due", "Ana", "2025-10-15")];
    // 02:30 UTC on the 16th is still the 15th at -04:00.
    let now = Utc
        .with_ymd_and_hms(2025, 10, 16, 2, 30, 0)
        .single()
        .expect("unambiguous instant");

    let run = job(Ok(loans), dispatcher.clone())
        .run_at(now)
        .expect("job succeeds");

    assert_eq!(run.today, today());
    match run.outcome {
        JobOutcome::Dispatched { report, .. } => assert_eq!(report.due_today.len(), 1),
        other => panic!("expected dispatch, got {other:?}"),
    }
    assert!(dispatcher.published()[0]
        .1
        .ends_with("Checked at: 2025-10-15 22:30:00 -04:00"));
}
