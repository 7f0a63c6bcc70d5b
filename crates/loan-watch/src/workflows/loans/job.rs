use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::classify::DueDateClassifier;
use super::report::{aggregate, AlertMessage, AlertReport};
use super::repository::{AlertDispatcher, DeliveryId, DispatchError, LoanSource, SourceError};
use crate::config::AlertConfig;

/// Job wired with type-erased collaborators, as the HTTP and CLI hosts use it.
pub type SharedAlertJob = DueDateAlertJob<dyn LoanSource, dyn AlertDispatcher>;

/// Scheduled scan that classifies active loans and publishes one aggregated alert.
pub struct DueDateAlertJob<S: ?Sized, D: ?Sized> {
    source: Arc<S>,
    dispatcher: Arc<D>,
    config: AlertConfig,
}

#[derive(Debug)]
pub struct JobRun {
    pub today: NaiveDate,
    pub checked_at: DateTime<FixedOffset>,
    pub outcome: JobOutcome,
}

#[derive(Debug)]
pub enum JobOutcome {
    NoActiveLoans,
    NothingDue {
        scanned: usize,
    },
    Dispatched {
        scanned: usize,
        report: AlertReport,
        message: AlertMessage,
        delivery_id: DeliveryId,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl<S, D> DueDateAlertJob<S, D>
where
    S: LoanSource + ?Sized,
    D: AlertDispatcher + ?Sized,
{
    pub fn new(source: Arc<S>, dispatcher: Arc<D>, config: AlertConfig) -> Self {
        Self {
            source,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Runs with "today" taken from `now` in the reference offset.
    pub fn run_at(&self, now: DateTime<Utc>) -> Result<JobRun, JobError> {
        let checked_at = now.with_timezone(&self.config.reference_offset);
        self.run(checked_at.date_naive(), checked_at)
    }

    pub fn run(
        &self,
        today: NaiveDate,
        checked_at: DateTime<FixedOffset>,
    ) -> Result<JobRun, JobError> {
        info!(%today, topic = %self.config.topic, "checking loans for due-date alerts");

        let loans = self.source.fetch_active_loans().map_err(|err| {
            error!(error = %err, "loan scan failed");
            err
        })?;

        if loans.is_empty() {
            info!("no books are currently on loan");
            return Ok(JobRun {
                today,
                checked_at,
                outcome: JobOutcome::NoActiveLoans,
            });
        }

        let scanned = loans.len();
        let classifier = DueDateClassifier::new(today, self.config.threshold_days);
        let report = match aggregate(classifier.classify_all(loans)) {
            Some(report) => report,
            None => {
                info!(scanned, "no loans are due soon");
                return Ok(JobRun {
                    today,
                    checked_at,
                    outcome: JobOutcome::NothingDue { scanned },
                });
            }
        };

        let message = report.message(checked_at);
        let delivery_id = self
            .dispatcher
            .publish(&message.subject, &message.body)
            .map_err(|err| {
                error!(error = %err, alerts = report.total, "due-date alert dispatch failed");
                err
            })?;

        info!(
            scanned,
            overdue = report.overdue.len(),
            due_today = report.due_today.len(),
            due_soon = report.due_soon.len(),
            delivery_id = %delivery_id.0,
            "due-date alert dispatched"
        );

        Ok(JobRun {
            today,
            checked_at,
            outcome: JobOutcome::Dispatched {
                scanned,
                report,
                message,
                delivery_id,
            },
        })
    }
}

/// Invocation result in the `{statusCode, body}` shape schedulers expect.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub status_code: u16,
    pub body: Value,
}

impl JobResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl From<&JobRun> for JobResponse {
    fn from(run: &JobRun) -> Self {
        let body = match &run.outcome {
            JobOutcome::NoActiveLoans => json!({
                "message": "No books are currently on loan",
                "today": run.today,
            }),
            JobOutcome::NothingDue { scanned } => json!({
                "message": "No loans are due soon",
                "today": run.today,
                "scanned": scanned,
            }),
            JobOutcome::Dispatched {
                scanned,
                report,
                message,
                delivery_id,
            } => json!({
                "message": "Due-date alert dispatched",
                "today": run.today,
                "scanned": scanned,
                "notified": report.total,
                "counts": report.counts(),
                "subject": message.subject,
                "deliveryId": delivery_id,
                "details": report.views(),
            }),
        };

        Self {
            status_code: 200,
            body,
        }
    }
}

impl From<&JobError> for JobResponse {
    fn from(err: &JobError) -> Self {
        Self {
            status_code: 500,
            body: json!({
                "message": "Failed to process due-date alerts",
                "error": err.to_string(),
            }),
        }
    }
}

impl From<&Result<JobRun, JobError>> for JobResponse {
    fn from(result: &Result<JobRun, JobError>) -> Self {
        match result {
            Ok(run) => run.into(),
            Err(err) => err.into(),
        }
    }
}
