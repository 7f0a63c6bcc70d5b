use crate::infra::{InMemoryCatalog, LogDispatcher};
use chrono::{NaiveDate, Utc};
use clap::Args;
use loan_watch::config::AppConfig;
use loan_watch::error::AppError;
use loan_watch::telemetry;
use loan_watch::workflows::access::{
    AccessDecision, AccessGate, AuthorizerRequest, GatewayHttp, GatewayRequestContext,
    StaticTokenVerifier,
};
use loan_watch::workflows::loans::{
    AlertDispatcher, CatalogLoanSource, DueDateAlertJob, JobOutcome, JobResponse, JobRun,
    LoanSource, SharedAlertJob,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct AlertRunArgs {
    /// Evaluate as of this date (YYYY-MM-DD) instead of today in the reference offset
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// JSON file of books to load into the catalog before the scan
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct AccessCheckArgs {
    /// Request method to evaluate
    #[arg(long)]
    pub(crate) method: String,
    /// Gateway route key, e.g. "PUT /books/{id}"
    #[arg(long)]
    pub(crate) route_key: Option<String>,
    /// Raw request path
    #[arg(long)]
    pub(crate) path: Option<String>,
    /// Credential presented with the request
    #[arg(long)]
    pub(crate) token: Option<String>,
}

pub(crate) fn run_alert_job(args: AlertRunArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let catalog = Arc::new(InMemoryCatalog::named(config.catalog.table.clone()));
    if let Some(seed) = args.seed.as_deref() {
        catalog.seed_from_path(seed)?;
    }

    let job = build_alert_job(&config, catalog);
    let now = Utc::now();
    let result = match args.today {
        Some(today) => job.run(today, now.with_timezone(&job.config().reference_offset)),
        None => job.run_at(now),
    };

    if let Ok(run) = &result {
        print!("{}", render_run(run));
    }
    let response = JobResponse::from(&result);
    let json = serde_json::to_string_pretty(&response)
        .map_err(|err| AppError::Input(format!("failed to render job response: {err}")))?;
    println!("{json}");

    result.map(|_| ()).map_err(AppError::from)
}

pub(crate) fn build_alert_job(config: &AppConfig, catalog: Arc<InMemoryCatalog>) -> SharedAlertJob {
    let source: Arc<dyn LoanSource> = Arc::new(CatalogLoanSource::new(catalog));
    let dispatcher: Arc<dyn AlertDispatcher> =
        Arc::new(LogDispatcher::new(config.alerts.topic.clone()));
    DueDateAlertJob::new(source, dispatcher, config.alerts.clone())
}

fn render_run(run: &JobRun) -> String {
    let mut output = String::new();
    writeln!(
        &mut output,
        "Due-date scan for {} (checked at {})",
        run.today,
        run.checked_at.format("%Y-%m-%d %H:%M:%S %:z")
    )
    .expect("write header");

    match &run.outcome {
        JobOutcome::NoActiveLoans => {
            writeln!(&mut output, "No books are currently on loan.").expect("write outcome");
        }
        JobOutcome::NothingDue { scanned } => {
            writeln!(
                &mut output,
                "Scanned {scanned} loan(s); none due within the alert window."
            )
            .expect("write outcome");
        }
        JobOutcome::Dispatched {
            scanned,
            message,
            delivery_id,
            ..
        } => {
            writeln!(
                &mut output,
                "Scanned {scanned} loan(s); published {} as {}",
                message.subject, delivery_id.0
            )
            .expect("write outcome");
            writeln!(&mut output).expect("write spacer");
            writeln!(&mut output, "{}", message.body).expect("write alert body");
        }
    }
    writeln!(&mut output).expect("write spacer");
    output
}

pub(crate) fn run_access_check(args: AccessCheckArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let gate = AccessGate::new(Arc::new(StaticTokenVerifier::new(
        config.access.admin_token.clone(),
    )));

    let decision = gate.evaluate(&authorizer_request(args));
    print!("{}", render_decision(&decision));
    let json = serde_json::to_string_pretty(&decision)
        .map_err(|err| AppError::Input(format!("failed to render decision: {err}")))?;
    println!("{json}");
    Ok(())
}

fn authorizer_request(args: AccessCheckArgs) -> AuthorizerRequest {
    AuthorizerRequest {
        route_key: args.route_key,
        identity_source: args.token.map(|token| vec![token]),
        request_context: Some(GatewayRequestContext {
            http: Some(GatewayHttp {
                method: Some(args.method),
                path: args.path,
            }),
        }),
        ..AuthorizerRequest::default()
    }
}

fn render_decision(decision: &AccessDecision) -> String {
    let mut output = String::new();
    let verdict = if decision.authorized {
        "ALLOW"
    } else {
        "DENY"
    };
    writeln!(
        &mut output,
        "{verdict} as {}: {}",
        decision.role().label(),
        decision.reason()
    )
    .expect("write verdict");
    if let Some(error) = &decision.context.error {
        writeln!(&mut output, "evaluation fault: {error}").expect("write fault");
    }
    output
}
