use crate::commands::{run_access_check, run_alert_job, AccessCheckArgs, AlertRunArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_watch::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Watch",
    about = "Serve the library catalog, gate writes, and run due-date alerts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Due-date alert job operations
    Alerts {
        #[command(subcommand)]
        command: AlertsCommand,
    },
    /// Inspect access gate decisions
    Access {
        #[command(subcommand)]
        command: AccessCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AlertsCommand {
    /// Run the due-date alert job once and print its response
    Run(AlertRunArgs),
}

#[derive(Subcommand, Debug)]
enum AccessCommand {
    /// Evaluate one request against the access gate
    Check(AccessCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON file of books to load into the catalog at startup
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Alerts {
            command: AlertsCommand::Run(args),
        } => run_alert_job(args),
        Command::Access {
            command: AccessCommand::Check(args),
        } => run_access_check(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["loan-watch-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn alerts_run_parses_today_and_seed() {
        let cli = Cli::try_parse_from([
            "loan-watch-api",
            "alerts",
            "run",
            "--today",
            "2025-10-15",
            "--seed",
            "books.json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Alerts {
                command: AlertsCommand::Run(args),
            }) => {
                assert_eq!(args.today, NaiveDate::from_ymd_opt(2025, 10, 15));
                assert_eq!(args.seed, Some(PathBuf::from("books.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn alerts_run_rejects_malformed_today() {
        let parsed = Cli::try_parse_from(["loan-watch-api", "alerts", "run", "--today", "15/10"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn access_check_requires_method() {
        assert!(Cli::try_parse_from(["loan-watch-api", "access", "check"]).is_err());
        let cli = Cli::try_parse_from([
            "loan-watch-api",
            "access",
            "check",
            "--method",
            "PUT",
            "--route-key",
            "PUT /books/{id}",
        ])
        .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Access {
                command: AccessCommand::Check(_)
            })
        ));
    }
}
