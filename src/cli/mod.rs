pub mod chat;
pub mod config;
#[cfg(feature = "xlsx")]
pub mod export;
pub mod login;
pub mod report;

use std::sync::Arc;

use chrono::Datelike;
use clap::{Args, Parser, Subcommand};

use crate::assistant::{CannedResponder, RemoteResponder, Responder};
use crate::error::Result;
use crate::models::{ReportRequest, ReportType};
use crate::session::{Session, SessionStore};
use crate::settings::{Mode, Settings};
use crate::source::{MockSource, RemoteSource, ReportSource};

#[derive(Parser)]
#[command(
    name = "cashdesk",
    version,
    about = "Cash-flow reporting dashboard with a chat assistant.",
    long_about = "Cash-flow reporting dashboard with a chat assistant.\n\n\
                  Run without a subcommand to open the chat assistant."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in (simulated development login).
    Login {
        /// Display name (default: Test User)
        #[arg(long)]
        name: Option<String>,
        /// Email address (default: test@example.com)
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out and forget the stored profile.
    Logout,
    /// Show who is signed in.
    Whoami,
    /// Show or change settings.
    Config {
        /// Data source: mock or remote
        #[arg(long)]
        mode: Option<Mode>,
        /// Base URL of the reporting service
        #[arg(long = "api-url")]
        api_url: Option<String>,
        /// Default directory for spreadsheet exports
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
    },
    /// Generate a cash-flow report and print it as a table.
    Report {
        #[command(flatten)]
        period: PeriodArgs,
        /// Also write the report to a spreadsheet
        #[arg(long)]
        export: bool,
        /// Directory for the spreadsheet (default: configured export dir)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
    /// Generate a report and write it to {TYPE}_Cashflow_{YEAR}_{MONTH}.xlsx.
    #[cfg(feature = "xlsx")]
    Export {
        #[command(flatten)]
        period: PeriodArgs,
        /// Output directory (default: configured export dir)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
    /// Print a previously exported spreadsheet as a table.
    #[cfg(feature = "xlsx")]
    View {
        /// Path to an exported .xlsx file
        file: String,
    },
    /// Chat with the assistant ("Generate AP report for January 2023").
    Chat,
}

/// Report type and period; year and month default to today.
#[derive(Args, Debug, Clone)]
pub struct PeriodArgs {
    /// Report type: AP (Accounts Payable) or GL (General Ledger)
    #[arg(long = "type", short = 't', default_value = "AP")]
    pub report_type: ReportType,
    /// Calendar year, e.g. 2024
    #[arg(long)]
    pub year: Option<i32>,
    /// Month number 1-12
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

impl PeriodArgs {
    pub fn resolve(&self) -> Result<ReportRequest> {
        let today = chrono::Local::now().date_naive();
        ReportRequest::new(
            self.report_type,
            self.year.unwrap_or_else(|| today.year()),
            self.month.unwrap_or_else(|| today.month()),
        )
    }
}

/// Load the stored session, failing unless signed in.
pub(crate) fn require_session() -> Result<Session> {
    let session = SessionStore::default_location().load();
    session.require()?;
    Ok(session)
}

/// Fixed seed for mock data, for reproducible output.
pub const MOCK_SEED_ENV: &str = "CASHDESK_MOCK_SEED";

pub(crate) fn report_source(settings: &Settings) -> Result<Arc<dyn ReportSource>> {
    Ok(match settings.mode {
        Mode::Mock => match std::env::var(MOCK_SEED_ENV).ok().and_then(|s| s.parse().ok()) {
            Some(seed) => Arc::new(MockSource::seeded(seed)),
            None => Arc::new(MockSource::new()),
        },
        Mode::Remote => Arc::new(RemoteSource::new(&settings.api_url)?),
    })
}

pub(crate) fn responder(settings: &Settings) -> Result<Arc<dyn Responder>> {
    Ok(match settings.mode {
        Mode::Mock => Arc::new(CannedResponder::new()),
        Mode::Remote => Arc::new(RemoteResponder::new(&settings.api_url)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_report() {
        let cli = Cli::try_parse_from([
            "cashdesk", "report", "--type", "gl", "--year", "2024", "--month", "3",
        ])
        .unwrap();
        let Some(Commands::Report { period, export, .. }) = cli.command else {
            panic!("expected report command");
        };
        assert!(!export);
        let req = period.resolve().unwrap();
        assert_eq!(req, ReportRequest::new(ReportType::Gl, 2024, 3).unwrap());
    }

    #[test]
    fn test_cli_rejects_month_out_of_range() {
        assert!(Cli::try_parse_from(["cashdesk", "report", "--month", "13"]).is_err());
        assert!(Cli::try_parse_from(["cashdesk", "report", "--type", "xx"]).is_err());
    }

    #[test]
    fn test_period_defaults_to_today() {
        let args = PeriodArgs {
            report_type: ReportType::Ap,
            year: None,
            month: None,
        };
        let today = chrono::Local::now().date_naive();
        let req = args.resolve().unwrap();
        assert_eq!(req.year, today.year());
        assert_eq!(req.month, today.month());
    }

    #[test]
    fn test_no_subcommand_is_chat() {
        let cli = Cli::try_parse_from(["cashdesk"]).unwrap();
        assert!(cli.command.is_none());
    }
}
