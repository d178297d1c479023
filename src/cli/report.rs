use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{report_source, require_session, PeriodArgs};
use crate::dashboard::{Dashboard, Outcome, FAILURE_NOTICE};
use crate::error::{DeskError, Result};
use crate::fmt::money;
use crate::models::{CashflowLineItem, ReportRequest};
use crate::settings::{load_settings, Settings};

fn amount_cell(amount: f64) -> Cell {
    let text = money(amount);
    let text = if amount < 0.0 {
        text.red().to_string()
    } else {
        text.green().to_string()
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Line items as a table with a total row.
pub fn render_items(items: &[CashflowLineItem]) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Account #"),
        Cell::new("Description"),
        Cell::new("Category"),
        Cell::new("Date"),
        Cell::new("Amount").set_alignment(CellAlignment::Right),
    ]);

    for item in items {
        table.add_row(vec![
            Cell::new(&item.account_number),
            Cell::new(&item.description),
            Cell::new(&item.category),
            Cell::new(item.date.format("%m/%d/%Y")),
            amount_cell(item.amount),
        ]);
    }

    let total: f64 = items.iter().map(|i| i.amount).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(money(total).bold()).set_alignment(CellAlignment::Right),
    ]);

    table.to_string()
}

/// Title, table and caption for one report.
pub fn render_report(request: &ReportRequest, items: &[CashflowLineItem]) -> String {
    format!(
        "{}\n{}\n{}",
        request.title().bold(),
        render_items(items),
        request.caption().dimmed()
    )
}

pub(crate) fn export_dir(settings: &Settings, output_dir: Option<String>) -> PathBuf {
    PathBuf::from(output_dir.unwrap_or_else(|| settings.export_dir.clone()))
}

/// Generate a report through the configured source; a failed fetch is
/// reported with the user-facing notice.
pub(crate) async fn fetch_report(
    settings: &Settings,
    request: ReportRequest,
) -> Result<Vec<CashflowLineItem>> {
    let dashboard = Dashboard::new(report_source(settings)?);
    eprintln!("{}", "Loading report data...".dimmed());
    match dashboard.generate(request).await {
        Outcome::Applied => Ok(dashboard.snapshot().items),
        Outcome::Failed | Outcome::Superseded => Err(DeskError::Other(FAILURE_NOTICE.to_string())),
    }
}

pub async fn run(period: PeriodArgs, export: bool, output_dir: Option<String>) -> Result<()> {
    let session = require_session()?;
    let settings = load_settings();
    let request = period.resolve()?;

    if let Some(name) = session.display_name() {
        println!("Welcome, {name}");
    }
    let items = fetch_report(&settings, request).await?;
    println!("{}", render_report(&request, &items));

    if export {
        #[cfg(feature = "xlsx")]
        {
            let dir = export_dir(&settings, output_dir);
            let path = crate::export::export_report(&request, &items, &dir)?;
            println!("Wrote {}", path.display());
        }
        #[cfg(not(feature = "xlsx"))]
        {
            let _ = output_dir;
            return Err(DeskError::Other(
                "spreadsheet export is not available in this build".to_string(),
            ));
        }
    }
    Ok(())
}
