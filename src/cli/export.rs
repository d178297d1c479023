use std::path::Path;

use colored::Colorize;

use crate::cli::report::{export_dir, fetch_report, render_items};
use crate::cli::{require_session, PeriodArgs};
use crate::error::Result;
use crate::export::{export_report, read_report};
use crate::settings::load_settings;

pub async fn run(period: PeriodArgs, output_dir: Option<String>) -> Result<()> {
    require_session()?;
    let settings = load_settings();
    let request = period.resolve()?;

    let items = fetch_report(&settings, request).await?;
    let path = export_report(&request, &items, &export_dir(&settings, output_dir))?;
    println!("Wrote {} ({} rows)", path.display(), items.len());
    Ok(())
}

pub fn view(file: &str) -> Result<()> {
    let path = Path::new(file);
    let items = read_report(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());
    println!("{}\n{}", name.bold(), render_items(&items));
    Ok(())
}
