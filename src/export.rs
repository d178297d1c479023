//! Spreadsheet export of a report, and reading an export back.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Color, Format, Workbook};

use crate::error::{DeskError, Result};
use crate::models::{parse_calendar_date, round_cents, CashflowLineItem, ReportRequest};

pub const SHEET_NAME: &str = "Cashflow";
pub const HEADERS: [&str; 6] = ["id", "accountNumber", "description", "amount", "date", "category"];

const HEADER_FILL: u32 = 0xEFEFEF;
const COLUMN_WIDTHS: [f64; 6] = [10.0, 16.0, 24.0, 14.0, 12.0, 18.0];

/// `AP_Cashflow_2023_1.xlsx`
pub fn export_filename(request: &ReportRequest) -> String {
    format!(
        "{}_Cashflow_{}_{}.xlsx",
        request.report_type, request.year, request.month
    )
}

pub fn write_report(items: &[CashflowLineItem], path: &Path) -> Result<()> {
    let header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL));
    let currency = Format::new().set_num_format("$#,##0.00");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (name, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *name, &header)?;
        sheet.set_column_width(col, width)?;
    }

    for (idx, item) in items.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_string(row, 0, &item.id)?;
        sheet.write_string(row, 1, &item.account_number)?;
        sheet.write_string(row, 2, &item.description)?;
        sheet.write_number_with_format(row, 3, item.amount, &currency)?;
        sheet.write_string(row, 4, item.date.format("%Y-%m-%d").to_string())?;
        sheet.write_string(row, 5, &item.category)?;
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    workbook.save(path)?;
    Ok(())
}

/// Write the report into `dir` under its standard file name.
pub fn export_report(
    request: &ReportRequest,
    items: &[CashflowLineItem],
    dir: &Path,
) -> Result<PathBuf> {
    let path = dir.join(export_filename(request));
    write_report(items, &path)?;
    tracing::info!(path = %path.display(), rows = items.len(), "exported report");
    Ok(path)
}

fn excel_serial_to_date(serial: f64) -> Option<chrono::NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial as i64))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Parse an amount cell; text such as "-$1,234.56" is accepted too.
fn cell_amount(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => {
            let cleaned: String = s.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

fn cell_date(cell: &Data) -> Option<chrono::NaiveDate> {
    match cell {
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        other => parse_calendar_date(&cell_text(other)),
    }
}

pub fn read_report(path: &Path) -> Result<Vec<CashflowLineItem>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| DeskError::Spreadsheet(format!("failed to open {}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range(SHEET_NAME)
        .map_err(|e| DeskError::Spreadsheet(format!("missing '{SHEET_NAME}' sheet: {e}")))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();
    if header.len() < HEADERS.len() || header.iter().zip(HEADERS).any(|(a, b)| a != b) {
        return Err(DeskError::Spreadsheet(format!(
            "unexpected header row: {}",
            header.join(", ")
        )));
    }

    let mut items = Vec::new();
    for (idx, row) in rows.enumerate() {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let line = idx + 2;
        if row.len() < HEADERS.len() {
            return Err(DeskError::Spreadsheet(format!("row {line} is incomplete")));
        }
        let amount = cell_amount(&row[3])
            .ok_or_else(|| DeskError::Spreadsheet(format!("row {line}: invalid amount")))?;
        let date = cell_date(&row[4])
            .ok_or_else(|| DeskError::Spreadsheet(format!("row {line}: invalid date")))?;
        items.push(CashflowLineItem {
            id: cell_text(&row[0]),
            account_number: cell_text(&row[1]),
            description: cell_text(&row[2]),
            amount: round_cents(amount),
            date,
            category: cell_text(&row[5]),
        });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::models::ReportType;
    use crate::source::generate_mock_items;

    #[test]
    fn test_export_filename() {
        let req = ReportRequest::new(ReportType::Ap, 2023, 1).unwrap();
        assert_eq!(export_filename(&req), "AP_Cashflow_2023_1.xlsx");
        let req = ReportRequest::new(ReportType::Gl, 2024, 11).unwrap();
        assert_eq!(export_filename(&req), "GL_Cashflow_2024_11.xlsx");
    }

    #[test]
    fn test_export_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let req = ReportRequest::new(ReportType::Gl, 2024, 2).unwrap();
        let items = generate_mock_items(&req, &mut StdRng::seed_from_u64(11));

        let path = export_report(&req, &items, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "GL_Cashflow_2024_2.xlsx");

        let read = read_report(&path).unwrap();
        assert_eq!(read.len(), items.len());
        for (a, b) in items.iter().zip(&read) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.account_number, b.account_number);
            assert_eq!(a.description, b.description);
            assert_eq!(a.date, b.date);
            assert_eq!(a.category, b.category);
            assert!((a.amount - b.amount).abs() < 0.005);
        }
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        write_report(&[], &path).unwrap();
        assert!(read_report(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_rejects_non_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.xlsx");
        std::fs::write(&path, "not a zip").unwrap();
        assert!(matches!(read_report(&path), Err(DeskError::Spreadsheet(_))));
    }

    #[test]
    fn test_cell_amount_accepts_currency_text() {
        assert_eq!(cell_amount(&Data::String("-$1,234.56".to_string())), Some(-1234.56));
        assert_eq!(cell_amount(&Data::Float(12.5)), Some(12.5));
        assert_eq!(cell_amount(&Data::Empty), None);
    }

    #[test]
    fn test_excel_serial_dates() {
        assert_eq!(
            cell_date(&Data::Float(45292.0)),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            cell_date(&Data::String("2024-01-01".to_string())),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }
}
