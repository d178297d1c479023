use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DeskError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
    #[serde(rename = "AP")]
    Ap,
    #[serde(rename = "GL")]
    Gl,
}

impl ReportType {
    pub fn code(self) -> &'static str {
        match self {
            ReportType::Ap => "AP",
            ReportType::Gl => "GL",
        }
    }

    /// Category vocabulary used when synthesizing line items.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            ReportType::Ap => &["Vendor Payment", "Utilities", "Rent", "Services", "Equipment"],
            ReportType::Gl => &["Revenue", "Expenses", "Investments", "Taxes", "Operations"],
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AP" => Ok(ReportType::Ap),
            "GL" => Ok(ReportType::Gl),
            other => Err(format!("unknown report type '{other}' (expected AP or GL)")),
        }
    }
}

/// The (type, year, month) tuple identifying one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawReportRequest")]
pub struct ReportRequest {
    pub report_type: ReportType,
    pub year: i32,
    pub month: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReportRequest {
    report_type: ReportType,
    year: i32,
    month: u32,
}

impl TryFrom<RawReportRequest> for ReportRequest {
    type Error = DeskError;

    fn try_from(raw: RawReportRequest) -> Result<Self> {
        Self::new(raw.report_type, raw.year, raw.month)
    }
}

impl ReportRequest {
    pub fn new(report_type: ReportType, year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(DeskError::InvalidRequest(format!(
                "month must be 1-12, got {month}"
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(DeskError::InvalidRequest(format!("year {year} is out of range")));
        }
        Ok(Self {
            report_type,
            year,
            month,
        })
    }

    /// AP for the current calendar month, the form's initial selection.
    pub fn current() -> Self {
        use chrono::Datelike;
        let today = Local::now().date_naive();
        Self {
            report_type: ReportType::Ap,
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn title(&self) -> String {
        format!("{} Cash Flow Report", self.report_type)
    }

    pub fn caption(&self) -> String {
        format!(
            "{} Cash Flow Report for {} {}",
            self.report_type,
            crate::fmt::month_name(self.month),
            self.year
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowLineItem {
    pub id: String,
    pub account_number: String,
    pub description: String,
    pub amount: f64,
    #[serde(deserialize_with = "de_calendar_date")]
    pub date: NaiveDate,
    pub category: String,
}

/// Accepts `2023-01-05` as well as `2023-01-05T00:00:00[.fff][Z]`.
fn de_calendar_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: u64,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserProfile {
    pub fn test_user() -> Self {
        Self {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            roles: vec!["user".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type_parses_case_insensitively() {
        assert_eq!("ap".parse::<ReportType>().unwrap(), ReportType::Ap);
        assert_eq!("Gl".parse::<ReportType>().unwrap(), ReportType::Gl);
        assert!("ar".parse::<ReportType>().is_err());
    }

    #[test]
    fn test_request_rejects_bad_month() {
        assert!(ReportRequest::new(ReportType::Ap, 2023, 0).is_err());
        assert!(ReportRequest::new(ReportType::Ap, 2023, 13).is_err());
        assert!(ReportRequest::new(ReportType::Gl, 2023, 12).is_ok());
    }

    #[test]
    fn test_request_wire_format() {
        let req = ReportRequest::new(ReportType::Gl, 2024, 3).unwrap();
        let json = serde_json::to_value(req).unwrap();
        assert_eq!(json, serde_json::json!({"reportType": "GL", "year": 2024, "month": 3}));
    }

    #[test]
    fn test_request_deserialize_validates() {
        let ok: ReportRequest =
            serde_json::from_str(r#"{"reportType":"AP","year":2023,"month":1}"#).unwrap();
        assert_eq!(ok, ReportRequest::new(ReportType::Ap, 2023, 1).unwrap());
        assert!(serde_json::from_str::<ReportRequest>(r#"{"reportType":"AP","year":2023,"month":13}"#).is_err());
    }

    #[test]
    fn test_line_item_accepts_datetime_dates() {
        let json = r#"{
            "id": "abc",
            "accountNumber": "123456",
            "description": "AP Transaction 1",
            "amount": -1500.25,
            "date": "2023-01-05T00:00:00",
            "category": "Rent"
        }"#;
        let item: CashflowLineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.date, NaiveDate::from_ymd_opt(2023, 1, 5).unwrap());
        assert_eq!(item.account_number, "123456");
    }

    #[test]
    fn test_parse_calendar_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29);
        assert_eq!(parse_calendar_date("2024-02-29"), expected);
        assert_eq!(parse_calendar_date("2024-02-29T05:00:00.000Z"), expected);
        assert_eq!(parse_calendar_date("2024-02-29T00:00:00.123"), expected);
        assert_eq!(parse_calendar_date("Feb 29"), None);
    }

    #[test]
    fn test_caption() {
        let req = ReportRequest::new(ReportType::Ap, 2023, 1).unwrap();
        assert_eq!(req.caption(), "AP Cash Flow Report for January 2023");
        assert_eq!(req.title(), "AP Cash Flow Report");
    }
}
