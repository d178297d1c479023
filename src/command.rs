//! Intent extraction for chat input.
//!
//! The only recognised intent is "generate <AP|GL> report for <Month> <YYYY>",
//! found anywhere in the message. Everything else is `Command::NoCommand` and
//! goes to the conversational responder.

use std::sync::OnceLock;

use regex::Regex;

use crate::fmt::MONTH_NAMES;
use crate::models::{ReportRequest, ReportType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NoCommand,
    GenerateReport(ReportRequest),
}

fn generate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)generate\s+(ap|gl)\s+report\s+for\s+(\w+)\s+(\d{4})")
            .expect("generate-report pattern is valid")
    })
}

/// 1-based month number for a full English month name, ignoring case.
/// Abbreviations and misspellings are not accepted.
pub fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|idx| idx as u32 + 1)
}

/// Scan free text for a generate-report command.
///
/// A message that matches the pattern but names an unknown month
/// ("Generate AP report for Frobruary 2023") yields `NoCommand`, so it
/// falls through to the normal chat reply rather than raising an error.
pub fn extract(text: &str) -> Command {
    let Some(caps) = generate_pattern().captures(text) else {
        return Command::NoCommand;
    };

    let Ok(report_type) = caps[1].parse::<ReportType>() else {
        return Command::NoCommand;
    };
    let Some(month) = month_number(&caps[2]) else {
        return Command::NoCommand;
    };
    let Ok(year) = caps[3].parse::<i32>() else {
        return Command::NoCommand;
    };

    match ReportRequest::new(report_type, year, month) {
        Ok(request) => Command::GenerateReport(request),
        Err(_) => Command::NoCommand,
    }
}
