//! Report data sources.
//!
//! `MockSource` synthesizes a month of line items locally (development mode);
//! `RemoteSource` asks the reporting service over HTTP.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{DeskError, Result};
use crate::fmt::days_in_month;
use crate::models::{round_cents, CashflowLineItem, ReportRequest, ReportType};

pub const MOCK_ITEM_COUNT: usize = 20;
pub const MOCK_GENERATION_DELAY: Duration = Duration::from_millis(800);
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch(&self, request: ReportRequest) -> Result<Vec<CashflowLineItem>>;
}

/// Synthesize one month of line items, sorted by date.
///
/// AP amounts are always outflows in [-11000, -1000); GL amounts fall in
/// [-5000, 10000). Days are uniform over the real length of the month.
pub fn generate_mock_items<R: Rng + ?Sized>(
    request: &ReportRequest,
    rng: &mut R,
) -> Vec<CashflowLineItem> {
    let days = days_in_month(request.year, request.month);
    let categories = request.report_type.categories();
    // ReportRequest::new rejects periods chrono cannot represent
    let first = NaiveDate::from_ymd_opt(request.year, request.month, 1).unwrap_or_default();

    let mut items: Vec<CashflowLineItem> = (0..MOCK_ITEM_COUNT)
        .map(|i| {
            let offset = rng.gen_range(0..days);
            let date = first
                .checked_add_days(Days::new(u64::from(offset)))
                .unwrap_or(first);
            let amount = match request.report_type {
                ReportType::Ap => -rng.gen_range(1000.0..11000.0),
                ReportType::Gl => rng.gen_range(-5000.0..10000.0),
            };
            let account: u32 = rng.gen_range(100_000..=999_999);
            let category = categories.choose(rng).copied().unwrap_or("Uncategorized");
            CashflowLineItem {
                id: format!("item-{i}"),
                account_number: account.to_string(),
                description: format!("{} Transaction {}", request.report_type, i + 1),
                amount: round_cents(amount),
                date,
                category: category.to_string(),
            }
        })
        .collect();

    items.sort_by_key(|item| item.date);
    items
}

pub struct MockSource {
    rng: Mutex<StdRng>,
    delay: Duration,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            delay: MOCK_GENERATION_DELAY,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            delay: MOCK_GENERATION_DELAY,
        }
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSource for MockSource {
    async fn fetch(&self, request: ReportRequest) -> Result<Vec<CashflowLineItem>> {
        tracing::debug!(
            report_type = %request.report_type,
            year = request.year,
            month = request.month,
            "generating mock report"
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| DeskError::Other("mock generator lock poisoned".to_string()))?;
        Ok(generate_mock_items(&request, &mut *rng))
    }
}

#[derive(Deserialize)]
struct ReportResponse {
    data: Vec<CashflowLineItem>,
}

#[derive(Clone)]
pub struct RemoteSource {
    client: Client,
    base_url: String,
}

impl RemoteSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReportSource for RemoteSource {
    async fn fetch(&self, request: ReportRequest) -> Result<Vec<CashflowLineItem>> {
        let url = format!("{}/api/reports", self.base_url);
        tracing::info!(
            %url,
            report_type = %request.report_type,
            year = request.year,
            month = request.month,
            "requesting report"
        );

        let res = self.client.post(&url).json(&request).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(DeskError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut data = res.json::<ReportResponse>().await?.data;
        data.sort_by_key(|item| item.date);
        Ok(data)
    }
}
