//! Shared report state.
//!
//! Both the `report` command and chat-triggered generation write to the same
//! `Dashboard`. Every call to `generate` takes a sequence number; a result
//! that arrives after a newer request was issued is dropped, so a slow stale
//! response cannot replace a newer report.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{CashflowLineItem, ReportRequest};
use crate::source::ReportSource;

pub const FAILURE_NOTICE: &str = "Failed to generate report. Please try again.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportState {
    /// Most recently requested report.
    pub request: Option<ReportRequest>,
    /// The request `items` were generated for.
    pub shown: Option<ReportRequest>,
    pub items: Vec<CashflowLineItem>,
    pub loading: bool,
    pub generated: bool,
    pub error: Option<String>,
}

impl ReportState {
    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.amount).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Failed,
    Superseded,
}

#[derive(Clone)]
pub struct Dashboard {
    source: Arc<dyn ReportSource>,
    state: Arc<watch::Sender<ReportState>>,
    latest: Arc<AtomicU64>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn ReportSource>) -> Self {
        let (state, _) = watch::channel(ReportState::default());
        Self {
            source,
            state: Arc::new(state),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReportState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ReportState {
        self.state.borrow().clone()
    }

    pub fn current_request(&self) -> Option<ReportRequest> {
        self.state.borrow().request
    }

    pub async fn generate(&self, request: ReportRequest) -> Outcome {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| {
            s.request = Some(request);
            s.loading = true;
            s.error = None;
        });

        let result = self.source.fetch(request).await;

        if self.latest.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "discarding superseded report result");
            return Outcome::Superseded;
        }

        match result {
            Ok(items) => {
                tracing::info!(
                    report_type = %request.report_type,
                    year = request.year,
                    month = request.month,
                    count = items.len(),
                    "report generated"
                );
                self.state.send_modify(|s| {
                    s.shown = Some(request);
                    s.items = items;
                    s.generated = true;
                    s.loading = false;
                });
                Outcome::Applied
            }
            Err(e) => {
                tracing::error!(error = %e, "error generating report");
                // fall back to the report still on screen
                self.state.send_modify(|s| {
                    s.request = s.shown;
                    s.error = Some(FAILURE_NOTICE.to_string());
                    s.loading = false;
                });
                Outcome::Failed
            }
        }
    }

    /// Run `generate` as a detached task on the current runtime.
    pub fn spawn_generate(&self, request: ReportRequest) -> JoinHandle<Outcome> {
        let dashboard = self.clone();
        tokio::spawn(async move { dashboard.generate(request).await })
    }
}
