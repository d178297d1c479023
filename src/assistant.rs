//! The chat assistant: turns a line of user text into log entries and,
//! when the text is a generate-report command, into a report request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::command::{self, Command};
use crate::conversation::{append, SharedLog};
use crate::dashboard::Dashboard;
use crate::dispatcher::Dispatcher;
use crate::error::{DeskError, Result};
use crate::models::{ReportRequest, Sender};
use crate::source::HTTP_TIMEOUT;

pub const CHAT_REPLY_DELAY: Duration = Duration::from_millis(1000);

pub const HELP_REPLY: &str = "I can help you in the following ways:
1. Generate reports by typing \"Generate AP report for January 2023\"
2. Answer questions about cash flow data
3. Provide financial insights

What would you like to do?";

pub const SUMMARY_REPLY: &str = "I can provide a summary of cash flow data once you've generated a report. \
Try asking \"Generate AP report for January 2023\" first.";

pub const FALLBACK_REPLY: &str = "I'm not sure how to help with that specific request. \
You can ask me to generate reports by typing something like \"Generate AP report for January 2023\" \
or \"Generate GL report for March 2024\".";

pub const ERROR_REPLY: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

/// Pick a canned reply by keyword; "help" wins over "summary"/"analyze".
pub fn canned_reply(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    if lower.contains("help") {
        HELP_REPLY
    } else if lower.contains("summary") || lower.contains("analyze") {
        SUMMARY_REPLY
    } else {
        FALLBACK_REPLY
    }
}

#[async_trait]
pub trait Responder: Send + Sync {
    /// Answer free text that is not a command. `context` is the report the
    /// user is currently looking at.
    async fn respond(&self, text: &str, context: ReportRequest) -> Result<String>;
}

pub struct CannedResponder {
    delay: Duration,
}

impl CannedResponder {
    pub fn new() -> Self {
        Self {
            delay: CHAT_REPLY_DELAY,
        }
    }
}

impl Default for CannedResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Responder for CannedResponder {
    async fn respond(&self, text: &str, _context: ReportRequest) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(canned_reply(text).to_string())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(flatten)]
    context: ReportRequest,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: String,
}

pub struct RemoteResponder {
    client: Client,
    base_url: String,
}

impl RemoteResponder {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Responder for RemoteResponder {
    async fn respond(&self, text: &str, context: ReportRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            message: text,
            context,
        };
        let res = self.client.post(&url).json(&body).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(DeskError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.json::<ChatResponse>().await?.message)
    }
}

/// What one call to `ChatSession::send` did.
#[derive(Debug)]
pub enum Turn {
    Ignored,
    Dispatched {
        request: ReportRequest,
        follow_up: JoinHandle<()>,
    },
    Replied,
}

pub struct ChatSession {
    log: SharedLog,
    dashboard: Dashboard,
    dispatcher: Dispatcher,
    responder: Arc<dyn Responder>,
}

impl ChatSession {
    pub fn new(log: SharedLog, dashboard: Dashboard, responder: Arc<dyn Responder>) -> Self {
        let dispatcher = Dispatcher::new(log.clone());
        Self {
            log,
            dashboard,
            dispatcher,
            responder,
        }
    }

    pub fn log(&self) -> &SharedLog {
        &self.log
    }

    /// Handle one line of user input. Never fails: responder errors become
    /// a canned assistant apology.
    pub async fn send(&self, text: &str) -> Turn {
        if text.trim().is_empty() {
            return Turn::Ignored;
        }
        append(&self.log, text, Sender::User);

        match command::extract(text) {
            Command::GenerateReport(request) => {
                let dashboard = self.dashboard.clone();
                let follow_up = self.dispatcher.dispatch(request, move |r| {
                    dashboard.spawn_generate(r);
                });
                Turn::Dispatched { request, follow_up }
            }
            Command::NoCommand => {
                let context = self
                    .dashboard
                    .current_request()
                    .unwrap_or_else(ReportRequest::current);
                let reply = match self.responder.respond(text, context).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::warn!(error = %e, "error in chat");
                        ERROR_REPLY.to_string()
                    }
                };
                append(&self.log, reply, Sender::Assistant);
                Turn::Replied
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{lock, ConversationLog};
    use crate::models::ReportType;
    use crate::source::MockSource;

    struct BrokenResponder;

    #[async_trait]
    impl Responder for BrokenResponder {
        async fn respond(&self, _text: &str, _context: ReportRequest) -> Result<String> {
            Err(DeskError::Api {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    fn session(responder: Arc<dyn Responder>) -> (ChatSession, Dashboard) {
        let log = ConversationLog::with_greeting().shared();
        let dashboard = Dashboard::new(Arc::new(MockSource::seeded(9)));
        (ChatSession::new(log, dashboard.clone(), responder), dashboard)
    }

    fn contents(log: &SharedLog) -> Vec<String> {
        lock(log).messages().iter().map(|m| m.content.clone()).collect()
    }

    #[test]
    fn test_canned_reply_priority() {
        assert_eq!(canned_reply("HELP me with the summary"), HELP_REPLY);
        assert_eq!(canned_reply("give me a Summary"), SUMMARY_REPLY);
        assert_eq!(canned_reply("please analyze this"), SUMMARY_REPLY);
        assert_eq!(canned_reply("what's the weather"), FALLBACK_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_ignored() {
        let (chat, _) = session(Arc::new(CannedResponder::new()));
        assert!(matches!(chat.send("   ").await, Turn::Ignored));
        assert_eq!(lock(chat.log()).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_dispatches_and_updates_dashboard() {
        let (chat, dashboard) = session(Arc::new(CannedResponder::new()));
        let turn = chat.send("Generate GL report for March 2024").await;

        let Turn::Dispatched { request, follow_up } = turn else {
            panic!("expected a dispatched command");
        };
        assert_eq!(request, ReportRequest::new(ReportType::Gl, 2024, 3).unwrap());

        follow_up.await.unwrap();
        let log = contents(chat.log());
        assert_eq!(log.len(), 4);
        assert_eq!(log[1], "Generate GL report for March 2024");
        assert_eq!(log[2], "Generating GL report for March 2024...");
        assert_eq!(
            log[3],
            "The GL report for March 2024 is now displayed on the main screen."
        );

        // mock generation (800ms) finishes before the 1000ms follow-up
        let state = dashboard.snapshot();
        assert!(state.generated);
        assert_eq!(state.request, Some(request));
        assert_eq!(state.items.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_month_gets_fallback_reply() {
        let (chat, dashboard) = session(Arc::new(CannedResponder::new()));
        let turn = chat.send("Generate AP report for Frobruary 2023").await;
        assert!(matches!(turn, Turn::Replied));
        let log = contents(chat.log());
        assert_eq!(log.last().map(String::as_str), Some(FALLBACK_REPLY));
        assert!(dashboard.snapshot().request.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_help_reply() {
        let (chat, _) = session(Arc::new(CannedResponder::new()));
        chat.send("help").await;
        let log = contents(chat.log());
        assert_eq!(log.len(), 3);
        assert_eq!(log[2], HELP_REPLY);
    }

    #[tokio::test]
    async fn test_responder_error_becomes_apology() {
        let (chat, _) = session(Arc::new(BrokenResponder));
        let turn = chat.send("how are we doing?").await;
        assert!(matches!(turn, Turn::Replied));
        let log = lock(chat.log());
        assert_eq!(log.len(), 3);
        assert_eq!(log.messages()[2].content, ERROR_REPLY);
        assert_eq!(log.messages()[2].sender, Sender::Assistant);
    }

    #[test]
    fn test_chat_request_wire_format() {
        let body = ChatRequest {
            message: "summary please",
            context: ReportRequest::new(ReportType::Ap, 2023, 1).unwrap(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "summary please",
                "reportType": "AP",
                "year": 2023,
                "month": 1
            })
        );
    }
}
