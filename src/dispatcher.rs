use std::time::Duration;

use tokio::task::JoinHandle;

use crate::conversation::{append, SharedLog};
use crate::fmt::month_name;
use crate::models::{ReportRequest, Sender};

/// Delay before the "report is now displayed" confirmation.
pub const FOLLOW_UP_DELAY: Duration = Duration::from_millis(1000);

pub struct Dispatcher {
    log: SharedLog,
}

impl Dispatcher {
    pub fn new(log: SharedLog) -> Self {
        Self { log }
    }

    /// Trigger report generation for a chat command.
    ///
    /// `generate` runs exactly once, before anything is logged. The
    /// acknowledgment is appended before returning; the confirmation is
    /// appended by the returned task once the follow-up delay has passed.
    pub fn dispatch<F>(&self, request: ReportRequest, generate: F) -> JoinHandle<()>
    where
        F: FnOnce(ReportRequest),
    {
        generate(request);

        let period = format!("{} {}", month_name(request.month), request.year);
        append(
            &self.log,
            format!("Generating {} report for {period}...", request.report_type),
            Sender::Assistant,
        );

        let log = self.log.clone();
        let report_type = request.report_type;
        tokio::spawn(async move {
            tokio::time::sleep(FOLLOW_UP_DELAY).await;
            append(
                &log,
                format!("The {report_type} report for {period} is now displayed on the main screen."),
                Sender::Assistant,
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::conversation::{lock, ConversationLog};
    use crate::models::ReportType;

    fn request() -> ReportRequest {
        ReportRequest::new(ReportType::Ap, 2023, 1).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_called_once_before_messages() {
        let log = ConversationLog::new().shared();
        let dispatcher = Dispatcher::new(log.clone());
        let calls = RefCell::new(Vec::new());

        let handle = dispatcher.dispatch(request(), |r| {
            calls.borrow_mut().push((r, lock(&log).len()));
        });

        let calls = calls.into_inner();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (request(), 0), "generation must precede the acknowledgment");

        {
            let log = lock(&log);
            assert_eq!(log.len(), 1);
            assert_eq!(log.messages()[0].content, "Generating AP report for January 2023...");
            assert_eq!(log.messages()[0].sender, Sender::Assistant);
        }

        handle.await.unwrap();
        let log = lock(&log);
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.messages()[1].content,
            "The AP report for January 2023 is now displayed on the main screen."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_up_waits_for_delay() {
        let log = ConversationLog::new().shared();
        let dispatcher = Dispatcher::new(log.clone());
        let _handle = dispatcher.dispatch(request(), |_| {});

        tokio::time::sleep(FOLLOW_UP_DELAY - Duration::from_millis(1)).await;
        assert_eq!(lock(&log).len(), 1, "confirmation must not arrive early");

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(lock(&log).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_returns_without_waiting() {
        let log = ConversationLog::new().shared();
        let dispatcher = Dispatcher::new(log.clone());
        let before = tokio::time::Instant::now();
        let handle = dispatcher.dispatch(request(), |_| {});
        assert_eq!(tokio::time::Instant::now(), before);
        assert!(!handle.is_finished());
    }
}
