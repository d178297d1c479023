use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;
use colored::Colorize;
use tokio::sync::broadcast;

use crate::models::{ChatMessage, Sender};

pub const GREETING: &str = "Hello! I can help you analyze cash flow data or generate reports. \
For example, try asking \"Generate AP report for January 2023\" or \"Generate GL report for March 2024\".";

const NOTIFY_CAPACITY: usize = 64;

/// Append-only, ordered chat history.
pub struct ConversationLog {
    messages: Vec<ChatMessage>,
    next_id: u64,
    notify: broadcast::Sender<ChatMessage>,
}

pub type SharedLog = Arc<Mutex<ConversationLog>>;

impl ConversationLog {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            messages: Vec::new(),
            next_id: 1,
            notify,
        }
    }

    /// A log seeded with the assistant's greeting.
    pub fn with_greeting() -> Self {
        let mut log = Self::new();
        log.push(GREETING, Sender::Assistant);
        log
    }

    pub fn shared(self) -> SharedLog {
        Arc::new(Mutex::new(self))
    }

    pub fn push(&mut self, content: impl Into<String>, sender: Sender) -> ChatMessage {
        let message = ChatMessage {
            id: self.next_id,
            content: content.into(),
            sender,
            timestamp: Local::now(),
        };
        self.next_id += 1;
        self.messages.push(message.clone());
        // No subscribers is fine; the history is still kept.
        let _ = self.notify.send(message.clone());
        message
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.notify.subscribe()
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a shared log, recovering from a poisoned mutex.
pub fn lock(log: &SharedLog) -> MutexGuard<'_, ConversationLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn append(log: &SharedLog, content: impl Into<String>, sender: Sender) -> ChatMessage {
    lock(log).push(content, sender)
}

/// Render one message for the terminal: sender label, time, wrapped body.
pub fn render(message: &ChatMessage, width: usize) -> String {
    let time = message.timestamp.format("%H:%M").to_string();
    let label = match message.sender {
        Sender::User => "You".cyan().bold(),
        Sender::Assistant => "Assistant".green().bold(),
    };
    let body = textwrap::indent(&textwrap::fill(&message.content, width.max(20)), "  ");
    format!("{label} {}\n{body}", time.dimmed())
}
