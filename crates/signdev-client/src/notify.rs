//! User-visible notices
//!
//! Workflows never print. Everything the user should see goes through a
//! [`Notifier`], which the front end implements.

use std::sync::Mutex;

pub trait Notifier: Send + Sync {
    /// Confirmation or progress the user should see
    fn info(&self, message: &str);

    /// A failure the user should see
    fn error(&self, message: &str);
}

/// Kind of a recorded notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Keeps every notice in memory, for embedding front ends and tests
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|(_, m)| m).collect()
    }

    pub fn last(&self) -> Option<(NoticeLevel, String)> {
        self.notices().pop()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((level, message.to_string()));
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.push(NoticeLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }
}
