//! Toast notifications.
//!
//! Stores and sessions report outcomes through a [`Notifier`] instead of
//! returning errors, so the presentation layer decides how to show them.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::ApiResponse;

/// Message shown when a failed envelope carries no message of its own
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// A toast notification message
#[derive(Debug, Clone)]
pub struct Toast {
    /// The message to display
    pub message: String,
    /// The severity level of the toast
    pub level: ToastLevel,
}

/// Severity level for toast notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl Toast {
    pub fn new(message: String, level: ToastLevel) -> Self {
        Self { message, level }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Error)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Success)
    }
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);

    fn success(&self, message: &str) {
        self.notify(Toast::success(message));
    }

    fn error(&self, message: &str) {
        self.notify(Toast::error(message));
    }

    /// Surface a failed envelope's message; successful envelopes are ignored.
    fn handle_response(&self, response: &ApiResponse) {
        if !response.is_success() {
            self.error(&response.message_or(GENERIC_FAILURE));
        }
    }
}

/// Writes toasts to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => tracing::warn!(message = %toast.message, "toast"),
            ToastLevel::Warning => tracing::warn!(message = %toast.message, "toast"),
            ToastLevel::Info | ToastLevel::Success => {
                tracing::info!(message = %toast.message, "toast")
            }
        }
    }
}

/// Keeps every toast so it can be rendered (or asserted on) later
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self, level: ToastLevel) -> Vec<String> {
        self.toasts
            .lock()
            .iter()
            .filter(|t| t.level == level)
            .map(|t| t.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}
