use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Progress,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// Single-slot message channel shared by every controller.
///
/// The slot holds at most one message; each `show` replaces the previous one
/// and observers only ever see the latest value.
#[derive(Clone)]
pub struct StatusNotifier {
    slot: Arc<watch::Sender<Option<StatusMessage>>>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
        }
    }

    pub fn show(&self, kind: StatusKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            StatusKind::Error => warn!(status = %text, "status"),
            StatusKind::Progress | StatusKind::Success => info!(status = %text, "status"),
        }
        self.slot.send_replace(Some(StatusMessage { kind, text }));
    }

    pub fn progress(&self, text: impl Into<String>) {
        self.show(StatusKind::Progress, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.show(StatusKind::Error, text);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.show(StatusKind::Success, text);
    }

    pub fn hide(&self) {
        self.slot.send_replace(None);
    }

    pub fn current(&self) -> Option<StatusMessage> {
        self.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<StatusMessage>> {
        self.slot.subscribe()
    }
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new()
    }
}
