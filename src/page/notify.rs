use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::dom::Document;
use crate::lock;

pub const NOTIFICATION_ID: &str = "successNotification";
pub const MESSAGE_ID: &str = "successMessage";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Error,
}

impl NotificationKind {
    pub fn class(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Info => "info",
            NotificationKind::Error => "error",
        }
    }
}

/// Toast notification region with auto-hide
pub struct Toast {
    document: Document,
    duration: Duration,
    hide_task: Mutex<Option<JoinHandle<()>>>,
}

impl Toast {
    pub fn new(document: Document, duration: Duration) -> Self {
        Self {
            document,
            duration,
            hide_task: Mutex::new(None),
        }
    }

    /// Show `message`, hiding it again after the configured duration.
    /// A newer toast restarts the countdown.
    pub fn show(&self, message: &str, kind: NotificationKind) {
        let doc = &self.document;
        let (Some(toast), Some(text)) = (
            doc.get_element_by_id(NOTIFICATION_ID),
            doc.get_element_by_id(MESSAGE_ID),
        ) else {
            return;
        };

        doc.set_text(text, message);
        doc.set_class_name(toast, &format!("notification {} show", kind.class()));

        let Ok(runtime) = Handle::try_current() else {
            return;
        };
        let document = self.document.clone();
        let duration = self.duration;
        let task = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            hide(&document);
        });

        if let Some(previous) = lock(&self.hide_task).replace(task) {
            previous.abort();
        }
    }

    pub fn hide(&self) {
        hide(&self.document);
    }
}

fn hide(doc: &Document) {
    if let Some(toast) = doc.get_element_by_id(NOTIFICATION_ID) {
        doc.remove_class(toast, "show");
    }
}
