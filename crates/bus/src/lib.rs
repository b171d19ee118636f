use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

/// Transient user-facing notifications produced by the bridge and the
/// composition surface. Nothing in the core depends on how they are shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    // Bridge -> presentation
    Sent,
    Failed { reason: String },
    EmptyInput,

    // Composition surface -> presentation
    TemplateLoaded { title: String },
    TemplateCreated { title: String },
    Busy(bool),
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::Sent | Notice::TemplateLoaded { .. } | Notice::TemplateCreated { .. } => {
                Severity::Success
            }
            Notice::Failed { .. } | Notice::EmptyInput => Severity::Error,
            Notice::Busy(_) => Severity::Info,
        }
    }

    /// Short text suitable for a toast.
    pub fn message(&self) -> String {
        match self {
            Notice::Sent => "Message sent successfully!".to_string(),
            Notice::Failed { reason } => format!("Could not send message: {reason}"),
            Notice::EmptyInput => "Please enter a message".to_string(),
            Notice::TemplateLoaded { title } => format!("Template loaded: {title}"),
            Notice::TemplateCreated { title } => format!("Template created: {title}"),
            Notice::Busy(true) => "Sending…".to_string(),
            Notice::Busy(false) => "Idle".to_string(),
        }
    }
}

/// Cloneable producer side of the notice channel.
#[derive(Clone, Debug)]
pub struct NoticeSender {
    tx: Sender<Notice>,
}

impl NoticeSender {
    /// Send a notice. A dropped receiver only means nobody is presenting
    /// notices any more, so the notice is discarded.
    pub fn notify(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            log::trace!(target: "bus", "notice dropped: receiver gone");
        }
    }
}

pub struct NoticeBus {
    tx: Sender<Notice>,
    rx: Receiver<Notice>,
}

impl NoticeBus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> NoticeSender {
        NoticeSender {
            tx: self.tx.clone(),
        }
    }

    /// Take every notice queued so far, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        self.rx.try_iter().collect()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new()
    }
}
