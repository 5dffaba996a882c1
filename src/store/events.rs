use std::sync::mpsc::Sender;

use crate::models::Category;

/// User-visible store notifications. The UI layer (the CLI here)
/// subscribes to these instead of being called inline from store logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Notice { title: String, detail: String },
    Error { title: String, detail: String },
    DailyGoalCompleted { category: Category, message: String },
}

impl StoreEvent {
    pub fn notice(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Notice {
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Error {
            title: title.into(),
            detail: detail.into(),
        }
    }
}

/// Optional event sink held by each store. Emission is best-effort: a
/// dropped receiver never fails an operation.
#[derive(Clone, Default)]
pub struct EventSink {
    sender: Option<Sender<StoreEvent>>,
}

impl EventSink {
    pub fn new(sender: Sender<StoreEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn emit(&self, event: StoreEvent) {
        if let Some(ref sender) = self.sender {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn emits_to_subscriber() {
        let (tx, rx) = channel();
        let sink = EventSink::new(tx);
        sink.emit(StoreEvent::notice("Task added", "detail"));
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::notice("Task added", "detail")
        );
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        EventSink::new(tx).emit(StoreEvent::error("x", "y"));
    }

    #[test]
    fn disabled_sink_is_a_no_op() {
        EventSink::disabled().emit(StoreEvent::notice("a", "b"));
    }
}
