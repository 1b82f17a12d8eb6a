use crossbeam_channel::Sender;
use parking_lot::Mutex;

use super::types::RuntimeNotification;

/// Receives runtime notifications. Returning `false` means the receiving
/// side is gone and the sender should be dropped.
pub trait RuntimeEventSender: Send + 'static {
    fn send(&self, event: RuntimeNotification) -> bool;
}

impl RuntimeEventSender for Sender<RuntimeNotification> {
    fn send(&self, event: RuntimeNotification) -> bool {
        Sender::send(self, event).is_ok()
    }
}

/// Single-subscriber fan-out shared by the pump thread and UI callers.
pub(crate) struct Notifier {
    subscriber: Mutex<Option<Box<dyn RuntimeEventSender>>>,
}

impl Notifier {
    pub(crate) fn new(subscriber: Option<Box<dyn RuntimeEventSender>>) -> Self {
        Self {
            subscriber: Mutex::new(subscriber),
        }
    }

    pub(crate) fn subscribe(&self, sender: Box<dyn RuntimeEventSender>) {
        *self.subscriber.lock() = Some(sender);
    }

    pub(crate) fn unsubscribe(&self) {
        *self.subscriber.lock() = None;
    }

    pub(crate) fn broadcast(&self, event: RuntimeNotification) {
        let mut subscriber = self.subscriber.lock();
        if let Some(sender) = subscriber.as_ref()
            && !sender.send(event)
        {
            // Remove the disconnected subscriber
            *subscriber = None;
        }
    }
}
