use std::sync::Mutex;

use crate::{RegisterStage, RegistrationEvent, UnregisterStage};

/// Receives the progress of registrar operations.
///
/// Implementations are shared behind an [`crate::EventSinkHandle`] and must not block: `emit`
/// runs inline between filesystem and command steps.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RegistrationEvent);
}

/// Discards every event. Used when no host is listening.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: RegistrationEvent) {}
}

/// Keeps every event in emission order.
#[derive(Default)]
pub struct CollectorSink {
    events: Mutex<Vec<RegistrationEvent>>,
}

impl CollectorSink {
    pub fn events(&self) -> Vec<RegistrationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Stages reached while registering `id`, in order.
    pub fn register_stages(&self, id: &str) -> Vec<RegisterStage> {
        self.events()
            .into_iter()
            .filter_map(|event| {
                match event {
                    RegistrationEvent::Registering { id: event_id, stage } if event_id == id => {
                        Some(stage)
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// Stages reached while unregistering `id`, in order.
    pub fn unregister_stages(&self, id: &str) -> Vec<UnregisterStage> {
        self.events()
            .into_iter()
            .filter_map(|event| {
                match event {
                    RegistrationEvent::Unregistering { id: event_id, stage } if event_id == id => {
                        Some(stage)
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// Error messages of failed operations on `id`.
    pub fn failures(&self, id: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| {
                match event {
                    RegistrationEvent::OperationFailed { id: event_id, error } if event_id == id => {
                        Some(error)
                    }
                    _ => None,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: RegistrationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
