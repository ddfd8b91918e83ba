//! Progress events emitted by the protoreg registrar.

mod event;
mod sink;

use std::sync::Arc;

pub use event::*;
pub use sink::*;

/// Shared handle to an event sink.
pub type EventSinkHandle = Arc<dyn EventSink>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        sink.emit(RegistrationEvent::OperationFailed {
            id: "app".to_string(),
            error: "test".to_string(),
        });
    }

    #[test]
    fn test_collector_sink_stages_by_id() {
        let sink = CollectorSink::default();
        let path = PathBuf::from("/home/u/.local/share/applications/app-opener.desktop");

        sink.emit(RegistrationEvent::Registering {
            id: "app".to_string(),
            stage: RegisterStage::Validated,
        });
        sink.emit(RegistrationEvent::Registering {
            id: "other".to_string(),
            stage: RegisterStage::Validated,
        });
        sink.emit(RegistrationEvent::Registering {
            id: "app".to_string(),
            stage: RegisterStage::EntryWritten { path: path.clone() },
        });
        sink.emit(RegistrationEvent::OperationFailed {
            id: "app".to_string(),
            error: "`xdg-mime` failed with exit code 1".to_string(),
        });
        sink.emit(RegistrationEvent::Unregistering {
            id: "app".to_string(),
            stage: UnregisterStage::EntryRemoved { path: path.clone() },
        });

        assert_eq!(
            sink.register_stages("app"),
            vec![
                RegisterStage::Validated,
                RegisterStage::EntryWritten { path: path.clone() },
            ]
        );
        assert_eq!(sink.register_stages("other"), vec![RegisterStage::Validated]);
        assert_eq!(
            sink.unregister_stages("app"),
            vec![UnregisterStage::EntryRemoved { path }]
        );
        assert!(sink.unregister_stages("other").is_empty());
        assert_eq!(
            sink.failures("app"),
            vec!["`xdg-mime` failed with exit code 1"]
        );
        assert!(sink.failures("other").is_empty());
    }

    #[test]
    fn test_collector_sink() {
        let sink = CollectorSink::default();
        assert!(sink.is_empty());

        sink.emit(RegistrationEvent::Unregistering {
            id: "app".to_string(),
            stage: UnregisterStage::AssociationsScrubbed {
                removed: vec!["x-scheme-handler/app".to_string()],
            },
        });
        sink.emit(RegistrationEvent::AssociationsPurged {
            id: "app".to_string(),
            removed: Vec::new(),
        });

        assert_eq!(sink.len(), 2);
        let events = sink.events();
        assert_eq!(
            events[0],
            RegistrationEvent::Unregistering {
                id: "app".to_string(),
                stage: UnregisterStage::AssociationsScrubbed {
                    removed: vec!["x-scheme-handler/app".to_string()],
                },
            }
        );
    }

    #[test]
    fn test_event_sink_handle() {
        let collector = Arc::new(CollectorSink::default());
        let sink: EventSinkHandle = collector.clone();
        sink.emit(RegistrationEvent::Registering {
            id: "app".to_string(),
            stage: RegisterStage::RolledBack,
        });
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_event_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullSink>();
        assert_send_sync::<CollectorSink>();
    }
}
