use std::path::PathBuf;

/// All event types emitted by protoreg operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// Registration progress for a handler id.
    Registering { id: String, stage: RegisterStage },
    /// Unregistration progress for a handler id.
    Unregistering { id: String, stage: UnregisterStage },
    /// Default associations pointing at a handler were scrubbed without touching its entry file.
    AssociationsPurged { id: String, removed: Vec<String> },
    /// An operation aborted.
    OperationFailed { id: String, error: String },
}

/// Stages of registering a handler, in the order they are reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterStage {
    /// Options passed validation; nothing has been touched yet.
    Validated,
    /// The desktop entry is on disk but not yet bound to any type.
    EntryWritten { path: PathBuf },
    /// The binder recorded the entry as default handler for these types.
    Bound { mimetypes: Vec<String> },
    /// The desktop database was refreshed.
    Refreshed,
    /// A failed bind removed the entry it had just written.
    RolledBack,
    Complete,
}

/// Stages of unregistering a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnregisterStage {
    EntryRemoved { path: PathBuf },
    /// Matching keys were dropped from the default associations list.
    AssociationsScrubbed { removed: Vec<String> },
    Refreshed,
    Complete,
}
