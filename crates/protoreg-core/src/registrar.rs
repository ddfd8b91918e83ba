use std::{path::PathBuf, sync::Arc};

use protoreg_config::{Config, Layout};
use protoreg_entry::{desktop_filename, validate_id, write_entry, RegistrationOptions};
use protoreg_events::{
    EventSinkHandle, NullSink, RegisterStage, RegistrationEvent, UnregisterStage,
};
use protoreg_utils::{
    fs::{FileSystemProvider, StandardFileSystemProvider},
    path::{PathResolver, SystemPathResolver},
};
use tracing::{debug, info, warn};

use crate::{
    database::DesktopDatabase,
    error::{ProtoregError, ProtoregResult},
    exec::{CommandRunner, SystemCommandRunner},
    mimeapps,
};

/// What [`Registrar::unregister`] removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnregisterReport {
    pub entry_path: PathBuf,
    /// MIME types whose default pointed at the removed entry.
    pub removed_defaults: Vec<String>,
}

/// Current state of a handler id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationStatus {
    pub entry_path: PathBuf,
    pub entry_exists: bool,
    /// MIME types that currently name the entry as their default handler.
    pub default_for: Vec<String>,
}

impl RegistrationStatus {
    pub fn is_registered(&self) -> bool {
        self.entry_exists
    }
}

/// Registers and unregisters URL scheme handlers for the current user.
///
/// Paths are resolved once at construction; a missing `HOME` fails there.
pub struct Registrar<R: CommandRunner = SystemCommandRunner> {
    config: Config,
    layout: Layout,
    runner: R,
    fs: StandardFileSystemProvider,
    events: EventSinkHandle,
}

impl Registrar {
    /// Creates a registrar for `config`, resolving paths through `resolver`.
    pub fn new(config: Config, resolver: &dyn PathResolver) -> ProtoregResult<Self> {
        let layout = config.layout(resolver)?;
        debug!(
            applications_dir = %layout.applications_dir.display(),
            default_apps_list = %layout.default_apps_list.display(),
            "resolved layout"
        );

        Ok(Self {
            config,
            layout,
            runner: SystemCommandRunner,
            fs: StandardFileSystemProvider,
            events: Arc::new(NullSink),
        })
    }

    /// Creates a registrar from the process environment and the user's config file.
    pub fn from_env() -> ProtoregResult<Self> {
        let resolver = SystemPathResolver;
        let config = Config::load(&resolver)?;
        Self::new(config, &resolver)
    }
}

impl<R: CommandRunner> Registrar<R> {
    /// Replaces the runner used for the binder and refresher programs.
    pub fn with_runner<T: CommandRunner>(self, runner: T) -> Registrar<T> {
        Registrar {
            config: self.config,
            layout: self.layout,
            runner,
            fs: self.fs,
            events: self.events,
        }
    }

    pub fn with_events(mut self, events: EventSinkHandle) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Path of the entry file for `id`, whether or not it exists.
    pub fn entry_path(&self, id: &str) -> ProtoregResult<PathBuf> {
        validate_id(id)?;
        Ok(self.layout.applications_dir.join(desktop_filename(id)))
    }

    fn database(&self) -> DesktopDatabase<'_, R> {
        DesktopDatabase::new(
            &self.runner,
            self.config.binder(),
            self.config.database_refresher(),
        )
    }

    fn emit(&self, event: RegistrationEvent) {
        self.events.emit(event);
    }

    fn report_failure<T>(&self, id: &str, result: ProtoregResult<T>) -> ProtoregResult<T> {
        if let Err(err) = &result {
            warn!(id = id, error = %err, "operation failed");
            self.emit(RegistrationEvent::OperationFailed {
                id: id.to_string(),
                error: err.to_string(),
            });
        }
        result
    }

    /// Installs the entry for `id` and makes it the default handler of its types.
    ///
    /// Validates `options`, writes `<id>-opener.desktop`, binds every scheme and literal MIME
    /// type to it and refreshes the desktop database. Registering an existing id replaces its
    /// entry.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before anything is written. A failed bind leaves the entry
    /// in place unless `rollback_on_bind_failure` is set.
    pub fn register(&self, id: &str, options: &RegistrationOptions) -> ProtoregResult<PathBuf> {
        let result = self.try_register(id, options);
        self.report_failure(id, result)
    }

    fn try_register(&self, id: &str, options: &RegistrationOptions) -> ProtoregResult<PathBuf> {
        let advance = |stage| {
            self.emit(RegistrationEvent::Registering {
                id: id.to_string(),
                stage,
            })
        };

        options.validate(id)?;
        advance(RegisterStage::Validated);

        let path = write_entry(&self.fs, &self.layout.applications_dir, id, options)?;
        advance(RegisterStage::EntryWritten { path: path.clone() });

        let filename = desktop_filename(id);
        let mimetypes = options.all_mimetypes();
        if let Err(err) = self.database().set_default(&filename, &mimetypes) {
            if self.config.rollback_on_bind_failure() {
                match self.fs.remove_file(&path) {
                    Ok(()) => advance(RegisterStage::RolledBack),
                    Err(rm_err) => {
                        warn!(path = %path.display(), error = %rm_err, "failed to roll back entry")
                    }
                }
            }
            return Err(err);
        }
        advance(RegisterStage::Bound { mimetypes });

        self.database().refresh(&self.layout.applications_dir)?;
        advance(RegisterStage::Refreshed);

        info!(id = id, path = %path.display(), "handler registered");
        advance(RegisterStage::Complete);
        Ok(path)
    }

    /// Removes the entry for `id` and every default association pointing at it.
    ///
    /// # Errors
    ///
    /// Fails with [`ProtoregError::NotRegistered`] if the entry file does not exist; the
    /// associations list is then left untouched (see
    /// [`purge_default_associations`](Self::purge_default_associations)). An unparsable list is
    /// an error; a missing list or section is not.
    pub fn unregister(&self, id: &str) -> ProtoregResult<UnregisterReport> {
        let result = self.try_unregister(id);
        self.report_failure(id, result)
    }

    fn try_unregister(&self, id: &str) -> ProtoregResult<UnregisterReport> {
        let advance = |stage| {
            self.emit(RegistrationEvent::Unregistering {
                id: id.to_string(),
                stage,
            })
        };

        let entry_path = self.entry_path(id)?;
        self.fs.remove_file(&entry_path).map_err(|err| {
            if err.is_not_found() {
                ProtoregError::NotRegistered {
                    id: id.to_string(),
                    path: entry_path.clone(),
                }
            } else {
                err.into()
            }
        })?;
        advance(UnregisterStage::EntryRemoved {
            path: entry_path.clone(),
        });

        let removed_defaults = mimeapps::scrub_default_associations(
            &self.fs,
            &self.layout.default_apps_list,
            &desktop_filename(id),
        )?;
        advance(UnregisterStage::AssociationsScrubbed {
            removed: removed_defaults.clone(),
        });

        if self.config.refresh_on_unregister() {
            self.database().refresh(&self.layout.applications_dir)?;
            advance(UnregisterStage::Refreshed);
        }

        info!(id = id, removed = removed_defaults.len(), "handler unregistered");
        advance(UnregisterStage::Complete);
        Ok(UnregisterReport {
            entry_path,
            removed_defaults,
        })
    }

    /// Removes default associations pointing at `id` without touching its entry file.
    ///
    /// Useful when the entry was deleted by other means and [`unregister`](Self::unregister)
    /// reports it as not registered.
    pub fn purge_default_associations(&self, id: &str) -> ProtoregResult<Vec<String>> {
        let result = validate_id(id)
            .map_err(ProtoregError::from)
            .and_then(|()| {
                mimeapps::scrub_default_associations(
                    &self.fs,
                    &self.layout.default_apps_list,
                    &desktop_filename(id),
                )
            });
        let removed = self.report_failure(id, result)?;

        self.emit(RegistrationEvent::AssociationsPurged {
            id: id.to_string(),
            removed: removed.clone(),
        });
        Ok(removed)
    }

    pub fn status(&self, id: &str) -> ProtoregResult<RegistrationStatus> {
        let entry_path = self.entry_path(id)?;
        let default_for = mimeapps::defaults_for(
            &self.fs,
            &self.layout.default_apps_list,
            &desktop_filename(id),
        )?;

        let entry_exists = self.fs.is_file(&entry_path)?;

        Ok(RegistrationStatus {
            entry_exists,
            entry_path,
            default_for,
        })
    }
}
