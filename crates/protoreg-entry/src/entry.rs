//! Desktop entry generation and installation.

use std::path::{Path, PathBuf};

use protoreg_utils::fs::{FileSystemProvider, USER_DIR_MODE};
use tracing::{debug, trace};

use crate::{
    error::Result,
    keyfile::{KeyFile, Section},
    options::{desktop_filename, RegistrationOptions},
};

pub const DESKTOP_ENTRY_SECTION: &str = "Desktop Entry";

/// Header of the section describing a secondary action.
pub fn action_section_name(action_id: &str) -> String {
    format!("Desktop Action {action_id}")
}

/// Builds the entry document for validated options.
///
/// The main section always carries the same keys in the same order; `Actions` is added only
/// when secondary actions exist, followed by one section per action.
pub fn build_entry(options: &RegistrationOptions) -> KeyFile {
    let metadata = &options.metadata;
    let mut document = KeyFile::new();

    let main = document.add_section(Section::new(DESKTOP_ENTRY_SECTION));
    main.set("Type", "Application")
        .set("StartupNotify", "false")
        .set("Name", &metadata.name)
        .set("Comment", &metadata.comment)
        .set("Icon", &metadata.icon)
        .set("Exec", &options.exec)
        .set("Categories", metadata.categories.join(";"))
        .set("MimeType", options.all_mimetypes().join(";"));

    if !options.actions.is_empty() {
        let ids: String = options
            .actions
            .iter()
            .map(|action| format!("{};", action.id))
            .collect();
        main.set("Actions", ids);
    }

    for action in &options.actions {
        let section = document.add_section(Section::new(action_section_name(&action.id)));
        section.set("Name", &action.name).set("Exec", &action.exec);
        if let Some(try_exec) = &action.try_exec {
            section.set("TryExec", try_exec);
        }
        if let Some(no_display) = action.no_display {
            section.set("NoDisplay", no_display.to_string());
        }
    }

    document
}

/// Writes the entry for `id` into `applications_dir`, creating the directory if needed.
///
/// Any previous entry with the same id is replaced. The caller is expected to have run
/// [`RegistrationOptions::validate`]; this function performs no validation of its own.
///
/// # Returns
///
/// The path of the written entry.
///
/// # Errors
///
/// Returns [`crate::EntryError::FileSystem`] if the directory cannot be created or the file
/// cannot be written.
pub fn write_entry<F: FileSystemProvider>(
    fs: &F,
    applications_dir: &Path,
    id: &str,
    options: &RegistrationOptions,
) -> Result<PathBuf> {
    fs.ensure_dir_exists(applications_dir, USER_DIR_MODE)?;

    let path = applications_dir.join(desktop_filename(id));
    let content = build_entry(options).to_string();
    trace!(path = %path.display(), bytes = content.len(), "writing desktop entry");

    fs.write_atomic(&path, content.as_bytes())?;
    debug!(id = id, path = %path.display(), "desktop entry written");
    Ok(path)
}
