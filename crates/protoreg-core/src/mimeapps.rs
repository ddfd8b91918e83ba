//! Maintenance of the user's default associations list (`mimeapps.list`).

use std::path::Path;

use protoreg_entry::KeyFile;
use protoreg_utils::fs::FileSystemProvider;
use tracing::{debug, trace};

use crate::error::ProtoregResult;

pub const DEFAULT_APPLICATIONS_SECTION: &str = "Default Applications";

fn load<F: FileSystemProvider>(fs: &F, path: &Path) -> ProtoregResult<Option<KeyFile>> {
    let Some(content) = fs.read_optional(path)? else {
        trace!(path = %path.display(), "no default associations list");
        return Ok(None);
    };
    Ok(Some(KeyFile::parse(&content)?))
}

/// Removes every default association whose handler is `filename`.
///
/// A missing list or a list without a `[Default Applications]` section is left alone. The file is
/// only rewritten when something was removed.
///
/// # Returns
///
/// The MIME types that no longer have a default, in file order.
pub fn scrub_default_associations<F: FileSystemProvider>(
    fs: &F,
    path: &Path,
    filename: &str,
) -> ProtoregResult<Vec<String>> {
    let Some(mut list) = load(fs, path)? else {
        return Ok(Vec::new());
    };

    let mut removed = Vec::new();
    for section in list.sections_named_mut(DEFAULT_APPLICATIONS_SECTION) {
        removed.extend(section.remove_where(|_, value| value.trim() == filename));
    }

    if removed.is_empty() {
        trace!(path = %path.display(), filename = filename, "no associations to scrub");
        return Ok(removed);
    }

    fs.write_atomic(path, list.to_string().as_bytes())?;
    debug!(
        path = %path.display(),
        filename = filename,
        removed = removed.len(),
        "default associations scrubbed"
    );
    Ok(removed)
}

/// MIME types whose default handler is `filename`.
pub fn defaults_for<F: FileSystemProvider>(
    fs: &F,
    path: &Path,
    filename: &str,
) -> ProtoregResult<Vec<String>> {
    let Some(list) = load(fs, path)? else {
        return Ok(Vec::new());
    };

    Ok(list
        .sections()
        .iter()
        .filter(|section| section.name() == DEFAULT_APPLICATIONS_SECTION)
        .flat_map(|section| section.entries())
        .filter(|(_, value)| value.trim() == filename)
        .map(|(key, _)| key.to_string())
        .collect())
}
