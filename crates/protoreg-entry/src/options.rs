//! The application description a handler is registered from.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EntryError, Result};

/// Suffix appended to a registration id to form its desktop entry file name.
pub const DESKTOP_FILE_SUFFIX: &str = "-opener.desktop";

/// Prefix of the synthetic MIME type a URL scheme is routed through.
pub const SCHEME_HANDLER_PREFIX: &str = "x-scheme-handler/";

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*$").unwrap());
static ACTION_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-]+$").unwrap());

/// Returns the desktop entry file name for a registration id.
///
/// The mapping is deterministic: registering the same id again targets the same file.
pub fn desktop_filename(id: &str) -> String {
    format!("{id}{DESKTOP_FILE_SUFFIX}")
}

/// Checks that `id` can name a registration and become part of a file name.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(EntryError::EmptyId);
    }
    if id == "." || id == ".." || id.contains(['/', '\0']) || has_line_break(id) {
        return Err(EntryError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Display metadata of the registered application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Metadata {
    /// Name shown by the desktop.
    pub name: String,
    /// Description.
    pub comment: String,
    /// Icon name or absolute path.
    pub icon: String,
    /// Menu categories, written `;`-joined.
    pub categories: Vec<String>,
}

/// An additional command exposed on the same entry, e.g. in a right-click menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Action {
    /// Identifier used in the `[Desktop Action <id>]` header.
    pub id: String,
    pub name: String,
    pub exec: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_exec: Option<String>,
    /// Hide the action from menus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_display: Option<bool>,
}

impl Action {
    pub fn new(id: impl Into<String>, name: impl Into<String>, exec: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            exec: exec.into(),
            try_exec: None,
            no_display: None,
        }
    }

    pub fn try_exec(mut self, try_exec: impl Into<String>) -> Self {
        self.try_exec = Some(try_exec.into());
        self
    }

    pub fn no_display(mut self, no_display: bool) -> Self {
        self.no_display = Some(no_display);
        self
    }
}

/// Everything needed to register an application as a URL handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationOptions {
    pub metadata: Metadata,

    /// Command template; `%u`/`%U` receives the opened URL.
    pub exec: String,

    /// URL schemes without `://`, e.g. `myapp`.
    pub protocols: Vec<String>,

    /// Literal MIME types handled in addition to the schemes.
    pub mimetypes: Vec<String>,

    pub actions: Vec<Action>,

    /// Accept an `exec` without a URL placeholder.
    pub no_url_arg_necessary: bool,
}

impl RegistrationOptions {
    pub fn new(exec: impl Into<String>) -> Self {
        Self {
            exec: exec.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = name.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.metadata.comment = comment.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.metadata.icon = icon.into();
        self
    }

    pub fn add_category(mut self, category: impl Into<String>) -> Self {
        self.metadata.categories.push(category.into());
        self
    }

    pub fn add_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    pub fn add_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetypes.push(mimetype.into());
        self
    }

    pub fn add_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn no_url_arg_necessary(mut self, value: bool) -> Self {
        self.no_url_arg_necessary = value;
        self
    }

    /// Returns the scheme handler types followed by the literal MIME types, each in input order.
    ///
    /// This is the order passed to the binder and written to `MimeType`.
    pub fn all_mimetypes(&self) -> Vec<String> {
        self.protocols
            .iter()
            .map(|protocol| format!("{SCHEME_HANDLER_PREFIX}{protocol}"))
            .chain(self.mimetypes.iter().cloned())
            .collect()
    }

    /// Validates the options for registration under `id`.
    ///
    /// Nothing is touched on disk; callers run this before creating any file or directory.
    ///
    /// # Errors
    ///
    /// Checks run in this order and the first failure is returned:
    ///
    /// * [`EntryError::EmptyId`] / [`EntryError::InvalidId`]
    /// * [`EntryError::NoProtocols`]
    /// * [`EntryError::EmptyExec`]
    /// * [`EntryError::MissingUrlPlaceholder`] unless `no_url_arg_necessary` is set
    /// * [`EntryError::InvalidProtocol`], [`EntryError::InvalidMimetype`]
    /// * [`EntryError::InvalidAction`], [`EntryError::DuplicateAction`]
    /// * [`EntryError::MultilineValue`]
    pub fn validate(&self, id: &str) -> Result<()> {
        validate_id(id)?;

        if self.protocols.is_empty() {
            return Err(EntryError::NoProtocols);
        }

        if self.exec.is_empty() {
            return Err(EntryError::EmptyExec);
        }
        if !self.no_url_arg_necessary && !self.exec.contains("%u") && !self.exec.contains("%U") {
            return Err(EntryError::MissingUrlPlaceholder);
        }

        if let Some(protocol) = self.protocols.iter().find(|p| !SCHEME_RE.is_match(p)) {
            return Err(EntryError::InvalidProtocol(protocol.clone()));
        }
        if let Some(mimetype) = self.mimetypes.iter().find(|m| !is_valid_mimetype(m)) {
            return Err(EntryError::InvalidMimetype(mimetype.clone()));
        }

        let mut seen = HashSet::new();
        for action in &self.actions {
            if !ACTION_ID_RE.is_match(&action.id) {
                return Err(EntryError::InvalidAction {
                    id: action.id.clone(),
                    reason: "identifiers may only contain ASCII letters, digits and `-`",
                });
            }
            if action.name.is_empty() {
                return Err(EntryError::InvalidAction {
                    id: action.id.clone(),
                    reason: "name must not be empty",
                });
            }
            if action.exec.is_empty() {
                return Err(EntryError::InvalidAction {
                    id: action.id.clone(),
                    reason: "exec must not be empty",
                });
            }
            if !seen.insert(action.id.as_str()) {
                return Err(EntryError::DuplicateAction(action.id.clone()));
            }
        }

        self.check_single_line()
    }

    fn check_single_line(&self) -> Result<()> {
        let metadata = &self.metadata;
        let mut values: Vec<(&str, &str)> = vec![
            ("Name", metadata.name.as_str()),
            ("Comment", metadata.comment.as_str()),
            ("Icon", metadata.icon.as_str()),
            ("Exec", self.exec.as_str()),
        ];
        values.extend(metadata.categories.iter().map(|c| ("Categories", c.as_str())));
        for action in &self.actions {
            values.push(("Name", action.name.as_str()));
            values.push(("Exec", action.exec.as_str()));
            if let Some(try_exec) = &action.try_exec {
                values.push(("TryExec", try_exec.as_str()));
            }
        }

        match values.into_iter().find(|(_, value)| has_line_break(value)) {
            Some((key, _)) => {
                Err(EntryError::MultilineValue {
                    key: key.to_string(),
                })
            }
            None => Ok(()),
        }
    }
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\n', '\r'])
}

fn is_valid_mimetype(mimetype: &str) -> bool {
    match mimetype.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && !subtype.is_empty()
                && !mimetype.contains(|c: char| c == ';' || c.is_whitespace())
        }
        None => false,
    }
}
