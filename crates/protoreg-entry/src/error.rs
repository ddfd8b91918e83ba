//! Error types for the entry crate.

use miette::Diagnostic;
use protoreg_utils::error::FileSystemError;
use thiserror::Error;

/// Errors that can occur while validating options or building an entry.
#[derive(Error, Diagnostic, Debug)]
pub enum EntryError {
    #[error("you must specify a non-empty id that is a unique identifier for this registration")]
    #[diagnostic(code(protoreg_entry::empty_id))]
    EmptyId,

    #[error("invalid registration id `{0}`")]
    #[diagnostic(
        code(protoreg_entry::invalid_id),
        help("The id becomes part of a file name: it must not contain `/` or NUL, or be `.`/`..`")
    )]
    InvalidId(String),

    #[error("you must specify at least one protocol")]
    #[diagnostic(code(protoreg_entry::no_protocols))]
    NoProtocols,

    #[error("invalid protocol `{0}`")]
    #[diagnostic(
        code(protoreg_entry::invalid_protocol),
        help("A scheme starts with a letter followed by letters, digits, `+`, `-` or `.`; omit `://`")
    )]
    InvalidProtocol(String),

    #[error("invalid mimetype `{0}`")]
    #[diagnostic(
        code(protoreg_entry::invalid_mimetype),
        help("Use a `type/subtype` pair without `;` or whitespace, e.g. `text/html`")
    )]
    InvalidMimetype(String),

    #[error(
        "you must specify a command for Exec, it will be executed when your application is \
         called via custom url"
    )]
    #[diagnostic(code(protoreg_entry::empty_exec))]
    EmptyExec,

    #[error("you have not specified %u or %U in your Exec command")]
    #[diagnostic(
        code(protoreg_entry::missing_url_placeholder),
        help(
            "%u/%U is the placeholder for the url your application is called with; if you meant \
             to omit it set `no_url_arg_necessary`"
        )
    )]
    MissingUrlPlaceholder,

    #[error("invalid action `{id}`: {reason}")]
    #[diagnostic(code(protoreg_entry::invalid_action))]
    InvalidAction { id: String, reason: &'static str },

    #[error("action `{0}` is declared more than once")]
    #[diagnostic(code(protoreg_entry::duplicate_action))]
    DuplicateAction(String),

    #[error("value of `{key}` contains a line break")]
    #[diagnostic(
        code(protoreg_entry::multiline_value),
        help("Desktop entry values are single lines")
    )]
    MultilineValue { key: String },

    #[error("malformed line {line}: {content}")]
    #[diagnostic(
        code(protoreg_entry::parse),
        help("Expected a `[Section]` header, a comment, a blank line or `key=value`")
    )]
    Parse { line: usize, content: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),
}

impl EntryError {
    /// Returns `true` for errors raised before anything was written.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Parse { .. } | Self::FileSystem(_))
    }
}

/// A specialized Result type for entry operations.
pub type Result<T> = std::result::Result<T, EntryError>;
