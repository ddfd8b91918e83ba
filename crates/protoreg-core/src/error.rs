//! Error types for protoreg-core.

use std::path::PathBuf;

use miette::Diagnostic;
use protoreg_config::error::ConfigError;
use protoreg_entry::EntryError;
use protoreg_utils::error::FileSystemError;
use thiserror::Error;

/// Core error type for handler registration.
#[derive(Error, Diagnostic, Debug)]
pub enum ProtoregError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystemError(#[from] FileSystemError),

    #[error("Handler '{id}' is not registered: {} does not exist", path.display())]
    #[diagnostic(
        code(protoreg::not_registered),
        help("Check the id, or use purge_default_associations to clean up leftover defaults")
    )]
    NotRegistered { id: String, path: PathBuf },

    #[error("Failed to launch `{program}`")]
    #[diagnostic(
        code(protoreg::command_launch),
        help("Make sure xdg-utils and desktop-file-utils are installed and on PATH")
    )]
    CommandLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` failed with exit code {}{}", code.map_or_else(|| "none".to_string(), |c| c.to_string()), format_stderr(stderr))]
    #[diagnostic(code(protoreg::command_failed))]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl ProtoregError {
    /// Returns `true` if the error was raised before anything was written.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Entry(err) if err.is_validation())
    }
}

pub type ProtoregResult<T> = std::result::Result<T, ProtoregError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = ProtoregError::CommandFailed {
            program: "xdg-mime".into(),
            code: Some(2),
            stderr: "xdg-mime: unknown mode\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "`xdg-mime` failed with exit code 2: xdg-mime: unknown mode"
        );

        let err = ProtoregError::CommandFailed {
            program: "update-desktop-database".into(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "`update-desktop-database` failed with exit code none"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(ProtoregError::Entry(EntryError::NoProtocols).is_validation());
        assert!(!ProtoregError::CommandFailed {
            program: "xdg-mime".into(),
            code: Some(1),
            stderr: String::new(),
        }
        .is_validation());
    }
}
