use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[error("Failed to get current directory: {source}")]
    #[diagnostic(code(protoreg_utils::path::current_dir))]
    CurrentDir { source: std::io::Error },

    #[error("Path is empty")]
    #[diagnostic(code(protoreg_utils::path::empty))]
    Empty,

    #[error("Environment variable not set: $HOME")]
    #[diagnostic(
        code(protoreg_utils::path::missing_home),
        help("Set HOME to the user's home directory before registering handlers")
    )]
    MissingHome,

    #[error("Environment variable `{var}` not set in `{input}`")]
    #[diagnostic(code(protoreg_utils::path::missing_env_var))]
    MissingEnvVar { var: String, input: String },

    #[error("Unclosed variable expression starting at `{input}`")]
    #[diagnostic(code(protoreg_utils::path::unclosed_variable))]
    UnclosedVariable { input: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum FileSystemError {
    #[error("Failed to {action} file `{}`: {source}", path.display())]
    #[diagnostic(
        code(protoreg_utils::fs::file),
        help("Check file permissions and available disk space")
    )]
    File {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to {action} directory `{}`: {source}", path.display())]
    #[diagnostic(
        code(protoreg_utils::fs::directory),
        help("Check directory permissions")
    )]
    Directory {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not a directory", path.display())]
    #[diagnostic(code(protoreg_utils::fs::not_a_directory))]
    NotADirectory { path: PathBuf },

    #[error("`{}` has no parent directory", path.display())]
    #[diagnostic(code(protoreg_utils::fs::no_parent))]
    NoParent { path: PathBuf },
}

impl FileSystemError {
    /// Returns `true` if the underlying I/O error is [`std::io::ErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            FileSystemError::File { source, .. } | FileSystemError::Directory { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum UtilsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),
}

pub type FileSystemResult<T> = std::result::Result<T, FileSystemError>;
pub type PathResult<T> = std::result::Result<T, PathError>;

pub type UtilsResult<T> = std::result::Result<T, UtilsError>;
