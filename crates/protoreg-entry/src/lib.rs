//! Desktop entry construction for protoreg.
//!
//! This crate turns a [`RegistrationOptions`] description into the `[Desktop Entry]` document
//! installed for a URL handler, and provides the literal [`KeyFile`] codec used for both entries
//! and the user's `mimeapps.list`.
//!
//! # Example
//!
//! ```
//! use protoreg_entry::{build_entry, RegistrationOptions};
//!
//! let options = RegistrationOptions::new("myapp %u")
//!     .name("My App")
//!     .add_protocol("myapp");
//! options.validate("myapp").unwrap();
//!
//! let entry = build_entry(&options).to_string();
//! assert!(entry.contains("MimeType=x-scheme-handler/myapp\n"));
//! ```

pub mod entry;
pub mod error;
pub mod keyfile;
pub mod options;

pub use entry::{build_entry, write_entry, DESKTOP_ENTRY_SECTION};
pub use error::{EntryError, Result};
pub use keyfile::{KeyFile, LineEnding, Section};
pub use options::{desktop_filename, validate_id, Action, Metadata, RegistrationOptions};
