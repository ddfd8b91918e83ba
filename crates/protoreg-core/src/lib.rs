//! Register applications as URL scheme handlers on Linux desktops.
//!
//! A [`Registrar`] installs `<id>-opener.desktop` into the user's applications directory, makes
//! it the default handler for `x-scheme-handler/<scheme>` (and any extra MIME types) through
//! `xdg-mime`, and refreshes the desktop database. Unregistering deletes the entry and scrubs the
//! user's `mimeapps.list`.
//!
//! # Example
//!
//! ```no_run
//! use protoreg_core::{Registrar, RegistrationOptions};
//!
//! fn main() -> protoreg_core::ProtoregResult<()> {
//!     let registrar = Registrar::from_env()?;
//!     let options = RegistrationOptions::new("myapp --open %u")
//!         .name("My App")
//!         .add_protocol("myapp");
//!
//!     registrar.register("myapp", &options)?;
//!     registrar.unregister("myapp")?;
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod exec;
pub mod mimeapps;
mod registrar;

pub use error::{ProtoregError, ProtoregResult};
pub use exec::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use protoreg_config::{Config, Layout};
pub use protoreg_entry::{Action, Metadata, RegistrationOptions};
pub use registrar::{Registrar, RegistrationStatus, UnregisterReport};
