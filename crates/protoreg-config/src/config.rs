use std::path::{Path, PathBuf};

use protoreg_utils::{fs::read_optional, path::PathResolver};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ConfigError, Result};

/// Program that records default handlers in the user's associations list.
pub const DEFAULT_BINDER: &str = "xdg-mime";

/// Program that rebuilds the MIME cache of an applications directory.
pub const DEFAULT_DATABASE_REFRESHER: &str = "update-desktop-database";

/// Environment variable pointing at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "PROTOREG_CONFIG";

/// Registration settings
///
/// Every field is optional; a missing file or key falls back to the defaults below.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Program invoked as `<binder> default <entry> <mimetype...>`.
    /// Default: xdg-mime
    pub binder: Option<String>,

    /// Program invoked with the applications directory after an entry changes.
    /// Default: update-desktop-database
    pub database_refresher: Option<String>,

    /// Directory desktop entries are installed into.
    /// Default: $XDG_DATA_HOME/applications
    pub applications_dir: Option<String>,

    /// The user's default associations list.
    /// Default: $XDG_CONFIG_HOME/mimeapps.list
    pub default_apps_list: Option<String>,

    /// If true, a failed bind step removes the entry file it just wrote.
    /// Default: false
    pub rollback_on_bind_failure: Option<bool>,

    /// If true, the desktop database is refreshed after an entry is removed.
    /// Default: true
    pub refresh_on_unregister: Option<bool>,
}

/// Concrete locations a registrar works with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub applications_dir: PathBuf,
    pub default_apps_list: PathBuf,
}

impl Layout {
    /// Layout rooted at `home` using the XDG fallbacks, ignoring any environment overrides.
    pub fn from_home<P: AsRef<Path>>(home: P) -> Self {
        let home = home.as_ref();
        Self {
            applications_dir: home.join(".local/share/applications"),
            default_apps_list: home.join(".config/mimeapps.list"),
        }
    }
}

impl Config {
    /// Location of the config file: `$PROTOREG_CONFIG`, else
    /// `$XDG_CONFIG_HOME/protoreg/config.toml`.
    pub fn config_path(resolver: &dyn PathResolver) -> Result<PathBuf> {
        match resolver.var(CONFIG_PATH_ENV) {
            Some(path) => Ok(resolver.resolve_path(&path)?),
            None => Ok(resolver.xdg_config_home()?.join("protoreg").join("config.toml")),
        }
    }

    /// Loads the config file found through `resolver`, or the defaults if there is none.
    pub fn load(resolver: &dyn PathResolver) -> Result<Self> {
        let path = Self::config_path(resolver)?;
        Self::load_from(&path)
    }

    /// Loads a config file, returning the defaults if it does not exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match read_optional(path)? {
            Some(content) => {
                debug!(path = %path.display(), "loading config");
                Self::from_toml_str(&content)
            }
            None => {
                trace!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("binder", &self.binder),
            ("database_refresher", &self.database_refresher),
            ("applications_dir", &self.applications_dir),
            ("default_apps_list", &self.default_apps_list),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::EmptyField { field });
            }
        }
        Ok(())
    }

    pub fn binder(&self) -> &str {
        self.binder.as_deref().unwrap_or(DEFAULT_BINDER)
    }

    pub fn database_refresher(&self) -> &str {
        self.database_refresher
            .as_deref()
            .unwrap_or(DEFAULT_DATABASE_REFRESHER)
    }

    pub fn rollback_on_bind_failure(&self) -> bool {
        self.rollback_on_bind_failure.unwrap_or(false)
    }

    pub fn refresh_on_unregister(&self) -> bool {
        self.refresh_on_unregister.unwrap_or(true)
    }

    /// Resolves the directories and files a registrar touches.
    ///
    /// # Errors
    ///
    /// Fails with [`protoreg_utils::error::PathError::MissingHome`] when `HOME` is not set, even
    /// if every path is overridden.
    pub fn layout(&self, resolver: &dyn PathResolver) -> Result<Layout> {
        resolver.home_dir()?;

        let applications_dir = match &self.applications_dir {
            Some(dir) => resolver.resolve_path(dir)?,
            None => resolver.xdg_data_home()?.join("applications"),
        };

        let default_apps_list = match &self.default_apps_list {
            Some(file) => resolver.resolve_path(file)?,
            None => resolver.xdg_config_home()?.join("mimeapps.list"),
        };

        Ok(Layout {
            applications_dir,
            default_apps_list,
        })
    }
}
