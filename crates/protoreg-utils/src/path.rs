use std::{collections::HashMap, env, path::PathBuf};

use crate::error::{PathError, PathResult};

pub trait PathResolver {
    /// Looks up a variable in the environment this resolver represents.
    ///
    /// Empty values are treated as unset.
    fn var(&self, name: &str) -> Option<String>;

    /// Returns the user's home directory
    ///
    /// This method reads the `HOME` variable. There is no fallback to a guessed directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::MissingHome`] if `HOME` is unset or empty
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use protoreg_utils::path::{EnvPathResolver, PathResolver};
    ///
    /// let resolver = EnvPathResolver::new().with_var("HOME", "/home/alice");
    /// assert_eq!(resolver.home_dir().unwrap(), PathBuf::from("/home/alice"));
    /// ```
    fn home_dir(&self) -> PathResult<PathBuf> {
        self.var("HOME")
            .map(PathBuf::from)
            .ok_or(PathError::MissingHome)
    }

    /// Returns the user's config directory following XDG Base Directory Specification
    ///
    /// This method checks the `XDG_CONFIG_HOME` variable. If it is not set or not absolute, it
    /// defaults to `$HOME/.config`. `HOME` must be set either way.
    fn xdg_config_home(&self) -> PathResult<PathBuf> {
        let home = self.home_dir()?;
        Ok(self
            .var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|path| path.is_absolute())
            .unwrap_or_else(|| home.join(".config")))
    }

    /// Returns the user's data directory following XDG Base Directory Specification
    ///
    /// This method checks the `XDG_DATA_HOME` variable. If it is not set or not absolute, it
    /// defaults to `$HOME/.local/share`. `HOME` must be set either way.
    fn xdg_data_home(&self) -> PathResult<PathBuf> {
        let home = self.home_dir()?;
        Ok(self
            .var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .filter(|path| path.is_absolute())
            .unwrap_or_else(|| home.join(".local/share")))
    }

    /// Resolves a path string that may contain environment variables
    ///
    /// This method expands variables in the format `$VAR` or `${VAR}`, resolves tilde (`~`) to
    /// the user's home directory when it appears at the start of the path, and converts relative
    /// paths to absolute paths based on the current working directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::Empty`] if the path is empty
    /// * [`PathError::CurrentDir`] if the current directory cannot be determined
    /// * [`PathError::MissingEnvVar`] if a referenced variable is undefined
    /// * [`PathError::UnclosedVariable`] if a `${` is never closed
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf> {
        let path = path.trim();

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let resolved = expand_variables(self, path)?;
        let path_buf = PathBuf::from(resolved);

        if path_buf.is_absolute() {
            Ok(path_buf)
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path_buf))
                .map_err(|err| PathError::CurrentDir { source: err })
        }
    }
}

/// The default [`PathResolver`] implementation, backed by the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPathResolver;

impl PathResolver for SystemPathResolver {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok().filter(|value| !value.is_empty())
    }
}

/// A [`PathResolver`] backed by an explicit variable map.
///
/// Hosts that already know the target user's environment, and tests, use this instead of the
/// process environment.
#[derive(Debug, Default, Clone)]
pub struct EnvPathResolver {
    vars: HashMap<String, String>,
}

impl EnvPathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver whose only variable is `HOME`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self::new().with_var("HOME", home.to_string_lossy())
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl PathResolver for EnvPathResolver {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|value| !value.is_empty()).cloned()
    }
}

fn expand_variables<R: PathResolver + ?Sized>(resolver: &R, path: &str) -> PathResult<String> {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let var_name = consume_until(&mut chars, '}')?;
                    expand_env_var(resolver, &var_name, &mut result, path)?;
                } else {
                    let var_name = consume_var_name(&mut chars);
                    if var_name.is_empty() {
                        result.push('$');
                    } else {
                        expand_env_var(resolver, &var_name, &mut result, path)?;
                    }
                }
            }
            '~' if result.is_empty() => {
                result.push_str(&resolver.home_dir()?.to_string_lossy());
            }
            _ => result.push(c),
        }
    }

    Ok(result)
}

fn consume_until(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    delimiter: char,
) -> PathResult<String> {
    let mut var_name = String::new();

    for c in chars.by_ref() {
        if c == delimiter {
            return Ok(var_name);
        }
        var_name.push(c);
    }

    Err(PathError::UnclosedVariable {
        input: format!("${{{var_name}"),
    })
}

fn consume_var_name(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut var_name = String::new();

    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            var_name.push(c);
            chars.next();
        } else {
            break;
        }
    }

    var_name
}

fn expand_env_var<R: PathResolver + ?Sized>(
    resolver: &R,
    var_name: &str,
    result: &mut String,
    original: &str,
) -> PathResult<()> {
    let value = match var_name {
        "HOME" => resolver.home_dir()?,
        "XDG_CONFIG_HOME" => resolver.xdg_config_home()?,
        "XDG_DATA_HOME" => resolver.xdg_data_home()?,
        _ => {
            let value = resolver
                .var(var_name)
                .ok_or_else(|| PathError::MissingEnvVar {
                    input: original.into(),
                    var: var_name.into(),
                })?;
            PathBuf::from(value)
        }
    };
    result.push_str(&value.to_string_lossy());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn resolver() -> EnvPathResolver {
        EnvPathResolver::with_home("/tmp/home").with_var("TEST_VAR", "test_value")
    }

    #[test]
    fn test_home_dir_missing() {
        let resolver = EnvPathResolver::new();
        assert!(matches!(resolver.home_dir(), Err(PathError::MissingHome)));
        assert!(matches!(
            resolver.xdg_data_home(),
            Err(PathError::MissingHome)
        ));
        assert!(matches!(
            resolver.xdg_config_home(),
            Err(PathError::MissingHome)
        ));
    }

    #[test]
    fn test_home_dir_empty_is_missing() {
        let resolver = EnvPathResolver::new().with_var("HOME", "");
        assert!(matches!(resolver.home_dir(), Err(PathError::MissingHome)));
    }

    #[test]
    fn test_xdg_directories_default() {
        let resolver = resolver();
        assert_eq!(
            resolver.xdg_data_home().unwrap(),
            PathBuf::from("/tmp/home/.local/share")
        );
        assert_eq!(
            resolver.xdg_config_home().unwrap(),
            PathBuf::from("/tmp/home/.config")
        );
    }

    #[test]
    fn test_xdg_directories_override() {
        let resolver = resolver()
            .with_var("XDG_DATA_HOME", "/tmp/data")
            .with_var("XDG_CONFIG_HOME", "/tmp/config");
        assert_eq!(resolver.xdg_data_home().unwrap(), PathBuf::from("/tmp/data"));
        assert_eq!(
            resolver.xdg_config_home().unwrap(),
            PathBuf::from("/tmp/config")
        );
    }

    #[test]
    fn test_xdg_relative_override_is_ignored() {
        let resolver = resolver().with_var("XDG_DATA_HOME", "relative/data");
        assert_eq!(
            resolver.xdg_data_home().unwrap(),
            PathBuf::from("/tmp/home/.local/share")
        );
    }

    #[test]
    fn test_expand_variables_simple() {
        let result = expand_variables(&resolver(), "$TEST_VAR/path").unwrap();
        assert_eq!(result, "test_value/path");
    }

    #[test]
    fn test_expand_variables_braces() {
        let result = expand_variables(&resolver(), "${TEST_VAR}/path").unwrap();
        assert_eq!(result, "test_value/path");
    }

    #[test]
    fn test_expand_variables_missing_braces() {
        let result = expand_variables(&resolver(), "${TEST_VAR");
        assert!(matches!(result, Err(PathError::UnclosedVariable { .. })));
    }

    #[test]
    fn test_expand_variables_missing_var() {
        let result = expand_variables(&resolver(), "$THIS_VAR_DOESNT_EXIST");
        assert!(matches!(result, Err(PathError::MissingEnvVar { .. })));
    }

    #[test]
    fn test_expand_lone_dollar() {
        let result = expand_variables(&resolver(), "/tmp/$/x").unwrap();
        assert_eq!(result, "/tmp/$/x");
    }

    #[test]
    fn test_resolve_path() {
        let resolver = resolver();

        assert!(matches!(resolver.resolve_path(""), Err(PathError::Empty)));
        assert_eq!(
            resolver.resolve_path("/absolute/path").unwrap(),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            resolver.resolve_path("~/apps").unwrap(),
            PathBuf::from("/tmp/home/apps")
        );
        assert_eq!(
            resolver.resolve_path("$XDG_CONFIG_HOME/mimeapps.list").unwrap(),
            PathBuf::from("/tmp/home/.config/mimeapps.list")
        );

        let expected_relative = env::current_dir().unwrap().join("relative/path");
        assert_eq!(
            resolver.resolve_path("relative/path").unwrap(),
            expected_relative
        );
    }

    #[test]
    #[serial]
    fn test_system_resolver_reads_process_env() {
        let old = env::var("HOME").ok();
        env::set_var("HOME", "/tmp/system-home");

        assert_eq!(
            SystemPathResolver.home_dir().unwrap(),
            PathBuf::from("/tmp/system-home")
        );

        env::remove_var("HOME");
        assert!(matches!(
            SystemPathResolver.home_dir(),
            Err(PathError::MissingHome)
        ));

        if let Some(home) = old {
            env::set_var("HOME", home);
        }
    }
}
