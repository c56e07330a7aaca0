use std::{env, path::PathBuf};

use crate::error::{PathError, PathResult};

pub trait PathResolver {
    /// Resolves a path string that may contain environment variables
    ///
    /// This method expands environment variables in the format `$VAR` or `${VAR}`, resolves tilde
    /// (`~`) to the user's home directory when it appears at the start of the path, and converts
    /// relative paths to absolute paths based on the current working directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::Empty`] if the path is empty
    /// * [`PathError::CurrentDir`] if the current directory cannot be determined
    /// * [`PathError::MissingEnvVar`] if the environment variables are undefined
    ///
    /// # Example
    ///
    /// ```
    /// use filekit_utils::error::PathResult;
    /// use filekit_utils::path::{PathResolver, SystemPathResolver};
    ///
    /// fn main() -> PathResult<()> {
    ///     let resolver = SystemPathResolver;
    ///     let resolved = resolver.resolve_path("/opt/file/bin/file")?;
    ///     assert!(resolved.is_absolute());
    ///     Ok(())
    /// }
    /// ```
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf>;

    /// Returns the user's home directory
    ///
    /// Checks `HOME`, then `USERPROFILE` (Windows), and falls back to the current directory.
    fn home_dir(&self) -> PathBuf;

    /// Returns the user's config directory following XDG Base Directory Specification
    ///
    /// This method checks the `XDG_CONFIG_HOME` environment variable. If not set, it defaults to
    /// `$HOME/.config`
    fn xdg_config_home(&self) -> PathBuf;

    /// Returns the user's data directory following XDG Base Directory Specification
    ///
    /// This method checks the `XDG_DATA_HOME` environment variable. If not set, it defaults to
    /// `$HOME/.local/share`
    fn xdg_data_home(&self) -> PathBuf;
}

/// The default [`PathResolver`] implementation using environment variables and filesystem calls.
pub struct SystemPathResolver;

impl PathResolver for SystemPathResolver {
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf> {
        let path = path.trim();

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let resolved = self.expand_variables(path)?;
        let path_buf = PathBuf::from(resolved);

        if path_buf.is_absolute() {
            Ok(path_buf)
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path_buf))
                .map_err(|err| PathError::CurrentDir { source: err })
        }
    }

    fn home_dir(&self) -> PathBuf {
        env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }

    fn xdg_config_home(&self) -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".config"))
    }

    fn xdg_data_home(&self) -> PathBuf {
        env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".local/share"))
    }
}

impl SystemPathResolver {
    fn expand_variables(&self, path: &str) -> PathResult<String> {
        let mut result = String::with_capacity(path.len());
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '$' => {
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        let var_name = self.consume_until(&mut chars, '}')?;
                        self.expand_env_var(&var_name, &mut result, path)?;
                    } else {
                        let var_name = self.consume_var_name(&mut chars);
                        if var_name.is_empty() {
                            result.push('$');
                        } else {
                            self.expand_env_var(&var_name, &mut result, path)?;
                        }
                    }
                }
                '~' if result.is_empty() => result.push_str(&self.home_dir().to_string_lossy()),
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    fn consume_until(
        &self,
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

    fn consume_var_name(&self, chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
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

    fn expand_env_var(
        &self,
        var_name: &str,
        result: &mut String,
        original: &str,
    ) -> PathResult<()> {
        match var_name {
            "HOME" => result.push_str(&self.home_dir().to_string_lossy()),
            "XDG_CONFIG_HOME" => result.push_str(&self.xdg_config_home().to_string_lossy()),
            "XDG_DATA_HOME" => result.push_str(&self.xdg_data_home().to_string_lossy()),
            _ => {
                let value = env::var(var_name).map_err(|_| {
                    PathError::MissingEnvVar {
                        input: original.into(),
                        var: var_name.into(),
                    }
                })?;
                result.push_str(&value);
            }
        }
        Ok(())
    }
}

/// Resolves a path string using the system path resolver.
///
/// See [`PathResolver::resolve_path`] for detailed documentation.
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    SystemPathResolver.resolve_path(path)
}

/// Returns the user's home directory using the system path resolver.
pub fn home_dir() -> PathBuf {
    SystemPathResolver.home_dir()
}

/// Returns the user's config directory using the system path resolver.
pub fn xdg_config_home() -> PathBuf {
    SystemPathResolver.xdg_config_home()
}

/// Returns the user's data directory using the system path resolver.
pub fn xdg_data_home() -> PathBuf {
    SystemPathResolver.xdg_data_home()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn setup_test_env(vars: &[(&str, &str)]) {
        for (var, value) in vars {
            env::set_var(var, value);
        }
    }

    fn cleanup_test_env(vars: &[&str]) {
        for key in vars {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_expand_variables_simple() {
        setup_test_env(&[("FILEKIT_TEST_VAR", "test_value")]);
        let resolver = SystemPathResolver;
        let result = resolver.expand_variables("$FILEKIT_TEST_VAR/path").unwrap();
        assert_eq!(result, "test_value/path");
        cleanup_test_env(&["FILEKIT_TEST_VAR"]);
    }

    #[test]
    #[serial]
    fn test_expand_variables_braces() {
        setup_test_env(&[("FILEKIT_TEST_VAR", "test_value")]);
        let resolver = SystemPathResolver;
        let result = resolver
            .expand_variables("${FILEKIT_TEST_VAR}/path")
            .unwrap();
        assert_eq!(result, "test_value/path");
        cleanup_test_env(&["FILEKIT_TEST_VAR"]);
    }

    #[test]
    fn test_expand_variables_unclosed() {
        let resolver = SystemPathResolver;
        let result = resolver.expand_variables("${FILEKIT_TEST_VAR");
        assert!(matches!(result, Err(PathError::UnclosedVariable { .. })));
    }

    #[test]
    fn test_expand_variables_missing_var() {
        let resolver = SystemPathResolver;
        let result = resolver.expand_variables("$THIS_VAR_DOESNT_EXIST");
        assert!(matches!(result, Err(PathError::MissingEnvVar { .. })));
    }

    #[test]
    fn test_expand_variables_lone_dollar() {
        let resolver = SystemPathResolver;
        assert_eq!(resolver.expand_variables("a$/b").unwrap(), "a$/b");
    }

    #[test]
    #[serial]
    fn test_xdg_directories() {
        setup_test_env(&[("HOME", "/tmp/home")]);
        cleanup_test_env(&["XDG_CONFIG_HOME", "XDG_DATA_HOME"]);

        let resolver = SystemPathResolver;
        let home = resolver.home_dir();
        assert_eq!(home, PathBuf::from("/tmp/home"));
        assert_eq!(resolver.xdg_config_home(), home.join(".config"));
        assert_eq!(resolver.xdg_data_home(), home.join(".local/share"));

        setup_test_env(&[
            ("XDG_CONFIG_HOME", "/tmp/config"),
            ("XDG_DATA_HOME", "/tmp/data"),
        ]);
        assert_eq!(resolver.xdg_config_home(), PathBuf::from("/tmp/config"));
        assert_eq!(resolver.xdg_data_home(), PathBuf::from("/tmp/data"));

        cleanup_test_env(&["XDG_CONFIG_HOME", "XDG_DATA_HOME"]);
    }

    #[test]
    #[serial]
    fn test_resolve_path() {
        setup_test_env(&[("HOME", "/tmp/home")]);
        let resolver = SystemPathResolver;

        assert!(matches!(resolver.resolve_path("  "), Err(PathError::Empty)));
        assert_eq!(
            resolver.resolve_path("/absolute/path").unwrap(),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            resolver.resolve_path("~/win32").unwrap(),
            PathBuf::from("/tmp/home/win32")
        );

        let relative = resolver.resolve_path("relative/file").unwrap();
        assert_eq!(relative, env::current_dir().unwrap().join("relative/file"));
    }
}
