//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::{config_file_names, user_config_path};
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find a project configuration file in the directory or its parents.
///
/// The first name from [`config_file_names`] found at the deepest level wins.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.is_file() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no project config file found");
    None
}

/// Load configuration from directory (searching parent directories), then
/// from the per-user configuration file
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir)
        .or_else(|| user_config_path().filter(|p| p.is_file()))
        .ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration or use defaults.
///
/// A configuration file that exists but fails to parse or validate is an
/// error; only a missing file falls back to defaults.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match load_config_from_dir(dir) {
        Ok((config, path)) => Ok((config, Some(path))),
        Err(crate::error::RelmarkError::Config(ConfigError::NotFound(_))) => {
            debug!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GroupingMode;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("relmark.toml");
        std::fs::write(&config_path, "[submit]\nremote = \"origin\"").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml_over_yaml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("relmark.toml");
        let yaml_path = temp.path().join("relmark.yaml");
        std::fs::write(&toml_path, "[submit]\nremote = \"origin\"").unwrap();
        std::fs::write(&yaml_path, "submit:\n  remote: origin").unwrap();

        let found = find_config(temp.path()).unwrap();
        assert_eq!(found, toml_path);
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(".relmark.toml");
        std::fs::write(&config_path, "").unwrap();
        let nested = temp.path().join("packaging").join("sub");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config(&nested).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("relmark.toml");
        std::fs::write(
            &config_path,
            "[changelog]\nmode = \"author\"\n\n[submit]\nremote = \"upstream\"\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.changelog.mode, GroupingMode::Author);
        assert_eq!(config.submit.remote, "upstream");
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("relmark.yaml");
        std::fs::write(
            &config_path,
            "general:\n  editor: nano\nsubmit:\n  remote: origin\n  sign: true\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.general.editor.as_deref(), Some("nano"));
        assert!(config.submit.sign);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("relmark.toml"), "[submit]\nremote = \"\"\n").unwrap();

        assert!(load_config_or_default(temp.path()).is_err());
    }
}
