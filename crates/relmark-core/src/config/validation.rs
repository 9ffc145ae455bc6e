//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_general(config)?;
    validate_changelog(config)?;
    validate_submit(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> crate::error::RelmarkError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
    .into()
}

fn validate_general(config: &Config) -> Result<()> {
    if let Some(editor) = &config.general.editor {
        if editor.trim().is_empty() {
            return Err(invalid("general.editor", "editor cannot be empty"));
        }
    }

    if let Some(user) = &config.user {
        if user.name.trim().is_empty() {
            return Err(invalid("user.name", "name cannot be empty"));
        }
        if user.email.contains('<') || user.email.contains('>') {
            return Err(invalid("user.email", "email must not contain angle brackets"));
        }
    }

    Ok(())
}

fn validate_changelog(config: &Config) -> Result<()> {
    if let Err(e) = glob::Pattern::new(&config.changelog.pattern) {
        return Err(invalid("changelog.pattern", format!("invalid glob: {}", e)));
    }

    if config.changelog.dir.is_absolute() {
        return Err(invalid(
            "changelog.dir",
            "must be relative to the repository root",
        ));
    }

    Ok(())
}

fn validate_submit(config: &Config) -> Result<()> {
    if config.submit.remote.is_empty() {
        return Err(invalid("submit.remote", "remote cannot be empty"));
    }

    let prefix = &config.submit.tag_prefix;
    if prefix.is_empty() || prefix.contains('/') {
        return Err(invalid(
            "submit.tag_prefix",
            "prefix must be a single non-empty path component",
        ));
    }

    for (from, to) in &config.submit.branch_renames {
        if from.is_empty() || to.is_empty() {
            return Err(invalid(
                "submit.branch_renames",
                "branch names cannot be empty",
            ));
        }
    }

    if matches!(&config.submit.user_key, Some(key) if key.trim().is_empty()) {
        return Err(invalid("submit.user_key", "key cannot be empty"));
    }

    Ok(())
}
