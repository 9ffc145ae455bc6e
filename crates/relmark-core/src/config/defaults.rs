//! Default configuration values

use std::path::PathBuf;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "relmark.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "relmark.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".relmark.toml",
        ".relmark.yaml",
    ]
}

/// Per-user configuration file, e.g. `~/.config/relmark/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("relmark").join("config.toml"))
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# relmark configuration

[general]
# editor = "vim"

# Identity written into author-grouped changelog entries.
# Defaults to git's user.name / user.email.
# [user]
# name = "Jane Doe"
# email = "jane@example.com"

[changelog]
dir = "packaging"
pattern = "*.changes"
mode = "date"
require_clean = true

[submit]
remote = "origin"
sign = false
require_clean = true
tag_prefix = "submit"

[submit.branch_renames]
master = "trunk"

[git]
push_method = "cli"
"#;
