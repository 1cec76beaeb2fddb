use std::path::{Path, PathBuf};

/// Config directory: `$XDG_CONFIG_HOME/lab-cli/` or `~/.config/lab-cli/`
pub fn config_dir() -> PathBuf {
    config_dir_from(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        dirs::home_dir(),
    )
}

fn config_dir_from(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = match xdg_config_home {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => home.unwrap_or_else(|| PathBuf::from("/tmp")).join(".config"),
    };
    base.join("lab-cli")
}

/// Default config file: `<config dir>/config.toml`
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Template directory next to a config file: `<config dir>/templates/`
pub fn templates_dir(config_file: &Path) -> PathBuf {
    config_file
        .parent()
        .unwrap_or(Path::new("."))
        .join("templates")
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
