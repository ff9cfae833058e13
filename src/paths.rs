use std::path::PathBuf;

/// Default config file: `~/.config/pvenotes/config.toml`
pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("pvenotes")
        .join("config.toml")
}
