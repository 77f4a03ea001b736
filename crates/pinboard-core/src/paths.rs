//! Path resolution for pinboard configuration and data directories.
//!
//! PINBOARD_HOME resolution order:
//! 1. PINBOARD_HOME environment variable (if set)
//! 2. ~/.config/pinboard (default)

use std::path::PathBuf;

/// Returns the pinboard home directory.
///
/// Checks PINBOARD_HOME env var first, falls back to ~/.config/pinboard
pub fn pinboard_home() -> PathBuf {
    if let Ok(home) = std::env::var("PINBOARD_HOME") {
        return PathBuf::from(home);
    }

    dirs::home_dir()
        .map(|h| h.join(".config").join("pinboard"))
        .expect("Could not determine home directory")
}

/// Returns the path to the config.toml file.
pub fn config_path() -> PathBuf {
    pinboard_home().join("config.toml")
}

/// Returns the path to the stored credentials file.
pub fn auth_path() -> PathBuf {
    pinboard_home().join("auth.json")
}

/// Returns the directory log files are written to.
pub fn logs_dir() -> PathBuf {
    pinboard_home().join("logs")
}
