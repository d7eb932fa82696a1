//! Where docqa looks for its optional config file.
//!
//! docqa never writes anything to disk. Documents, index and transcript live in
//! memory for the length of one session.

use std::path::PathBuf;

pub const CONFIG_FILENAME: &str = "config.toml";

/// Returns the platform config directory for docqa.
/// On Linux: `~/.config/docqa/`; on macOS: `~/Library/Application Support/app.Docqa.docqa/`.
/// Returns `None` if no home directory can be determined. The directory is not created.
pub fn config_dir() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("app", "Docqa", "docqa")?;
    Some(dirs.config_dir().to_path_buf())
}

/// Default location of the config file, whether or not it exists.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}
