use std::env;
use std::path::PathBuf;

/// Directory name under `~/.config`.
const APP_DIR: &str = "ragchat";

/// Home directory under which the ragchat config dir lives.
///
/// HOME first, then USERPROFILE for Windows shells; empty values are skipped.
pub fn get_home_dir() -> Result<String, String> {
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|dir| !dir.is_empty())
        .ok_or_else(|| "Home directory not set".to_string())
}

/// `~/.config/ragchat`, where the client keeps its config and chat storage.
pub fn default_config_dir() -> Result<PathBuf, String> {
    let home = get_home_dir()?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}
