//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CPM_ROOT_FOLDER";

/// Resolve the application root folder, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. `CPM_ROOT_FOLDER` environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get default configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir()
        .map(|d| d.join("cpm").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if user_config.exists() {
        return Ok(user_config);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cpm/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config(format!(
        "Config file not found: {}",
        user_config.display()
    )))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cpm"))
        .unwrap_or_else(|| PathBuf::from("./cpm_data"))
}

/// Create the root folder if it does not exist yet
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    Ok(())
}

/// Path of the SQLite database inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("cpm.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_cli_argument_wins() {
        std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
        let root = resolve_root_folder(Some("/from/cli"));
        std::env::remove_var(ROOT_FOLDER_ENV);
        assert_eq!(root, PathBuf::from("/from/cli"));
    }

    #[test]
    #[serial]
    fn test_environment_variable_beats_defaults() {
        std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
        let root = resolve_root_folder(None);
        std::env::remove_var(ROOT_FOLDER_ENV);
        assert_eq!(root, PathBuf::from("/from/env"));
    }

    #[test]
    #[serial]
    fn test_fallback_is_non_empty() {
        std::env::remove_var(ROOT_FOLDER_ENV);
        let root = resolve_root_folder(None);
        assert!(!root.as_os_str().is_empty());
    }

    #[test]
    fn test_database_path_is_inside_root() {
        let db = database_path(Path::new("/srv/cpm"));
        assert_eq!(db, PathBuf::from("/srv/cpm/cpm.db"));
    }

    #[test]
    fn test_ensure_root_folder_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested").join("root");
        ensure_root_folder(&root).unwrap();
        assert!(root.is_dir());
    }
}
