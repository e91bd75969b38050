use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Party;

pub const DEFAULT_DATA_ROOT: &str = "~/Documents/Invoices";
const DEFAULT_SENDER_TEMPLATE: &str = include_str!("../sender.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub data_root: String,
    /// Ask where to save each export instead of writing to `output/`.
    #[serde(default)]
    pub save_dialog: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_root: DEFAULT_DATA_ROOT.to_string(),
            save_dialog: false,
        }
    }
}

impl AppSettings {
    pub fn root(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.data_root))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("output")
    }
}

pub fn config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "invoice-composer", "app").ok_or(Error::NoConfigDir)?;
    Ok(proj_dirs.config_dir().join("settings.toml"))
}

/// `Ok(None)` when no settings were saved yet.
pub fn load_settings(path: &Path) -> Result<Option<AppSettings>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let settings = toml::from_str(&content).map_err(|source| Error::TomlRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(settings))
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, toml::to_string_pretty(settings)?)?;
    tracing::debug!(path = %path.display(), "settings saved");
    Ok(())
}

/// Reads `<root>/sender.toml`, writing the built-in one first if it is missing.
pub fn load_sender(root: &Path) -> Result<Party> {
    let path = root.join("sender.toml");
    let content = if path.exists() {
        fs::read_to_string(&path)?
    } else {
        println!("✨ Initializing default sender configuration...");
        fs::create_dir_all(root)?;
        fs::write(&path, DEFAULT_SENDER_TEMPLATE)?;
        DEFAULT_SENDER_TEMPLATE.to_string()
    };
    toml::from_str(&content).map_err(|source| Error::TomlRead { path, source })
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings(&dir.path().join("settings.toml")).unwrap(), None);
    }

    #[test]
    fn settings_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.toml");
        let settings = AppSettings {
            data_root: "/srv/invoices".to_string(),
            save_dialog: true,
        };

        save_settings(&path, &settings).unwrap();

        assert_eq!(load_settings(&path).unwrap(), Some(settings));
    }

    #[test]
    fn save_dialog_defaults_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "data_root = \"/tmp/x\"\n").unwrap();

        let settings = load_settings(&path).unwrap().unwrap();
        assert!(!settings.save_dialog);
        assert_eq!(settings.output_dir(), PathBuf::from("/tmp/x/output"));
    }

    #[test]
    fn broken_settings_report_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "data_root = ").unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, Error::TomlRead { .. }));
        assert!(err.to_string().contains("settings.toml"));
    }

    #[test]
    fn sender_is_initialized_from_template() {
        let dir = tempfile::tempdir().unwrap();

        let sender = load_sender(dir.path()).unwrap();

        assert_eq!(sender, Party::sample_sender());
        assert!(dir.path().join("sender.toml").exists());
    }

    #[test]
    fn custom_sender_is_used() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sender.toml"), "name = \"Jo Plumbing\"\nphone = \"555-0100\"\n").unwrap();

        let sender = load_sender(dir.path()).unwrap();

        assert_eq!(sender.name, "Jo Plumbing");
        assert_eq!(sender.phone, "555-0100");
        assert_eq!(sender.email, "");
    }

    #[test]
    fn plain_paths_are_not_expanded() {
        assert_eq!(expand_home_dir("/var/data"), "/var/data");
    }
}
