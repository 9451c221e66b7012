use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::config::get_config_dir;
use crate::constants::CREDENTIALS_FILE_NAME;

/// Login state that persists between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialStore {
    pub token: Option<String>,
    pub email: Option<String>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl CredentialStore {
    /// Get the path to the credentials file
    fn credentials_file() -> Result<PathBuf> {
        Ok(get_config_dir()?.join(CREDENTIALS_FILE_NAME))
    }

    /// Load credentials from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::credentials_file()?)
    }

    /// Load credentials from an explicit file; a missing file means logged out
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut store = if path.exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str::<Self>(&content)?
        } else {
            Self::default()
        };
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Save credentials to the file they were loaded from
    pub fn save(&self) -> Result<()> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => Self::credentials_file()?,
        };
        let content = toml::to_string_pretty(&self)?;
        write_owner_only(&path, &content)?;
        Ok(())
    }

    /// Record a fresh login
    pub fn set_login(&mut self, token: String, email: String) {
        self.token = Some(token);
        self.email = Some(email);
    }

    /// Forget the stored login and persist the change
    pub fn clear(&mut self) -> Result<()> {
        self.token = None;
        self.email = None;
        self.save()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }
}

/// Write a file only the owner can read; it holds a bearer token
fn write_owner_only(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(content.as_bytes())?;
        // mode() only applies on create; tighten a file left by an older run
        fs::set_permissions(path, Permissions::from_mode(0o600))?;
    }

    #[cfg(not(unix))]
    fs::write(path, content)?;

    Ok(())
}
