//! User preferences
//!
//! The only state that survives a restart: the user's own model API key.
//! Stored as a small JSON file at an explicit path.

use crate::error::PrefsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the preferences file location
pub const ENV_PREFS_PATH: &str = "ROADMAP_PREFS";

/// Persisted user preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPrefs {
    /// Key forwarded as `x-user-api-key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_api_key: Option<String>,
}

impl UserPrefs {
    /// Read preferences; a missing file yields the defaults
    ///
    /// # Errors
    /// I/O errors other than not-found, or invalid JSON.
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(PrefsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write preferences, creating parent directories
    ///
    /// # Errors
    /// I/O or serialization errors.
    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        let io_err = |source| PrefsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_err)?;
        tracing::debug!(path = %path.display(), "preferences saved");
        Ok(())
    }

    /// Set or clear the API key; blank keys clear
    pub fn set_user_api_key(&mut self, key: Option<String>) {
        self.user_api_key = key.filter(|k| !k.trim().is_empty());
    }

    /// Key with everything but the last four characters hidden
    #[must_use]
    pub fn masked_key(&self) -> Option<String> {
        self.user_api_key.as_ref().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            let visible = chars.len().saturating_sub(4);
            let tail: String = chars[visible..].iter().collect();
            format!("{}{tail}", "*".repeat(visible.min(8)))
        })
    }
}

/// Default preferences location
///
/// `$ROADMAP_PREFS`, else `$HOME/.config/roadmap/prefs.json`, else
/// `roadmap-prefs.json` in the working directory.
#[must_use]
pub fn default_prefs_path() -> PathBuf {
    if let Some(path) = std::env::var_os(ENV_PREFS_PATH) {
        return PathBuf::from(path);
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config").join("roadmap").join("prefs.json"),
        None => PathBuf::from("roadmap-prefs.json"),
    }
}
