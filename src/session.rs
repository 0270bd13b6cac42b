//! Logged-in user persisted between CLI invocations

use crate::lifecycle::types::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: User, logged_in_at: DateTime<Utc>) -> Self {
        Self { user, logged_in_at }
    }
}

/// JSON file holding at most one session
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let serialized = serde_json::to_string_pretty(session)?;

        // Write to temporary file first, then rename
        let temp_file = format!("{}.tmp", self.path.display());
        fs::write(&temp_file, serialized).await?;
        fs::rename(&temp_file, &self.path).await?;

        info!(user = %session.user.name, role = %session.user.role, file = ?self.path, "Session saved");
        Ok(())
    }

    pub async fn load(&self) -> Result<Option<Session>, SessionError> {
        if !fs::try_exists(&self.path).await? {
            debug!(file = ?self.path, "No session file found");
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).await?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Remove the session; true when one existed
    pub async fn clear(&self) -> Result<bool, SessionError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(file = ?self.path, "Session cleared");
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::types::Role;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        assert!(store.load().await.unwrap().is_none());

        let mut user = User::new("Bob", Role::Qa);
        user.id = Some("7".to_string());
        let session = Session::new(user, Utc::now());
        store.save(&session).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session));

        assert!(store.clear().await.unwrap());
        assert!(!store.clear().await.unwrap());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SessionStore::new(path);
        assert!(matches!(
            store.load().await,
            Err(SessionError::SerializationError(_))
        ));
    }
}
