//! Refresh-token persistence between runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use literacy_census_core::UserId;
use serde::{Deserialize, Serialize};

/// What is kept on disk for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub uid: UserId,
    pub refresh_token: String,
}

/// JSON file holding the persisted session.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted session. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> std::io::Result<Option<PersistedSession>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write the session, readable by the current user only.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub async fn save(&self, session: &PersistedSession) -> std::io::Result<()> {
        use tokio::io::AsyncWriteExt;

        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        file.write_all(&bytes).await?;
        file.flush().await
    }

    /// Delete the persisted session. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be removed.
    pub async fn clear(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
