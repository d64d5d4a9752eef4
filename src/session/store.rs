//! Durable session storage with file permissions and versioning
//!
//! The session is shadowed to ~/.local/share/seongkeum/session.json
//! with 0600 permissions (owner read/write only).

use super::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Durable shadow of the session
///
/// The context writes through after every mutation and reads once at
/// startup; nothing else touches the store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the persisted session, `None` when nothing was saved yet
    async fn load(&self) -> Result<Option<Session>>;

    /// Replace the persisted session with this snapshot
    async fn save(&self, session: &Session) -> Result<()>;

    /// Remove the persisted session entirely
    async fn clear(&self) -> Result<()>;
}

/// Storage format with version for future migrations
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    /// Schema version for future migrations
    version: u32,
    #[serde(flatten)]
    session: Session,
    /// When the snapshot was written (Unix timestamp)
    stored_at: i64,
}

/// File-backed session store with atomic writes
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Current storage schema version
    const VERSION: u32 = 1;

    /// Store at the default data-dir location
    pub fn new() -> Result<Self> {
        let data_dir = Self::data_dir()?;
        std::fs::create_dir_all(&data_dir).context("Failed to create session directory")?;
        Ok(Self {
            path: data_dir.join("session.json"),
        })
    }

    /// Store at an explicit path (tests, custom layouts)
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .context("Failed to determine data directory")?;

        Ok(data_dir.join("seongkeum"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read session file"),
        };

        let stored: StoredSession =
            serde_json::from_str(&content).context("Failed to parse session file")?;

        // Could add migration logic here for future versions
        if stored.version > Self::VERSION {
            anyhow::bail!(
                "Session file version {} is newer than supported version {}",
                stored.version,
                Self::VERSION
            );
        }

        Ok(Some(stored.session))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let stored = StoredSession {
            version: Self::VERSION,
            session: session.clone(),
            stored_at: chrono::Utc::now().timestamp(),
        };

        let content = serde_json::to_string_pretty(&stored)?;

        // Write to temp file first, then rename (atomic)
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &content)
            .await
            .context("Failed to write temp session file")?;

        // Set secure permissions (0600 = owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&temp_path, perms)
                .await
                .context("Failed to set session file permissions")?;
        }

        // Atomic rename
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .context("Failed to save session file")?;

        tracing::debug!("Saved session to {:?}", self.path);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!("Cleared persisted session at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to clear session file"),
        }
    }
}
