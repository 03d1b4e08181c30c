use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::Mutex;
use tracing::debug;

/// Settings document model and per-guild mutations.
pub mod config;
mod error;

pub use config::{Change, Config, GuildConfig};
pub use error::{StoreError, StoreResult};

/// Shared handle to the JSON settings file.
///
/// Every read goes to disk. Read-modify-write cycles issued through
/// [`ConfigStore::update`] are serialized by a lock shared between clones.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl ConfigStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole settings document. A missing file reads as empty.
    pub async fn load(&self) -> StoreResult<Config> {
        let raw = match tokio::fs::read(self.path()).await {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path().to_path_buf(),
                    source,
                });
            }
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Config::default());
        }

        serde_json::from_slice(&raw).map_err(|source| StoreError::Parse {
            path: self.path().to_path_buf(),
            source,
        })
    }

    /// Overwrite the settings document.
    ///
    /// The document is written to a sibling temp file first and renamed into
    /// place so a crash never leaves a truncated file behind.
    pub async fn save(&self, config: &Config) -> StoreResult<()> {
        let mut body = serde_json::to_vec_pretty(config).map_err(StoreError::Serialize)?;
        body.push(b'\n');

        let tmp_path = self.path().with_extension("json.tmp");
        let io_error = |source| StoreError::Io {
            path: self.path().to_path_buf(),
            source,
        };

        tokio::fs::write(&tmp_path, &body).await.map_err(io_error)?;
        tokio::fs::rename(&tmp_path, self.path())
            .await
            .map_err(io_error)?;

        debug!(path = %self.path().display(), "config saved");
        Ok(())
    }

    /// Ticket settings for a guild, empty when the guild was never configured.
    pub async fn guild(&self, guild_id: u64) -> StoreResult<GuildConfig> {
        Ok(self.load().await?.guild(guild_id))
    }

    /// Load, mutate one guild record, and persist it if it changed.
    ///
    /// The record is created on first use. Returns whatever the closure returns.
    pub async fn update<T>(
        &self,
        guild_id: u64,
        mutate: impl FnOnce(&mut GuildConfig) -> T,
    ) -> StoreResult<T> {
        let _guard = self.write_lock.lock().await;

        let mut config = self.load().await?;
        let before = config.servers.get(&guild_id.to_string()).cloned();

        let record = config.guild_mut(guild_id);
        let outcome = mutate(record);

        let changed = match &before {
            Some(before) => before != record,
            None => *record != GuildConfig::default(),
        };

        if changed {
            self.save(&config).await?;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path().join("config.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let (_dir, store) = temp_store();

        let config = store.load().await.expect("load");
        assert!(config.servers.is_empty());
        assert_eq!(store.guild(5).await.expect("guild"), GuildConfig::default());
    }

    #[tokio::test]
    async fn sequential_updates_keep_last_value() {
        let (_dir, store) = temp_store();

        for category in [11_u64, 12, 13] {
            store
                .update(1, |guild| guild.set_ticket_category(category))
                .await
                .expect("update");
        }
        store
            .update(2, |guild| guild.add_staff_role(99))
            .await
            .expect("update");

        let config = store.load().await.expect("load");
        assert_eq!(config.guild(1).ticket_category_id, Some(13));
        assert_eq!(config.guild(2).staff_role_ids, vec![99]);
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let (_dir, store) = temp_store();

        let tasks: Vec<_> = (1..=8_u64)
            .map(|role_id| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update(7, |guild| guild.add_staff_role(role_id))
                        .await
                        .expect("update");
                })
            })
            .collect();

        for task in tasks {
            task.await.expect("join");
        }

        let mut roles = store.guild(7).await.expect("guild").staff_role_ids;
        roles.sort_unstable();
        assert_eq!(roles, (1..=8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn unchanged_update_does_not_create_file() {
        let (_dir, store) = temp_store();

        let change = store
            .update(3, |guild| guild.remove_staff_role(1))
            .await
            .expect("update");

        assert_eq!(change, Change::Unchanged);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_reports_parse_error() {
        let (_dir, store) = temp_store();
        tokio::fs::write(store.path(), b"{ not json")
            .await
            .expect("write");

        let error = store.load().await.expect_err("parse failure");
        assert!(matches!(error, StoreError::Parse { .. }));
    }
}
