//! Wiring of the file-backed stores, the Gist remote and the coordinator.

use std::sync::Arc;
use std::time::Duration;

use marksync_core::{GistStore, SyncCoordinator};

use crate::config::Config;
use crate::storage::{FileSettings, FileTree, SettingsWatch};

pub struct Session {
    pub tree: Arc<FileTree>,
    pub settings: Arc<FileSettings>,
    pub coordinator: SyncCoordinator,
}

impl Session {
    pub fn open(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let tree = Arc::new(FileTree::open(config.tree_path(), config.platform.value)?);
        let settings = Arc::new(FileSettings::new(config.settings_path()));
        let remote = Arc::new(GistStore::new(config.sync.api_url.clone())?);
        tracing::debug!(
            "Opened {} ({} platform)",
            tree.path().display(),
            config.platform.value
        );

        let coordinator = SyncCoordinator::new(
            tree.clone(),
            remote,
            settings.clone(),
            config.sync.coordinator_options(),
        );
        Ok(Self {
            tree,
            settings,
            coordinator,
        })
    }

    /// Records a local edit and, with `auto_sync` on, runs a round.
    pub async fn after_edit(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        use marksync_core::LocalTree;

        self.coordinator.on_local_change(self.tree.revision()).await;
        if config.sync.auto_sync && self.coordinator.settings().await?.is_configured() {
            let outcome = self.coordinator.request().await;
            crate::commands::print_outcome(&outcome);
        }
        Ok(())
    }

    /// Picks up edits other processes made to the data files.
    ///
    /// A reloaded tree reaches the coordinator through its change feed. A new
    /// token or gist id schedules a round right away. Returns true in that case.
    pub async fn poll_external_changes(&self, settings_watch: &mut SettingsWatch) -> bool {
        if let Err(e) = self.tree.reload_if_changed() {
            tracing::warn!("Failed to reload bookmarks: {}", e);
        }
        match settings_watch.poll(&self.settings).await {
            Ok(true) => {
                tracing::info!("Sync target changed, scheduling immediate sync");
                self.coordinator.schedule(Duration::ZERO);
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!("Failed to reload settings: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marksync_core::LocalTree;
    use marksync_core::{Settings, SettingsStore, SyncError};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::load(Some(dir.path().join("missing.yaml"))).unwrap();
        config.data_dir.value = dir.path().join("data");
        config
    }

    #[tokio::test]
    async fn test_after_edit_stamps_last_update() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        let session = Session::open(&config).unwrap();

        let root = session
            .tree
            .category_root(marksync_core::Category::Toolbar)
            .await
            .unwrap();
        session
            .tree
            .create(marksync_core::CreateNode {
                parent_id: root.id,
                index: 0,
                kind: marksync_core::Kind::Folder,
                title: Some("Work".into()),
                url: None,
            })
            .await
            .unwrap();
        session.after_edit(&config).await.unwrap();

        let settings = session.settings.load().await.unwrap();
        assert!(settings.last_update.is_some());
        assert!(config.tree_path().exists());
    }

    #[tokio::test]
    async fn test_external_target_change_runs_round_now() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_in(&temp_dir);
        // Nothing listens here, so the round fails fast without network.
        config.sync.api_url = "http://127.0.0.1:9".into();
        let session = Session::open(&config).unwrap();
        let mut settings_watch = SettingsWatch::new(&session.settings).await.unwrap();
        let scheduler = session.coordinator.start().unwrap();

        assert!(!session.poll_external_changes(&mut settings_watch).await);

        let other = FileSettings::new(config.settings_path());
        other
            .store(&Settings {
                token: Some("tok".into()),
                remote_id: Some("gist".into()),
                last_update: None,
            })
            .await
            .unwrap();
        assert!(session.poll_external_changes(&mut settings_watch).await);

        for _ in 0..500 {
            if session.coordinator.last_error().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(session.coordinator.rounds_started(), 1);
        assert!(matches!(
            session.coordinator.last_error(),
            Some(SyncError::RemoteUnavailable(_))
        ));

        session.coordinator.shutdown();
        scheduler.await.unwrap();
    }
}
