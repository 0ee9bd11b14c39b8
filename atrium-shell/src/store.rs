//! Settings Stores
//!
//! Persistence for tenant settings. The host loads all tenants at bootstrap
//! and saves a tenant's settings before recycling its shell.

use crate::error::{Result, ShellError};
use crate::settings::ShellSettings;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Settings store trait (implement with your persistence of choice).
#[async_trait]
pub trait ShellSettingsStore: Send + Sync {
    /// Load the settings of every known tenant.
    async fn load_settings(&self) -> Result<Vec<ShellSettings>>;

    /// Persist one tenant's settings durably before returning.
    async fn save_settings(&self, settings: &ShellSettings) -> Result<()>;
}

/// In-memory settings store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryShellSettingsStore {
    settings: RwLock<HashMap<String, ShellSettings>>,
}

impl InMemoryShellSettingsStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with tenants
    pub fn with_tenants(tenants: impl IntoIterator<Item = ShellSettings>) -> Self {
        let settings = tenants
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect::<HashMap<_, _>>();
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl ShellSettingsStore for InMemoryShellSettingsStore {
    async fn load_settings(&self) -> Result<Vec<ShellSettings>> {
        Ok(self.settings.read().values().cloned().collect())
    }

    async fn save_settings(&self, settings: &ShellSettings) -> Result<()> {
        self.settings
            .write()
            .insert(settings.name.clone(), settings.clone());
        Ok(())
    }
}

/// File-backed settings store.
///
/// Each tenant lives in its own directory under `root`, holding a single
/// `settings.json`:
///
/// ```text
/// sites/
///   Default/settings.json
///   acme/settings.json
/// ```
///
/// Load scans the root directory; entries that cannot be read or parsed are
/// skipped with a warning so one broken tenant folder cannot fail bootstrap.
#[derive(Debug, Clone)]
pub struct FileShellSettingsStore {
    root: PathBuf,
}

const SETTINGS_FILE: &str = "settings.json";

impl FileShellSettingsStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn settings_path(&self, tenant: &str) -> PathBuf {
        self.root.join(tenant).join(SETTINGS_FILE)
    }

    async fn read_tenant(path: &Path) -> Result<ShellSettings> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl ShellSettingsStore for FileShellSettingsStore {
    async fn load_settings(&self) -> Result<Vec<ShellSettings>> {
        let mut all = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // A missing root simply means no tenants yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(all),
            Err(e) => return Err(ShellError::LoadError(e.to_string())),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellError::LoadError(e.to_string()))?
        {
            let path = entry.path().join(SETTINGS_FILE);
            if !path.is_file() {
                continue;
            }
            match Self::read_tenant(&path).await {
                Ok(settings) => all.push(settings),
                Err(e) => warn!("Skipping unreadable tenant settings {:?}: {}", path, e),
            }
        }

        Ok(all)
    }

    async fn save_settings(&self, settings: &ShellSettings) -> Result<()> {
        let path = self.settings_path(&settings.name);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ShellError::SaveError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| ShellError::SaveError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TenantState;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_in_memory_store_round_trip() {
        let store = InMemoryShellSettingsStore::new();
        assert!(store.load_settings().await.unwrap().is_empty());

        let settings = ShellSettings::new("acme").with_state(TenantState::Running);
        store.save_settings(&settings).await.unwrap();

        let loaded = store.load_settings().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], settings);
    }

    #[tokio::test]
    async fn test_in_memory_store_overwrites_by_name() {
        let store = InMemoryShellSettingsStore::with_tenants([ShellSettings::new("acme")]);

        let updated = ShellSettings::new("acme").with_state(TenantState::Running);
        store.save_settings(&updated).await.unwrap();

        let loaded = store.load_settings().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].state, TenantState::Running);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let root = std::env::temp_dir().join(format!("atrium-store-{}", Uuid::new_v4()));
        let store = FileShellSettingsStore::new(&root);

        // Missing root means no tenants, not an error
        assert!(store.load_settings().await.unwrap().is_empty());

        let acme = ShellSettings::new("acme")
            .with_url_host("acme.example.com")
            .with_state(TenantState::Running);
        let beta = ShellSettings::new("beta");
        store.save_settings(&acme).await.unwrap();
        store.save_settings(&beta).await.unwrap();

        let mut loaded = store.load_settings().await.unwrap();
        loaded.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(loaded, vec![acme, beta]);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_skips_corrupt_tenant() {
        let root = std::env::temp_dir().join(format!("atrium-store-{}", Uuid::new_v4()));
        let store = FileShellSettingsStore::new(&root);

        store
            .save_settings(&ShellSettings::new("good"))
            .await
            .unwrap();

        let bad_dir = root.join("bad");
        tokio::fs::create_dir_all(&bad_dir).await.unwrap();
        tokio::fs::write(bad_dir.join(SETTINGS_FILE), "not json")
            .await
            .unwrap();

        let loaded = store.load_settings().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "good");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
