//! API key storage.
//!
//! One `CredentialStore` is created per process and shared by `Arc` between
//! the service, its provider adapters and any settings surface. Keys come
//! from the environment first, then from a JSON file written by
//! [`CredentialStore::configure`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{EmbeddingError, Result};
use crate::registry::{self, ProviderDescriptor, ProviderFamily};

type KeyMap = BTreeMap<ProviderFamily, String>;

#[derive(Debug, Default)]
struct Keys {
    /// Keys in effect: persisted keys with environment values on top.
    active: KeyMap,

    /// Keys that belong in the file. Environment values never land here.
    persisted: KeyMap,
}

/// Per-family API keys, optionally backed by a file.
#[derive(Debug, Default)]
pub struct CredentialStore {
    keys: RwLock<Keys>,

    /// File that `configure` persists to. `None` keeps keys in memory only.
    path: Option<PathBuf>,
}

impl CredentialStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load keys from the process environment and the given file.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok()).await
    }

    /// Load keys from `env` and the given file. Environment values win over
    /// persisted ones.
    pub async fn load_with_env(
        path: impl Into<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let path = path.into();
        let persisted = read_key_file(&path).await?;
        let mut active = persisted.clone();

        for family in ProviderFamily::PREFERENCE {
            if let Some(key) = env(family.env_var()).filter(|key| !key.is_empty()) {
                debug!("Using {family} API key from {}", family.env_var());
                active.insert(family, key);
            }
        }

        info!(
            "Loaded credentials for {} provider famil{}",
            active.len(),
            if active.len() == 1 { "y" } else { "ies" }
        );

        Ok(Self {
            keys: RwLock::new(Keys { active, persisted }),
            path: Some(path),
        })
    }

    /// Seed a key without persisting it.
    pub fn with_key(mut self, family: ProviderFamily, key: impl Into<String>) -> Self {
        self.keys.get_mut().active.insert(family, key.into());
        self
    }

    /// Path keys are persisted to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Set the API key for a family and persist it. Overwrites any prior key.
    ///
    /// Only keys set through this method are written; keys taken from the
    /// environment stay out of the file. Nothing changes if the write fails.
    pub async fn configure(&self, family: ProviderFamily, api_key: impl Into<String>) -> Result<()> {
        let api_key = api_key.into();
        let mut keys = self.keys.write().await;

        if let Some(ref path) = self.path {
            let mut persisted = keys.persisted.clone();
            persisted.insert(family, api_key.clone());
            write_key_file(path, &persisted).await?;
            keys.persisted = persisted;
        }
        keys.active.insert(family, api_key);

        info!("Configured {family} API key");
        Ok(())
    }

    /// The stored key for a family.
    pub async fn api_key(&self, family: ProviderFamily) -> Option<String> {
        self.keys
            .read()
            .await
            .active
            .get(&family)
            .filter(|key| !key.is_empty())
            .cloned()
    }

    /// Whether a non-empty key is stored for a family.
    pub async fn has_key(&self, family: ProviderFamily) -> bool {
        self.api_key(family).await.is_some()
    }

    /// Whether the provider behind a registry key has credentials.
    pub async fn is_configured(&self, provider_key: &str) -> Result<bool> {
        let descriptor = registry::lookup(provider_key)?;
        Ok(self.has_key(descriptor.family).await)
    }

    /// Whether any family has credentials.
    pub async fn is_any_configured(&self) -> bool {
        self.keys
            .read()
            .await
            .active
            .values()
            .any(|key| !key.is_empty())
    }

    /// First family in `order` that has credentials.
    pub async fn first_configured(&self, order: &[ProviderFamily]) -> Option<ProviderFamily> {
        let keys = self.keys.read().await;
        order
            .iter()
            .copied()
            .find(|family| keys.active.get(family).is_some_and(|key| !key.is_empty()))
    }

    /// The key for a descriptor's family, or `ProviderUnconfigured`.
    pub async fn require(&self, descriptor: &ProviderDescriptor) -> Result<String> {
        self.api_key(descriptor.family)
            .await
            .ok_or_else(|| EmbeddingError::ProviderUnconfigured {
                provider: descriptor.name.to_string(),
            })
    }
}

async fn read_key_file(path: &Path) -> Result<KeyMap> {
    if !fs::try_exists(path).await? {
        return Ok(KeyMap::new());
    }

    let content = fs::read_to_string(path).await?;
    match serde_json::from_str(&content) {
        Ok(keys) => Ok(keys),
        Err(e) => {
            warn!("Ignoring unreadable credentials file {}: {e}", path.display());
            Ok(KeyMap::new())
        }
    }
}

async fn write_key_file(path: &Path, keys: &KeyMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let content = serde_json::to_string_pretty(keys)?;

    // Write atomically using a temp file
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    fs::rename(&temp_path, path).await?;
    debug!("Saved credentials to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderKind;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_in_memory_configure() {
        let store = CredentialStore::in_memory();
        assert!(!store.is_any_configured().await);

        store.configure(ProviderFamily::OpenAi, "sk-test").await.unwrap();

        assert!(store.is_any_configured().await);
        assert!(store.is_configured("openai-3-large").await.unwrap());
        assert!(!store.is_configured("gemini-embedding-004").await.unwrap());
        assert_eq!(store.api_key(ProviderFamily::OpenAi).await, Some("sk-test".to_string()));
    }

    #[tokio::test]
    async fn test_empty_key_is_not_configured() {
        let store = CredentialStore::in_memory().with_key(ProviderFamily::Gemini, "");
        assert!(!store.has_key(ProviderFamily::Gemini).await);
        assert!(!store.is_any_configured().await);
    }

    #[tokio::test]
    async fn test_configure_overwrites() {
        let store = CredentialStore::in_memory().with_key(ProviderFamily::Gemini, "old");
        store.configure(ProviderFamily::Gemini, "new").await.unwrap();
        assert_eq!(store.api_key(ProviderFamily::Gemini).await, Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_provider_key() {
        let store = CredentialStore::in_memory();
        assert!(matches!(
            store.is_configured("nope").await,
            Err(EmbeddingError::UnknownProviderKind(_))
        ));
    }

    #[tokio::test]
    async fn test_first_configured_follows_order() {
        let store = CredentialStore::in_memory()
            .with_key(ProviderFamily::OpenAi, "sk")
            .with_key(ProviderFamily::Gemini, "g");

        assert_eq!(
            store.first_configured(&ProviderFamily::PREFERENCE).await,
            Some(ProviderFamily::Gemini)
        );
        assert_eq!(
            store.first_configured(&[ProviderFamily::OpenAi]).await,
            Some(ProviderFamily::OpenAi)
        );
    }

    #[tokio::test]
    async fn test_require_names_provider() {
        let store = CredentialStore::in_memory();
        let err = store
            .require(ProviderKind::GeminiEmbedding004.descriptor())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Google Gemini API key not configured");
    }

    #[tokio::test]
    async fn test_failed_write_leaves_key_unchanged() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = temp_dir.path().join("credentials.json");
        fs::create_dir_all(path.join("occupied")).await.unwrap();

        let store = CredentialStore {
            keys: RwLock::new(Keys::default()),
            path: Some(path),
        };

        assert!(store.configure(ProviderFamily::Gemini, "g-1").await.is_err());
        assert!(!store.has_key(ProviderFamily::Gemini).await);
    }
}
