//! Durable record of created tokens
//!
//! Records are keyed by mint address and written with upsert semantics, so
//! saving the same token twice leaves one record. Listings are returned
//! newest first.

use crate::types::CreatedToken;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Token store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to encode or decode record {id}: {source}")]
    Serialization {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub fn category(&self) -> &'static str {
        match self {
            StoreError::Backend(_) => "backend",
            StoreError::Serialization { .. } => "serialization",
            StoreError::Task(_) => "task",
        }
    }
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Persistence seam for created-token records
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// All records, newest first
    async fn list_tokens(&self) -> Result<Vec<CreatedToken>, StoreError>;

    /// Insert or overwrite the record with `token.id`
    async fn save_token(&self, token: &CreatedToken) -> Result<(), StoreError>;

    /// Records created by `creator`, newest first
    async fn list_tokens_by_creator(&self, creator: &str) -> Result<Vec<CreatedToken>, StoreError>;

    async fn get_token(&self, id: &str) -> Result<Option<CreatedToken>, StoreError>;

    /// Remove a record. Returns whether it existed.
    async fn delete_token(&self, id: &str) -> Result<bool, StoreError>;
}

fn newest_first(mut tokens: Vec<CreatedToken>) -> Vec<CreatedToken> {
    tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    tokens
}

/// [`TokenStore`] on an embedded sled database
#[derive(Clone)]
pub struct SledTokenStore {
    tree: sled::Tree,
}

impl std::fmt::Debug for SledTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledTokenStore")
            .field("records", &self.tree.len())
            .finish()
    }
}

impl SledTokenStore {
    const TREE: &'static str = "created_tokens";

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        let tree = db.open_tree(Self::TREE)?;
        debug!(path = %path.as_ref().display(), records = tree.len(), "Opened token store");
        Ok(Self { tree })
    }

    /// Run blocking sled work off the async executor
    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(sled::Tree) -> Result<T, StoreError> + Send + 'static,
    {
        let tree = self.tree.clone();
        tokio::task::spawn_blocking(move || f(tree))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    fn decode(key: &[u8], value: &[u8]) -> Result<CreatedToken, StoreError> {
        serde_json::from_slice(value).map_err(|source| StoreError::Serialization {
            id: String::from_utf8_lossy(key).into_owned(),
            source,
        })
    }

    fn scan(tree: &sled::Tree, creator: Option<&str>) -> Result<Vec<CreatedToken>, StoreError> {
        let mut tokens = Vec::new();
        for entry in tree.iter() {
            let (key, value) = entry?;
            match Self::decode(&key, &value) {
                Ok(token) => {
                    if creator.map_or(true, |c| token.creator == c) {
                        tokens.push(token);
                    }
                }
                Err(e) => warn!(error = %e, "Skipping unreadable token record"),
            }
        }
        Ok(newest_first(tokens))
    }
}

#[async_trait]
impl TokenStore for SledTokenStore {
    async fn list_tokens(&self) -> Result<Vec<CreatedToken>, StoreError> {
        self.blocking(|tree| Self::scan(&tree, None)).await
    }

    async fn save_token(&self, token: &CreatedToken) -> Result<(), StoreError> {
        let id = token.id.clone();
        let value = serde_json::to_vec(token).map_err(|source| StoreError::Serialization {
            id: id.clone(),
            source,
        })?;
        self.blocking(move |tree| {
            tree.insert(id.as_bytes(), value)?;
            tree.flush()?;
            Ok(())
        })
        .await
    }

    async fn list_tokens_by_creator(&self, creator: &str) -> Result<Vec<CreatedToken>, StoreError> {
        let creator = creator.to_string();
        self.blocking(move |tree| Self::scan(&tree, Some(&creator))).await
    }

    async fn get_token(&self, id: &str) -> Result<Option<CreatedToken>, StoreError> {
        let id = id.to_string();
        self.blocking(move |tree| {
            tree.get(id.as_bytes())?
                .map(|value| Self::decode(id.as_bytes(), &value))
                .transpose()
        })
        .await
    }

    async fn delete_token(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.blocking(move |tree| {
            let existed = tree.remove(id.as_bytes())?.is_some();
            tree.flush()?;
            Ok(existed)
        })
        .await
    }
}

/// In-process [`TokenStore`]
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<String, CreatedToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn list_tokens(&self) -> Result<Vec<CreatedToken>, StoreError> {
        let tokens = self.tokens.read().await;
        Ok(newest_first(tokens.values().cloned().collect()))
    }

    async fn save_token(&self, token: &CreatedToken) -> Result<(), StoreError> {
        self.tokens
            .write()
            .await
            .insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn list_tokens_by_creator(&self, creator: &str) -> Result<Vec<CreatedToken>, StoreError> {
        let tokens = self.tokens.read().await;
        Ok(newest_first(
            tokens
                .values()
                .filter(|t| t.creator == creator)
                .cloned()
                .collect(),
        ))
    }

    async fn get_token(&self, id: &str) -> Result<Option<CreatedToken>, StoreError> {
        Ok(self.tokens.read().await.get(id).cloned())
    }

    async fn delete_token(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.tokens.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Network, TokenMetadata};

    fn token(id: &str, creator: &str, created_at: i64) -> CreatedToken {
        CreatedToken {
            id: id.to_string(),
            mint_address: id.to_string(),
            metadata: TokenMetadata {
                name: "Foo".to_string(),
                symbol: "FOO".to_string(),
                description: None,
                decimals: 9,
                total_supply: 1_000_000,
                image_url: None,
                revoke_mint: false,
                revoke_freeze: false,
            },
            creator: creator.to_string(),
            network: Network::Devnet,
            created_at,
            tx_signature: format!("sig-{}", id),
        }
    }

    async fn exercise_store(store: &dyn TokenStore) {
        store.save_token(&token("a", "alice", 1)).await.unwrap();
        store.save_token(&token("b", "bob", 3)).await.unwrap();
        store.save_token(&token("c", "alice", 2)).await.unwrap();

        let all = store.list_tokens().await.unwrap();
        let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        let alice = store.list_tokens_by_creator("alice").await.unwrap();
        let ids: Vec<_> = alice.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);

        assert_eq!(store.get_token("b").await.unwrap().unwrap().creator, "bob");
        assert!(store.get_token("missing").await.unwrap().is_none());

        assert!(store.delete_token("b").await.unwrap());
        assert!(!store.delete_token("b").await.unwrap());
        assert_eq!(store.list_tokens().await.unwrap().len(), 2);
    }

    async fn exercise_upsert(store: &dyn TokenStore) {
        let mut record = token("mint1", "alice", 10);
        store.save_token(&record).await.unwrap();
        store.save_token(&record).await.unwrap();
        assert_eq!(store.list_tokens().await.unwrap().len(), 1);

        record.tx_signature = "sig-updated".to_string();
        store.save_token(&record).await.unwrap();
        let all = store.list_tokens().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].tx_signature, "sig-updated");
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise_store(&MemoryTokenStore::new()).await;
        exercise_upsert(&MemoryTokenStore::new()).await;
    }

    #[tokio::test]
    async fn test_sled_store() {
        let dir = tempfile::tempdir().unwrap();
        exercise_store(&SledTokenStore::open(dir.path().join("a.db")).unwrap()).await;
        exercise_upsert(&SledTokenStore::open(dir.path().join("b.db")).unwrap()).await;
    }
}
