//! # Credential Repository
//!
//! Storage collaborator for issued credentials. The trait is the narrow
//! interface the issuer depends on; [`InMemoryCredentialRepository`] is a
//! process-local implementation indexed by credential id, subject DID,
//! issuer DID and inscription id, with JSON snapshot backup and restore.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::credential::VerifiableCredential;
use crate::error::RepositoryError;

const SNAPSHOT_VERSION: u32 = 1;

/// Indexing metadata stored alongside a credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialMetadata {
    pub inscription_id: String,
    pub title: String,
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

/// A credential with its metadata, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub credential: VerifiableCredential,
    pub metadata: CredentialMetadata,
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Store or replace the credential with the same `id`.
    async fn store_credential(
        &self,
        credential: &VerifiableCredential,
        metadata: &CredentialMetadata,
    ) -> Result<(), RepositoryError>;

    async fn get_credential_by_id(&self, id: &str) -> Result<Option<VerifiableCredential>, RepositoryError>;

    async fn find_credentials_by_subject(&self, did: &str) -> Result<Vec<VerifiableCredential>, RepositoryError>;

    async fn find_credentials_by_issuer(&self, did: &str) -> Result<Vec<VerifiableCredential>, RepositoryError>;

    async fn find_credentials_by_inscription(
        &self,
        inscription_id: &str,
    ) -> Result<Vec<VerifiableCredential>, RepositoryError>;

    /// Write a snapshot to `path`. `false` on any failure.
    async fn create_backup(&self, path: &Path) -> bool;

    /// Replace the contents with the snapshot at `path`. `false` on any
    /// failure, in which case the contents are unchanged.
    async fn restore_from_backup(&self, path: &Path) -> bool;
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    credentials: Vec<StoredCredential>,
}

#[derive(Debug, Default)]
struct Store {
    records: BTreeMap<String, StoredCredential>,
    by_subject: HashMap<String, BTreeSet<String>>,
    by_issuer: HashMap<String, BTreeSet<String>>,
    by_inscription: HashMap<String, BTreeSet<String>>,
}

impl Store {
    fn from_records(records: Vec<StoredCredential>) -> Result<Self, RepositoryError> {
        let mut store = Self::default();
        for record in records {
            let id = record.credential.id.clone().ok_or(RepositoryError::MissingId)?;
            store.insert(id, record);
        }
        Ok(store)
    }

    fn insert(&mut self, id: String, record: StoredCredential) {
        if let Some(previous) = self.records.remove(&id) {
            self.reindex(&id, &previous, false);
        }
        self.reindex(&id, &record, true);
        self.records.insert(id, record);
    }

    fn reindex(&mut self, id: &str, record: &StoredCredential, add: bool) {
        let keys = [
            (&mut self.by_subject, record.credential.subject_id()),
            (&mut self.by_issuer, record.credential.issuer_id()),
            (&mut self.by_inscription, Some(record.metadata.inscription_id.as_str())),
        ];
        for (index, key) in keys {
            let Some(key) = key.filter(|k| !k.is_empty()) else {
                continue;
            };
            if add {
                index.entry(key.to_string()).or_default().insert(id.to_string());
            } else if let Some(ids) = index.get_mut(key) {
                ids.remove(id);
                if ids.is_empty() {
                    index.remove(key);
                }
            }
        }
    }

    fn lookup(&self, index: &HashMap<String, BTreeSet<String>>, key: &str) -> Vec<VerifiableCredential> {
        index
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|id| self.records.get(id))
            .map(|record| record.credential.clone())
            .collect()
    }
}

/// Process-local repository.
#[derive(Debug, Default)]
pub struct InMemoryCredentialRepository {
    store: RwLock<Store>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn write_snapshot(&self, path: &Path) -> Result<usize, RepositoryError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            credentials: self.store.read().records.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(path, bytes).await?;
        Ok(snapshot.credentials.len())
    }

    async fn read_snapshot(&self, path: &Path) -> Result<usize, RepositoryError> {
        let bytes = tokio::fs::read(path).await?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RepositoryError::Backend(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        let store = Store::from_records(snapshot.credentials)?;
        let count = store.records.len();
        *self.store.write() = store;
        Ok(count)
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn store_credential(
        &self,
        credential: &VerifiableCredential,
        metadata: &CredentialMetadata,
    ) -> Result<(), RepositoryError> {
        let id = credential.id.clone().ok_or(RepositoryError::MissingId)?;
        self.store.write().insert(
            id,
            StoredCredential {
                credential: credential.clone(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn get_credential_by_id(&self, id: &str) -> Result<Option<VerifiableCredential>, RepositoryError> {
        Ok(self.store.read().records.get(id).map(|r| r.credential.clone()))
    }

    async fn find_credentials_by_subject(&self, did: &str) -> Result<Vec<VerifiableCredential>, RepositoryError> {
        let store = self.store.read();
        Ok(store.lookup(&store.by_subject, did))
    }

    async fn find_credentials_by_issuer(&self, did: &str) -> Result<Vec<VerifiableCredential>, RepositoryError> {
        let store = self.store.read();
        Ok(store.lookup(&store.by_issuer, did))
    }

    async fn find_credentials_by_inscription(
        &self,
        inscription_id: &str,
    ) -> Result<Vec<VerifiableCredential>, RepositoryError> {
        let store = self.store.read();
        Ok(store.lookup(&store.by_inscription, inscription_id))
    }

    async fn create_backup(&self, path: &Path) -> bool {
        match self.write_snapshot(path).await {
            Ok(count) => {
                tracing::info!(path = %path.display(), count, "credential backup written");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "credential backup failed");
                false
            }
        }
    }

    async fn restore_from_backup(&self, path: &Path) -> bool {
        match self.read_snapshot(path).await {
            Ok(count) => {
                tracing::info!(path = %path.display(), count, "credentials restored from backup");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "credential restore failed");
                false
            }
        }
    }
}
