//! Redb-backed persistent profile store.

use std::fmt::Display;
use std::path::Path;

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use snoutid_matcher::Embedding;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::{DogDetails, DogProfile, ProfileId, StoredProfile};
use crate::store::ProfileStore;

/// Profile id -> JSON-encoded [`DogDetails`].
const PROFILES: TableDefinition<u64, &[u8]> = TableDefinition::new("profiles");

/// Profile id -> embedding as consecutive little-endian f32 values.
/// Profiles without an embedding have no row here.
const EMBEDDINGS: TableDefinition<u64, &[u8]> = TableDefinition::new("embeddings");

fn storage<E: Display>(e: E) -> StoreError {
    StoreError::Storage(e.to_string())
}

/// A persistent [`ProfileStore`] backed by redb.
///
/// Each insert is one write transaction covering both tables, so a
/// profile and its embedding become visible together or not at all.
/// redb serializes write transactions and lets reads proceed concurrently.
pub struct RedbProfileStore {
    db: Database,
}

impl RedbProfileStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(storage)?;

        // Create the tables if they don't exist.
        let tx = db.begin_write().map_err(storage)?;
        {
            tx.open_table(PROFILES).map_err(storage)?;
            tx.open_table(EMBEDDINGS).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;

        info!(path = %path.display(), "profile: store opened");
        Ok(Self { db })
    }
}

impl ProfileStore for RedbProfileStore {
    fn insert(&self, profile: &DogProfile) -> Result<ProfileId, StoreError> {
        let details = serde_json::to_vec(&profile.details)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tx = self.db.begin_write().map_err(storage)?;
        let id = {
            let mut profiles = tx.open_table(PROFILES).map_err(storage)?;
            let id = match profiles.last().map_err(storage)? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            profiles.insert(id, details.as_slice()).map_err(storage)?;

            if let Some(emb) = &profile.embedding {
                let mut embeddings = tx.open_table(EMBEDDINGS).map_err(storage)?;
                embeddings
                    .insert(id, emb.to_le_bytes().as_slice())
                    .map_err(storage)?;
            }
            id
        };
        tx.commit().map_err(storage)?;

        debug!(id, embedding = profile.has_embedding(), "profile: inserted");
        Ok(ProfileId(id))
    }

    fn list_all(&self) -> Result<Vec<StoredProfile>, StoreError> {
        let tx = self.db.begin_read().map_err(storage)?;
        let profiles = tx.open_table(PROFILES).map_err(storage)?;
        let embeddings = tx.open_table(EMBEDDINGS).map_err(storage)?;

        let mut results = Vec::new();
        for item in profiles.iter().map_err(storage)? {
            let (key, value) = item.map_err(storage)?;
            let id = key.value();
            let details: DogDetails = serde_json::from_slice(value.value())
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let embedding = match embeddings.get(id).map_err(storage)? {
                Some(bytes) => Some(
                    Embedding::from_le_bytes(bytes.value())
                        .map_err(|source| StoreError::Embedding { id, source })?,
                ),
                None => None,
            };
            results.push(StoredProfile {
                id: ProfileId(id),
                profile: DogProfile { embedding, details },
            });
        }
        Ok(results)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let tx = self.db.begin_read().map_err(storage)?;
        let profiles = tx.open_table(PROFILES).map_err(storage)?;
        Ok(profiles.len().map_err(storage)? as usize)
    }
}
