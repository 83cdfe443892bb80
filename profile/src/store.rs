use parking_lot::RwLock;

use crate::error::StoreError;
use crate::model::{DogProfile, ProfileId, StoredProfile};

/// Persistence for dog profiles.
///
/// Stores must allow concurrent reads and serialize writes. Records are
/// never updated in place.
pub trait ProfileStore: Send + Sync {
    /// Stores a new profile and returns its id. Not idempotent: inserting
    /// the same profile twice creates two records.
    fn insert(&self, profile: &DogProfile) -> Result<ProfileId, StoreError>;

    /// Returns every profile in ascending id order.
    fn list_all(&self) -> Result<Vec<StoredProfile>, StoreError>;

    /// Returns the number of stored profiles.
    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.list_all()?.len())
    }
}

/// In-memory [`ProfileStore`].
/// Data is lost on restart. Suitable for testing or ephemeral use.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<Vec<StoredProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn insert(&self, profile: &DogProfile) -> Result<ProfileId, StoreError> {
        let mut profiles = self.profiles.write();
        let id = ProfileId(profiles.last().map_or(1, |p| p.id.0 + 1));
        profiles.push(StoredProfile {
            id,
            profile: profile.clone(),
        });
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<StoredProfile>, StoreError> {
        Ok(self.profiles.read().clone())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.profiles.read().len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use snoutid_matcher::Embedding;

    use super::*;
    use crate::model::DogDetails;

    #[test]
    fn insert_assigns_increasing_ids() {
        let store = MemoryProfileStore::new();
        let a = store.insert(&DogProfile::new(DogDetails::new("A"), None)).unwrap();
        let b = store.insert(&DogProfile::new(DogDetails::new("B"), None)).unwrap();
        assert_eq!(a, ProfileId(1));
        assert_eq!(b, ProfileId(2));
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn insert_is_not_idempotent() {
        let store = MemoryProfileStore::new();
        let p = DogProfile::new(DogDetails::new("Twice"), Some(Embedding::new(vec![0.5; 4])));
        store.insert(&p).unwrap();
        store.insert(&p).unwrap();
        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_ne!(all[0].id, all[1].id);
        assert_eq!(all[0].profile, all[1].profile);
    }

    #[test]
    fn list_all_is_in_id_order() {
        let store = MemoryProfileStore::new();
        for name in ["a", "b", "c"] {
            store.insert(&DogProfile::new(DogDetails::new(name), None)).unwrap();
        }
        let ids: Vec<u64> = store.list_all().unwrap().iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn concurrent_inserts_get_distinct_ids() {
        let store = Arc::new(MemoryProfileStore::new());
        std::thread::scope(|s| {
            for t in 0..4 {
                let store = store.clone();
                s.spawn(move || {
                    for i in 0..25 {
                        let name = format!("dog-{t}-{i}");
                        store.insert(&DogProfile::new(DogDetails::new(name), None)).unwrap();
                    }
                });
            }
        });
        let mut ids: Vec<u64> = store.list_all().unwrap().iter().map(|p| p.id.0).collect();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }
}
