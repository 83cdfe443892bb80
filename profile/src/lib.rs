//! Dog profiles and the profile store.
//!
//! A [`DogProfile`] pairs an optional nose [`Embedding`](snoutid_matcher::Embedding)
//! with descriptive [`DogDetails`]. Profiles are created once and never
//! updated; the store only needs to insert and list.
//!
//! Two [`ProfileStore`] implementations are provided:
//! - [`MemoryProfileStore`] for tests and ephemeral use
//! - [`RedbProfileStore`] for persistence, keeping embeddings in their
//!   raw little-endian layout

mod error;
mod model;
mod redb_store;
mod store;

pub use error::StoreError;
pub use model::{
    DogColor, DogDetails, DogGender, DogProfile, DogType, ProfileId, StoredProfile,
    VaccinationRecord,
};
pub use redb_store::RedbProfileStore;
pub use store::{MemoryProfileStore, ProfileStore};
