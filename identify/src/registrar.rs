use std::sync::Arc;

use serde::Serialize;
use snoutid_noseprint::Extractor;
use snoutid_profile::{DogProfile, ProfileId, ProfileStore};
use tracing::{debug, info, warn};

use crate::error::IdentifyError;
use crate::session::RegistrationSession;

/// Outcome of submitting a registration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Submission {
    /// One profile was written. `with_embedding` is false when extraction
    /// failed and the dog was registered with its details only.
    Registered { id: ProfileId, with_embedding: bool },
    /// The session was abandoned before the write; nothing was stored.
    Cancelled,
}

/// Writes completed registration sessions to the profile store.
pub struct Registrar {
    extractor: Extractor,
    store: Arc<dyn ProfileStore>,
}

impl Registrar {
    pub fn new(extractor: Extractor, store: Arc<dyn ProfileStore>) -> Self {
        Self { extractor, store }
    }

    /// Extracts the nose photo's embedding and inserts one profile.
    ///
    /// The insert happens strictly after extraction has finished. If the
    /// session is abandoned before that point, the extraction result is
    /// dropped and nothing is written. Two submissions of different
    /// sessions for the same dog create two profiles.
    pub async fn submit(&self, session: RegistrationSession) -> Result<Submission, IdentifyError> {
        let finished = session.finish();
        let cancel = finished.cancel;
        if cancel.is_cancelled() {
            return Ok(Submission::Cancelled);
        }
        if !finished.step.is_done() {
            return Err(IdentifyError::Incomplete(finished.step));
        }

        let embedding = match finished.photos.embedding_photo() {
            Some(photo) => {
                let frame = photo.frame.clone();
                let extractor = self.extractor.clone();
                let task = tokio::task::spawn_blocking(move || extractor.extract(&frame));
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(name = %finished.details.name, "identify: abandoned during extraction, result dropped");
                        return Ok(Submission::Cancelled);
                    }
                    extracted = task => match extracted? {
                        Ok(embedding) => Some(embedding),
                        Err(e) => {
                            warn!(error = %e, name = %finished.details.name, "identify: extraction failed, registering without embedding");
                            None
                        }
                    },
                }
            }
            None => {
                warn!(name = %finished.details.name, "identify: no nose photo, registering without embedding");
                None
            }
        };

        if cancel.is_cancelled() {
            return Ok(Submission::Cancelled);
        }

        let profile = DogProfile::new(finished.details, embedding);
        let with_embedding = profile.has_embedding();
        let store = self.store.clone();
        let id = tokio::task::spawn_blocking(move || store.insert(&profile)).await??;

        info!(%id, with_embedding, "identify: dog registered");
        Ok(Submission::Registered { id, with_embedding })
    }
}
