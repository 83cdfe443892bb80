use std::sync::Arc;

use bytes::Bytes;
use snoutid_capture::RawFrame;
use snoutid_matcher::{Decision, Embedding, Matcher};
use snoutid_noseprint::{ExtractError, Extractor};
use snoutid_profile::{ProfileStore, StoredProfile};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::IdentifyError;
use crate::report::Report;

/// Query photo as handed to the extractor.
enum Query {
    Frame(RawFrame),
    Encoded(Bytes),
}

/// Identifies a dog from a single nose photo against every stored profile.
///
/// Holds shared handles only, so one `Identifier` can serve any number of
/// concurrent queries. Extraction and store reads run on tokio's blocking
/// pool.
pub struct Identifier {
    extractor: Extractor,
    store: Arc<dyn ProfileStore>,
    matcher: Matcher,
}

impl Identifier {
    pub fn new(extractor: Extractor, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            extractor,
            store,
            matcher: Matcher::new(),
        }
    }

    /// Replaces the default matcher (threshold 0.8).
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Identifies the dog in a captured frame.
    pub async fn identify(&self, frame: RawFrame) -> Result<Report, IdentifyError> {
        self.run(Query::Frame(frame)).await
    }

    /// Identifies the dog in an encoded photo (JPEG, PNG, ...), e.g. one
    /// picked from a gallery.
    pub async fn identify_encoded(&self, data: impl Into<Bytes>) -> Result<Report, IdentifyError> {
        self.run(Query::Encoded(data.into())).await
    }

    /// Like [`Identifier::identify`], but gives up when `cancel` fires.
    ///
    /// Returns `None` if cancelled; a result that arrives after
    /// cancellation is dropped.
    pub async fn identify_until(
        &self,
        frame: RawFrame,
        cancel: &CancellationToken,
    ) -> Result<Option<Report>, IdentifyError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("identify: cancelled, result dropped");
                Ok(None)
            }
            report = self.identify(frame) => report.map(Some),
        }
    }

    /// Matches an already extracted embedding against the store.
    pub async fn identify_embedding(&self, query: Embedding) -> Result<Report, IdentifyError> {
        let store = self.store.clone();
        let profiles = tokio::task::spawn_blocking(move || store.list_all()).await??;
        Ok(self.decide(&query, &profiles))
    }

    async fn run(&self, query: Query) -> Result<Report, IdentifyError> {
        let extractor = self.extractor.clone();
        let extracted = tokio::task::spawn_blocking(move || match query {
            Query::Frame(frame) => extractor.extract(&frame),
            Query::Encoded(data) => extractor.extract_encoded(&data),
        })
        .await?;

        match extracted {
            Ok(embedding) => self.identify_embedding(embedding).await,
            Err(e) => Ok(extraction_failed(e)),
        }
    }

    fn decide(&self, query: &Embedding, profiles: &[StoredProfile]) -> Report {
        if profiles.is_empty() {
            info!("identify: store is empty");
            return Report::NoData;
        }

        let result = self.matcher.match_candidates(query, profiles);
        debug!(
            candidates = profiles.len(),
            decision = %result.decision,
            distance = result.distance,
            "identify: matched"
        );

        match (result.decision, result.profile_id) {
            (Decision::Match, Some(id)) => {
                let Some(hit) = profiles.iter().find(|p| p.id == id) else {
                    // The matcher only returns ids it was given.
                    warn!(%id, "identify: matched id not among candidates");
                    return Report::NoMatch {
                        distance: result.distance,
                    };
                };
                info!(%id, distance = result.distance, "identify: match");
                Report::Match {
                    id,
                    name: hit.profile.details.name.clone(),
                    breed: hit.profile.details.breed.clone(),
                    distance: result.distance,
                }
            }
            (Decision::NoData, _) => Report::NoData,
            _ => Report::NoMatch {
                distance: result.distance,
            },
        }
    }
}

fn extraction_failed(e: ExtractError) -> Report {
    warn!(error = %e, "identify: extraction failed");
    Report::ExtractionFailed {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use snoutid_matcher::EMBEDDING_DIM;
    use snoutid_noseprint::{ImageTensor, NoseprintModel, INPUT_SIZE};
    use snoutid_profile::{DogDetails, DogProfile, MemoryProfileStore, ProfileId};

    use super::*;

    /// Always returns the same vector.
    struct ConstModel {
        output: Vec<f32>,
        calls: AtomicUsize,
    }

    impl NoseprintModel for ConstModel {
        fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }

        fn input_size(&self) -> u32 {
            INPUT_SIZE
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }
    }

    /// Lists profiles but counts how often it was asked.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryProfileStore,
        lists: AtomicUsize,
    }

    impl ProfileStore for CountingStore {
        fn insert(&self, profile: &DogProfile) -> Result<ProfileId, snoutid_profile::StoreError> {
            self.inner.insert(profile)
        }

        fn list_all(&self) -> Result<Vec<StoredProfile>, snoutid_profile::StoreError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list_all()
        }
    }

    fn unit(i: usize) -> Vec<f32> {
        let mut v = vec![0.0; EMBEDDING_DIM];
        v[i] = 1.0;
        v
    }

    fn setup(output: Vec<f32>) -> (Arc<ConstModel>, Arc<CountingStore>, Identifier) {
        let model = Arc::new(ConstModel {
            output,
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(CountingStore::default());
        let extractor = Extractor::from_model("const", model.clone()).unwrap();
        let identifier = Identifier::new(extractor, store.clone());
        (model, store, identifier)
    }

    fn gray_frame() -> RawFrame {
        let data: Vec<u8> = (0..64 * 64).map(|i| (i % 251) as u8).collect();
        RawFrame::gray(data, 64, 64).unwrap()
    }

    #[tokio::test]
    async fn empty_store_is_no_data() {
        let (model, store, identifier) = setup(unit(0));
        let report = identifier.identify(gray_frame()).await.unwrap();
        assert_eq!(report, Report::NoData);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn profiles_without_embeddings_are_no_data() {
        let (_, store, identifier) = setup(unit(0));
        store
            .insert(&DogProfile::new(DogDetails::new("Ghost"), None))
            .unwrap();
        let report = identifier.identify(gray_frame()).await.unwrap();
        assert_eq!(report, Report::NoData);
    }

    #[tokio::test]
    async fn match_reports_name_and_breed() {
        let (_, store, identifier) = setup(unit(0));
        store
            .insert(&DogProfile::new(
                DogDetails::new("Far").with_breed("Husky"),
                Some(Embedding::new(unit(1))),
            ))
            .unwrap();
        let near = store
            .insert(&DogProfile::new(
                DogDetails::new("Rex").with_breed("Beagle"),
                Some(Embedding::new(unit(0))),
            ))
            .unwrap();

        let report = identifier.identify(gray_frame()).await.unwrap();
        assert_eq!(
            report,
            Report::Match {
                id: near,
                name: "Rex".into(),
                breed: "Beagle".into(),
                distance: 0.0,
            }
        );
    }

    #[tokio::test]
    async fn far_candidate_is_no_match() {
        let (_, store, identifier) = setup(unit(0));
        store
            .insert(&DogProfile::new(
                DogDetails::new("Far"),
                Some(Embedding::new(unit(1))),
            ))
            .unwrap();
        let report = identifier.identify(gray_frame()).await.unwrap();
        let Report::NoMatch { distance } = report else {
            panic!("expected no match, got {report:?}");
        };
        assert!((distance - 2f32.sqrt()).abs() < 1e-6);
    }

    #[tokio::test]
    async fn only_mismatched_embeddings_is_no_match() {
        let (_, store, identifier) = setup(unit(0));
        store
            .insert(&DogProfile::new(
                DogDetails::new("Odd"),
                Some(Embedding::new(vec![0.0; 64])),
            ))
            .unwrap();
        let report = identifier.identify(gray_frame()).await.unwrap();
        assert_eq!(
            report,
            Report::NoMatch {
                distance: f32::INFINITY
            }
        );
        assert!(report.to_string().contains("could be compared"));
    }

    #[tokio::test]
    async fn custom_threshold_widens_matches() {
        let (_, store, identifier) = setup(unit(0));
        store
            .insert(&DogProfile::new(
                DogDetails::new("Far"),
                Some(Embedding::new(unit(1))),
            ))
            .unwrap();
        let identifier = identifier.with_matcher(Matcher::with_threshold(1.5));
        let report = identifier.identify(gray_frame()).await.unwrap();
        assert!(report.is_match(), "got {report:?}");
    }

    #[tokio::test]
    async fn undecodable_photo_short_circuits() {
        let (model, store, identifier) = setup(unit(0));
        let report = identifier
            .identify_encoded(&b"definitely not a jpeg"[..])
            .await
            .unwrap();
        assert!(matches!(report, Report::ExtractionFailed { .. }));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_identification_returns_none() {
        let (_, _, identifier) = setup(unit(0));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = identifier.identify_until(gray_frame(), &cancel).await.unwrap();
        assert!(report.is_none());
    }

    /// Sleeps before answering.
    struct SlowModel;

    impl NoseprintModel for SlowModel {
        fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>, ExtractError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(unit(0))
        }

        fn input_size(&self) -> u32 {
            INPUT_SIZE
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }
    }

    #[tokio::test]
    async fn cancelled_during_extraction_drops_the_result() {
        let store = Arc::new(CountingStore::default());
        store
            .insert(&DogProfile::new(
                DogDetails::new("Rex"),
                Some(Embedding::new(unit(0))),
            ))
            .unwrap();
        let extractor = Extractor::from_model("slow", Arc::new(SlowModel)).unwrap();
        let identifier = Identifier::new(extractor, store.clone());

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let report = identifier.identify_until(gray_frame(), &cancel).await.unwrap();
        canceller.await.unwrap();
        assert!(report.is_none());

        // The abandoned extraction finishes in the background and never
        // reaches the store.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_queries() {
        let (_, store, identifier) = setup(unit(0));
        store
            .insert(&DogProfile::new(
                DogDetails::new("Rex"),
                Some(Embedding::new(unit(0))),
            ))
            .unwrap();
        let identifier = Arc::new(identifier);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let identifier = identifier.clone();
            handles.push(tokio::spawn(async move {
                identifier.identify(gray_frame()).await
            }));
        }
        for h in handles {
            assert!(h.await.unwrap().unwrap().is_match());
        }
    }
}
