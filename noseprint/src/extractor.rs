use std::fmt;
use std::sync::Arc;

use image::DynamicImage;
use snoutid_capture::RawFrame;
use snoutid_matcher::{Embedding, EMBEDDING_DIM};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::model::NoseprintModel;
use crate::preprocess::preprocess;
use crate::registry::ModelRegistry;

/// Turns nose photos into embeddings.
///
/// Holds one shared model handle, loaded once. Extraction is
/// referentially transparent for a fixed model and input, and `Extractor`
/// is safe to share across threads; concurrent calls are allowed.
#[derive(Clone)]
pub struct Extractor {
    model: Arc<dyn NoseprintModel>,
    model_id: String,
}

impl Extractor {
    /// Loads `model_id` from `registry`.
    ///
    /// Fails with [`ExtractError::ModelUnavailable`] if the id is unknown,
    /// the loader fails, or the model does not produce standard-size
    /// embeddings.
    pub fn new(registry: &ModelRegistry, model_id: &str) -> Result<Self, ExtractError> {
        let model = registry.load(model_id)?;
        Self::from_model(model_id, model)
    }

    /// Wraps an already-loaded model.
    pub fn from_model(
        model_id: &str,
        model: Arc<dyn NoseprintModel>,
    ) -> Result<Self, ExtractError> {
        if model.dimension() != EMBEDDING_DIM {
            return Err(ExtractError::ModelUnavailable(format!(
                "{model_id}: produces {}-dim embeddings, want {EMBEDDING_DIM}",
                model.dimension()
            )));
        }
        if model.input_size() == 0 {
            return Err(ExtractError::ModelUnavailable(format!(
                "{model_id}: zero input size"
            )));
        }
        Ok(Self {
            model,
            model_id: model_id.to_string(),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Extracts an embedding from a captured frame.
    pub fn extract(&self, frame: &RawFrame) -> Result<Embedding, ExtractError> {
        let img = frame
            .decode()
            .map_err(|e| ExtractError::DecodeFailure(e.to_string()))?;
        self.extract_image(&img)
    }

    /// Extracts an embedding from encoded image bytes (JPEG, PNG, ...).
    pub fn extract_encoded(&self, data: &[u8]) -> Result<Embedding, ExtractError> {
        let img = image::load_from_memory(data)
            .map_err(|e| ExtractError::DecodeFailure(e.to_string()))?;
        self.extract_image(&img)
    }

    /// Extracts an embedding from a decoded image.
    pub fn extract_image(&self, img: &DynamicImage) -> Result<Embedding, ExtractError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(ExtractError::DecodeFailure("image has no pixels".into()));
        }

        let input = preprocess(img, self.model.input_size());
        let output = self.model.infer(&input).inspect_err(|e| {
            warn!(model = %self.model_id, error = %e, "noseprint: inference failed");
        })?;

        if let Some(i) = output.iter().position(|v| !v.is_finite()) {
            return Err(ExtractError::InferenceFailure(format!(
                "non-finite value at index {i}"
            )));
        }
        let embedding = Embedding::with_dim(output, EMBEDDING_DIM)
            .map_err(|e| ExtractError::InferenceFailure(e.to_string()))?;

        debug!(
            model = %self.model_id,
            width = img.width(),
            height = img.height(),
            "noseprint: embedding extracted"
        );
        Ok(embedding)
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("model_id", &self.model_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{GrayImage, Luma};

    use super::*;
    use crate::preprocess::{ImageTensor, INPUT_SIZE};
    use crate::registry::ModelId;

    /// Returns a fixed vector and records the input it saw.
    struct FixedModel {
        output: Vec<f32>,
        dim: usize,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(output: Vec<f32>) -> Self {
            Self {
                dim: EMBEDDING_DIM,
                output,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl NoseprintModel for FixedModel {
        fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, ExtractError> {
            assert_eq!(input.size(), INPUT_SIZE);
            assert!(input.data().iter().all(|v| (0.0..=1.0).contains(v)));
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }

        fn input_size(&self) -> u32 {
            INPUT_SIZE
        }

        fn dimension(&self) -> usize {
            self.dim
        }
    }

    struct FailingModel;

    impl NoseprintModel for FailingModel {
        fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>, ExtractError> {
            Err(ExtractError::InferenceFailure("delegate crashed".into()))
        }

        fn input_size(&self) -> u32 {
            INPUT_SIZE
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }
    }

    fn textured_png() -> Vec<u8> {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(120, 90, |x, y| {
            Luma([((x * 7 + y * 3) % 256) as u8])
        }));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn builtin_extractor_end_to_end() {
        let ex = Extractor::new(&ModelRegistry::with_builtin(), ModelId::LUMA_GRID_128).unwrap();
        let png = textured_png();
        let a = ex.extract_encoded(&png).unwrap();
        let frame = RawFrame::encoded(png).unwrap();
        let b = ex.extract(&frame).unwrap();
        assert_eq!(a.len(), EMBEDDING_DIM);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_model_fails_at_construction() {
        let err = Extractor::new(&ModelRegistry::new(), "missing").unwrap_err();
        assert!(matches!(err, ExtractError::ModelUnavailable(_)));
    }

    #[test]
    fn wrong_dimension_model_is_unavailable() {
        let mut model = FixedModel::new(vec![0.0; 64]);
        model.dim = 64;
        let err = Extractor::from_model("small", Arc::new(model)).unwrap_err();
        assert!(matches!(err, ExtractError::ModelUnavailable(_)));
    }

    #[test]
    fn undecodable_input_is_decode_failure() {
        let model = Arc::new(FixedModel::new(vec![0.0; EMBEDDING_DIM]));
        let ex = Extractor::from_model("fixed", model.clone()).unwrap();
        let err = ex.extract_encoded(b"not an image").unwrap_err();
        assert!(matches!(err, ExtractError::DecodeFailure(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn model_error_is_inference_failure() {
        let ex = Extractor::from_model("failing", Arc::new(FailingModel)).unwrap();
        let err = ex.extract_encoded(&textured_png()).unwrap_err();
        assert!(matches!(err, ExtractError::InferenceFailure(_)));
    }

    #[test]
    fn short_output_is_inference_failure() {
        let mut model = FixedModel::new(vec![0.0; 10]);
        model.dim = EMBEDDING_DIM;
        let ex = Extractor::from_model("liar", Arc::new(model)).unwrap();
        let err = ex.extract_encoded(&textured_png()).unwrap_err();
        assert!(matches!(err, ExtractError::InferenceFailure(_)));
    }

    #[test]
    fn nan_output_is_inference_failure() {
        let mut out = vec![0.0; EMBEDDING_DIM];
        out[17] = f32::NAN;
        let ex = Extractor::from_model("nan", Arc::new(FixedModel::new(out))).unwrap();
        let err = ex.extract_encoded(&textured_png()).unwrap_err();
        assert!(err.to_string().contains("index 17"));
    }

    #[test]
    fn concurrent_extraction() {
        let ex = Extractor::new(&ModelRegistry::with_builtin(), ModelId::LUMA_GRID_128).unwrap();
        let png = textured_png();
        let expected = ex.extract_encoded(&png).unwrap();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| ex.extract_encoded(&png).unwrap()))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }
}
