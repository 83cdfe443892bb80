use crate::error::ExtractError;
use crate::preprocess::ImageTensor;

/// Computes a nose embedding from a preprocessed image tensor.
///
/// The model is an opaque function: its architecture is not part of this
/// contract. Input is a square RGB tensor of side [`input_size`], scaled
/// to `[0, 1]`. Output is a dense f32 vector of length [`dimension`].
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use. A model whose engine
/// is not reentrant must serialize internally.
///
/// [`input_size`]: NoseprintModel::input_size
/// [`dimension`]: NoseprintModel::dimension
pub trait NoseprintModel: Send + Sync {
    /// Runs inference. Failures should be reported as
    /// [`ExtractError::InferenceFailure`].
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, ExtractError>;

    /// Side length of the square input, in pixels (e.g., 224).
    fn input_size(&self) -> u32;

    /// Length of the embedding vectors (e.g., 128).
    fn dimension(&self) -> usize;
}
