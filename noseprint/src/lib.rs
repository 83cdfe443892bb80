//! Dog nose embedding extraction.
//!
//! # Pipeline
//!
//! 1. Decode the photo ([`snoutid_capture::RawFrame`] or encoded bytes)
//! 2. [`preprocess`]: resize-with-pad to a square input preserving aspect
//!    ratio, then scale channels from `[0, 255]` to `[0, 1]`
//! 3. [`NoseprintModel::infer`]: opaque inference, tensor -> 128 floats
//!
//! The preprocessing must match the model's training-time transform
//! exactly; it pads and never crops.
//!
//! # Models
//!
//! Models are looked up by id in a [`ModelRegistry`] when an [`Extractor`]
//! is built, so a missing or broken model surfaces once, as
//! [`ExtractError::ModelUnavailable`], rather than on every photo.
//! [`ModelId::LUMA_GRID_128`] is a built-in, training-free reference model.

mod error;
mod extractor;
mod grid;
mod model;
pub mod preprocess;
mod registry;

pub use error::ExtractError;
pub use extractor::Extractor;
pub use grid::LumaGridModel;
pub use model::NoseprintModel;
pub use preprocess::{ImageTensor, INPUT_SIZE};
pub use registry::{ModelId, ModelLoader, ModelRegistry};
