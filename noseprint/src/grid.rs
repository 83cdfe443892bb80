//! Built-in reference model that needs no trained weights.

use snoutid_matcher::EMBEDDING_DIM;

use crate::error::ExtractError;
use crate::model::NoseprintModel;
use crate::preprocess::{ImageTensor, INPUT_SIZE};

const GRID_COLS: usize = 16;
const GRID_ROWS: usize = 8;

/// [`NoseprintModel`] that summarizes the image as a 16x8 grid of mean
/// luma values, mean-centered and L2-normalized.
///
/// Identical photos map to identical vectors and uniform brightness
/// changes cancel out, but it has no notion of nose texture. It lets the
/// full capture/register/identify pipeline run without a trained network.
#[derive(Debug, Clone, Default)]
pub struct LumaGridModel;

impl LumaGridModel {
    pub fn new() -> Self {
        Self
    }
}

impl NoseprintModel for LumaGridModel {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, ExtractError> {
        let size = input.size() as usize;
        if size < GRID_COLS.max(GRID_ROWS) {
            return Err(ExtractError::InferenceFailure(format!(
                "input {size}x{size} smaller than the {GRID_COLS}x{GRID_ROWS} grid"
            )));
        }
        if input.data().len() != size * size * 3 {
            return Err(ExtractError::InferenceFailure(format!(
                "tensor has {} values, want {}",
                input.data().len(),
                size * size * 3
            )));
        }

        let mut cells = vec![0.0f64; GRID_COLS * GRID_ROWS];
        for (row, cell_row) in cells.chunks_mut(GRID_COLS).enumerate() {
            let (y0, y1) = (row * size / GRID_ROWS, (row + 1) * size / GRID_ROWS);
            for (col, cell) in cell_row.iter_mut().enumerate() {
                let (x0, x1) = (col * size / GRID_COLS, (col + 1) * size / GRID_COLS);
                let mut sum = 0.0f64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        let [r, g, b] = input.pixel(x as u32, y as u32);
                        sum += 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
                    }
                }
                *cell = sum / ((y1 - y0) * (x1 - x0)) as f64;
            }
        }

        let mean = cells.iter().sum::<f64>() / cells.len() as f64;
        for c in &mut cells {
            *c -= mean;
        }
        let norm = cells.iter().map(|c| c * c).sum::<f64>().sqrt();
        if norm > 0.0 {
            for c in &mut cells {
                *c /= norm;
            }
        }
        Ok(cells.into_iter().map(|c| c as f32).collect())
    }

    fn input_size(&self) -> u32 {
        INPUT_SIZE
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}
