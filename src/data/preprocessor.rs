// ============================================================
// Layer 4 — Pixel Normaliser
// ============================================================
// Maps raw u8 intensities onto the range the network trains on:
//
//   x = (pixel / 255 - mean) / std
//
// With the default mean = std = 0.5 this lands every pixel in
// [-1, 1], centred on zero. The same normaliser must be used for
// training, evaluation and prediction.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    pub mean: f32,
    pub std:  f32,
}

impl Normalizer {
    pub fn new(mean: f32, std: f32) -> Self {
        Self { mean, std }
    }

    pub fn normalize(&self, pixel: u8) -> f32 {
        (f32::from(pixel) / 255.0 - self.mean) / self.std
    }

    /// Normalise a whole image, appending to `out`.
    pub fn extend_normalized(&self, pixels: &[u8], out: &mut Vec<f32>) {
        out.extend(pixels.iter().map(|&p| self.normalize(p)));
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}
