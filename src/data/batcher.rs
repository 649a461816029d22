// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<LabeledImage>
// into tensors the classifier can consume:
//
//   images:  [batch_size, rows*cols]  normalised f32
//   targets: [batch_size]             class indices
//
// Every image in a dataset has the same size, so the pixels of
// all samples are flattened into one Vec and reshaped once.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::preprocessor::Normalizer;
use crate::domain::image::LabeledImage;

/// A batch of images ready for the forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Shape: [batch_size, input_size]
    pub images: Tensor<B, 2>,

    /// Shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Holds the target device and the normaliser applied to pixels.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device:     B::Device,
    pub normalizer: Normalizer,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, normalizer: Normalizer) -> Self {
        Self { device, normalizer }
    }

    /// Normalise and stack images without labels.
    pub fn images(&self, items: &[LabeledImage]) -> Tensor<B, 2> {
        let batch_size = items.len();
        let input_size = items.first().map(LabeledImage::input_size).unwrap_or(0);

        let mut flat = Vec::with_capacity(batch_size * input_size);
        for item in items {
            self.normalizer.extend_normalized(&item.pixels, &mut flat);
        }

        Tensor::<B, 2>::from_data(
            TensorData::new(flat, [batch_size, input_size]),
            &self.device,
        )
    }
}

impl<B: Backend> Batcher<LabeledImage, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<LabeledImage>) -> ImageBatch<B> {
        let images = self.images(&items);

        let labels: Vec<i32> = items.iter().map(|s| i32::from(s.label)).collect();
        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, targets }
    }
}
