use burn::data::dataset::Dataset;

use crate::domain::image::LabeledImage;

/// In-memory image dataset served to Burn's DataLoader.
pub struct ImageDataset {
    samples: Vec<LabeledImage>,
}

impl ImageDataset {
    pub fn new(samples: Vec<LabeledImage>) -> Self { Self { samples } }

    pub fn samples(&self) -> &[LabeledImage] { &self.samples }

    /// Flattened input width, taken from the first image.
    pub fn input_size(&self) -> Option<usize> {
        self.samples.first().map(LabeledImage::input_size)
    }
}

impl Dataset<LabeledImage> for ImageDataset {
    fn get(&self, index: usize) -> Option<LabeledImage> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
