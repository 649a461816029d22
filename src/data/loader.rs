// ============================================================
// Layer 4 — IDX Dataset Loader
// ============================================================
// Loads an MNIST-style split from a data directory holding the
// four standard files:
//
//   train-images-idx3-ubyte   train-labels-idx1-ubyte
//   t10k-images-idx3-ubyte    t10k-labels-idx1-ubyte
//
// The files must be decompressed; both MNIST and Fashion-MNIST
// use the same names, so one loader serves both.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::idx::{self, DatasetError};
use crate::domain::image::{LabeledImage, Split};
use crate::domain::traits::ImageSource;

/// Reads IDX image/label pairs from a directory.
pub struct IdxLoader {
    dir: PathBuf,
}

impl IdxLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// (images, labels) file paths for a split.
    pub fn paths(&self, split: Split) -> (PathBuf, PathBuf) {
        let prefix = match split {
            Split::Train => "train",
            Split::Test => "t10k",
        };
        (
            self.dir.join(format!("{prefix}-images-idx3-ubyte")),
            self.dir.join(format!("{prefix}-labels-idx1-ubyte")),
        )
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, DatasetError> {
    fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Every label must name one of the model's `num_classes` outputs.
pub fn check_labels(samples: &[LabeledImage], num_classes: usize) -> Result<(), DatasetError> {
    match samples.iter().position(|s| s.label as usize >= num_classes) {
        Some(index) => Err(DatasetError::LabelOutOfRange {
            index,
            label: samples[index].label,
            num_classes,
        }),
        None => Ok(()),
    }
}

impl ImageSource for IdxLoader {
    fn load_split(&self, split: Split) -> Result<Vec<LabeledImage>> {
        let (images_path, labels_path) = self.paths(split);

        let images = idx::parse_images(&read_file(&images_path)?)
            .with_context(|| format!("Cannot parse '{}'", images_path.display()))?;
        let labels = idx::parse_labels(&read_file(&labels_path)?)
            .with_context(|| format!("Cannot parse '{}'", labels_path.display()))?;

        if images.count != labels.len() {
            return Err(DatasetError::CountMismatch {
                images: images.count,
                labels: labels.len(),
            }
            .into());
        }

        let samples: Vec<LabeledImage> = images
            .iter()
            .zip(labels)
            .map(|(pixels, label)| LabeledImage::new(pixels.to_vec(), label))
            .collect();

        tracing::info!(
            "Loaded {} {} images ({}x{}) from '{}'",
            samples.len(),
            split.name(),
            images.rows,
            images.cols,
            self.dir.display()
        );
        Ok(samples)
    }
}
