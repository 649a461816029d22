// ============================================================
// Layer 3 — Image Domain Types
// ============================================================
// A labelled grayscale image and the two dataset families the
// tool knows how to name: MNIST digits and Fashion-MNIST garments.
// Both ship as 28x28 u8 images with 10 classes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One flattened grayscale image and its class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledImage {
    /// Row-major pixel intensities, 0 = background, 255 = ink
    pub pixels: Vec<u8>,

    /// Class index in `0..num_classes`
    pub label: u8,
}

impl LabeledImage {
    pub fn new(pixels: Vec<u8>, label: u8) -> Self {
        Self { pixels, label }
    }

    /// Width of the flattened input this image produces.
    pub fn input_size(&self) -> usize {
        self.pixels.len()
    }
}

/// Which half of a dataset to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "train" => Ok(Self::Train),
            "test" | "t10k" => Ok(Self::Test),
            other => Err(format!("unknown split '{other}' (expected train or test)")),
        }
    }
}

const DIGIT_CLASSES: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

const FASHION_CLASSES: [&str; 10] = [
    "T-shirt/top",
    "Trouser",
    "Pullover",
    "Dress",
    "Coat",
    "Sandal",
    "Shirt",
    "Sneaker",
    "Bag",
    "Ankle boot",
];

/// The dataset family, used to name predicted classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DatasetKind {
    #[default]
    Mnist,
    FashionMnist,
}

impl DatasetKind {
    pub fn class_names(&self) -> &'static [&'static str] {
        match self {
            Self::Mnist => &DIGIT_CLASSES,
            Self::FashionMnist => &FASHION_CLASSES,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.class_names().len()
    }

    /// Class name for an index, or the index itself if out of range.
    pub fn class_name(&self, index: usize) -> String {
        self.class_names()
            .get(index)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("class {index}"))
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mnist => write!(f, "mnist"),
            Self::FashionMnist => write!(f, "fashion-mnist"),
        }
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "mnist" => Ok(Self::Mnist),
            "fashion-mnist" | "fashion" => Ok(Self::FashionMnist),
            other => Err(format!(
                "unknown dataset '{other}' (expected mnist or fashion-mnist)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_kind_parses_aliases() {
        assert_eq!("mnist".parse::<DatasetKind>(), Ok(DatasetKind::Mnist));
        assert_eq!("Fashion_MNIST".parse::<DatasetKind>(), Ok(DatasetKind::FashionMnist));
        assert_eq!("fashion".parse::<DatasetKind>(), Ok(DatasetKind::FashionMnist));
        assert!("cifar".parse::<DatasetKind>().is_err());
    }

    #[test]
    fn class_names() {
        assert_eq!(DatasetKind::Mnist.num_classes(), 10);
        assert_eq!(DatasetKind::FashionMnist.class_name(9), "Ankle boot");
        assert_eq!(DatasetKind::Mnist.class_name(12), "class 12");
    }

    #[test]
    fn split_parses() {
        assert_eq!("train".parse::<Split>(), Ok(Split::Train));
        assert_eq!("t10k".parse::<Split>(), Ok(Split::Test));
        assert!("valid".parse::<Split>().is_err());
    }
}
