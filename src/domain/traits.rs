// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads images through this trait so it
// never depends on a specific file format. IdxLoader (data layer)
// is the implementation used for MNIST-style datasets.

use anyhow::Result;

use crate::domain::image::{LabeledImage, Split};

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can produce labelled images for a split.
pub trait ImageSource {
    /// Load every image of the requested split, in file order.
    fn load_split(&self, split: Split) -> Result<Vec<LabeledImage>>;
}
