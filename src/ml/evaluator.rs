// ============================================================
// Layer 5 — Evaluation
// ============================================================
// Mean NLL loss and accuracy of a classifier over a data loader.
// Used for the periodic validation pass during training and for
// the `evaluate` command on a reloaded checkpoint.
//
// Evaluation runs on a non-autodiff backend (model.valid() when
// coming from training), so dropout is inactive and no graph is
// recorded.

use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
    preprocessor::Normalizer,
};
use crate::ml::model::Classifier;

/// Loss and accuracy over a whole dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Mean per-sample NLL loss (NaN when there were no samples)
    pub loss: f64,

    /// Fraction of samples whose arg-max class equals the label
    pub accuracy: f64,

    pub samples: usize,
}

/// Build a DataLoader over `dataset` for backend `B`.
/// `shuffle_seed = None` keeps file order.
pub fn batch_loader<B: Backend>(
    dataset:      ImageDataset,
    batch_size:   usize,
    normalizer:   Normalizer,
    device:       B::Device,
    shuffle_seed: Option<u64>,
) -> Arc<dyn DataLoader<ImageBatch<B>>> {
    let batcher = ImageBatcher::<B>::new(device, normalizer);
    let builder = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size.max(1))
        .num_workers(1);

    match shuffle_seed {
        Some(seed) => builder.shuffle(seed).build(dataset),
        None => builder.build(dataset),
    }
}

pub fn evaluate<B: Backend>(
    model:  &Classifier<B>,
    loader: &dyn DataLoader<ImageBatch<B>>,
) -> EvalReport {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut samples  = 0usize;

    for batch in loader.iter() {
        let [batch_size] = batch.targets.dims();
        let (loss, log_probs) = model.forward_loss(batch.images, batch.targets.clone());

        loss_sum += loss.into_scalar().elem::<f64>() * batch_size as f64;

        // argmax(1) returns [batch, 1]; reshape before comparing with targets
        let predicted = log_probs.argmax(1).reshape([batch_size]);
        let hits: i64 = predicted
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        correct += hits as usize;
        samples += batch_size;
    }

    EvalReport {
        loss:     if samples > 0 { loss_sum / samples as f64 } else { f64::NAN },
        accuracy: if samples > 0 { correct as f64 / samples as f64 } else { 0.0 },
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::LabeledImage;
    use crate::ml::model::ClassifierConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn dataset() -> ImageDataset {
        ImageDataset::new(
            (0..10u8)
                .map(|i| LabeledImage::new(vec![i * 20, 255 - i * 20, 128, 0], i % 2))
                .collect(),
        )
    }

    #[test]
    fn reports_every_sample() {
        let device = Default::default();
        let model = ClassifierConfig::new(4, 2, vec![3]).init::<TestBackend>(&device);
        let loader = batch_loader::<TestBackend>(dataset(), 4, Normalizer::default(), device, None);

        let report = evaluate(&model, loader.as_ref());

        assert_eq!(report.samples, 10);
        assert!(report.loss.is_finite() && report.loss > 0.0);
        assert!((0.0..=1.0).contains(&report.accuracy));
    }

    #[test]
    fn empty_dataset_reports_nan_loss() {
        let device = Default::default();
        let model = ClassifierConfig::new(4, 2, vec![3]).init::<TestBackend>(&device);
        let loader = batch_loader::<TestBackend>(ImageDataset::new(Vec::new()), 4, Normalizer::default(), device, None);

        let report = evaluate(&model, loader.as_ref());
        assert_eq!(report.samples, 0);
        assert!(report.loss.is_nan());
        assert_eq!(report.accuracy, 0.0);
    }
}
