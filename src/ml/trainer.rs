// ============================================================
// Layer 5 — Training Loop
// ============================================================
// A plain gradient-descent loop over Burn's DataLoader:
//
//   for each batch:
//     log_probs = model(images)
//     loss      = NLL(log_probs, targets)
//     grads     = loss.backward()
//     model     = optimiser.step(lr, model, grads)
//
// Every `print_every` steps the model is switched to the inner
// (non-autodiff) backend with model.valid(), which also disables
// dropout, and evaluated on the validation set.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{Context, Result};
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
};

use crate::application::train_use_case::{OptimizerKind, TrainConfig};
use crate::data::{dataset::ImageDataset, loader::check_labels, preprocessor::Normalizer};
use crate::infra::metrics::{MetricsLogger, StepMetrics};
use crate::ml::backend::{backend_name, default_device, Device, InnerBackend, TrainBackend};
use crate::ml::evaluator::{batch_loader, evaluate, EvalReport};
use crate::ml::model::{Classifier, ClassifierConfig};

/// The trained model, already moved to the inference backend.
pub struct TrainOutcome {
    pub model:           Classifier<InnerBackend>,
    pub steps:           usize,
    pub last_validation: Option<EvalReport>,
}

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    metrics:       &MetricsLogger,
) -> Result<TrainOutcome> {
    let device = default_device();
    tracing::info!("Using {} device: {:?}", backend_name(), device);

    let input_size = train_dataset
        .input_size()
        .context("Training set is empty")?;

    let num_classes = cfg.dataset.num_classes();
    check_labels(train_dataset.samples(), num_classes).context("Invalid training labels")?;
    check_labels(val_dataset.samples(), num_classes).context("Invalid validation labels")?;

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = ClassifierConfig::new(
        input_size,
        num_classes,
        cfg.hidden_layers.clone(),
    )
    .with_dropout(cfg.dropout);
    model_cfg.architecture().validate()?;

    let model: Classifier<TrainBackend> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} ({} parameters), optimizer={}",
        model_cfg.architecture(),
        model_cfg.architecture().parameter_count(),
        cfg.optimizer,
    );

    match cfg.optimizer {
        OptimizerKind::Adam => train_loop(
            cfg, model, AdamConfig::new().init::<TrainBackend, Classifier<TrainBackend>>(), train_dataset, val_dataset, metrics, device,
        ),
        OptimizerKind::Sgd => train_loop(
            cfg, model, SgdConfig::new().init::<TrainBackend, Classifier<TrainBackend>>(), train_dataset, val_dataset, metrics, device,
        ),
    }
}

fn train_loop<O>(
    cfg:           &TrainConfig,
    mut model:     Classifier<TrainBackend>,
    mut optim:     O,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    metrics:       &MetricsLogger,
    device:        Device,
) -> Result<TrainOutcome>
where
    O: Optimizer<Classifier<TrainBackend>, TrainBackend>,
{
    let normalizer = Normalizer::default();

    let train_loader = batch_loader::<TrainBackend>(
        train_dataset, cfg.batch_size, normalizer, device.clone(), Some(cfg.seed),
    );
    // Validation stays on the inner backend: no autodiff overhead
    let val_loader = batch_loader::<InnerBackend>(
        val_dataset, cfg.batch_size, normalizer, device, None,
    );

    let print_every = cfg.print_every.max(1);
    let mut steps           = 0usize;
    let mut running_loss    = 0.0f64;
    let mut running_batches = 0usize;
    let mut last_validation = None;

    for epoch in 1..=cfg.epochs {
        for batch in train_loader.iter() {
            steps += 1;

            let (loss, _) = model.forward_loss(batch.images, batch.targets);
            running_loss    += loss.clone().into_scalar().elem::<f64>();
            running_batches += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);

            if steps % print_every == 0 {
                let report = evaluate(&model.valid(), val_loader.as_ref());
                record(metrics, epoch, cfg.epochs, steps, running_loss / running_batches as f64, &report)?;
                running_loss    = 0.0;
                running_batches = 0;
                last_validation = Some(report);
            }
        }
    }

    // Flush whatever ran since the last report
    if running_batches > 0 {
        let report = evaluate(&model.valid(), val_loader.as_ref());
        record(metrics, cfg.epochs, cfg.epochs, steps, running_loss / running_batches as f64, &report)?;
        last_validation = Some(report);
    }

    tracing::info!("Training complete after {} steps", steps);
    Ok(TrainOutcome {
        model: model.valid(),
        steps,
        last_validation,
    })
}

fn record(
    metrics:    &MetricsLogger,
    epoch:      usize,
    epochs:     usize,
    step:       usize,
    train_loss: f64,
    report:     &EvalReport,
) -> Result<()> {
    tracing::info!(
        "Epoch: {}/{}.. Training Loss: {:.3}.. Validation Loss: {:.3}.. Validation Accuracy: {:.3}",
        epoch, epochs, train_loss, report.loss, report.accuracy,
    );
    metrics.log(&StepMetrics::new(epoch, step, train_loss, report.loss, report.accuracy))
}
