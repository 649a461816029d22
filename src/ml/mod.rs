// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that runs tensors lives here:
//
//   backend.rs    — compile-time choice of NdArray or Wgpu
//
//   model.rs      — the fully-connected classifier
//                   (Linear → ReLU → Dropout)* → Linear → log-softmax
//                   plus state-dict export/import
//
//   trainer.rs    — the training loop with periodic validation
//
//   evaluator.rs  — loss / accuracy over a data loader
//
//   inferencer.rs — single-image prediction from a checkpoint
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Backend aliases
pub mod backend;

/// Classifier architecture
pub mod model;

/// Training loop with validation and metrics
pub mod trainer;

/// Mean loss and accuracy
pub mod evaluator;

/// Inference engine — loads a checkpoint and ranks classes
pub mod inferencer;
