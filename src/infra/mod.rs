// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence used by more than one layer:
//
//   checkpoint.rs — The checkpoint writer and reader.
//                   One file per model holding the architecture
//                   (input_size, output_size, hidden_layers) and
//                   every named parameter. Loading rebuilds the
//                   model from the recorded widths.
//
//   metrics.rs    — Training metrics logging.
//                   Appends one CSV row per validation pass.

/// Checkpoint writing, reading and model reconstruction
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
