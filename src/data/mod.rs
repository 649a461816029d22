// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw IDX files to tensor batches:
//
//   IDX files (images + labels)
//       │
//       ▼
//   idx / IdxLoader   → parses headers, yields LabeledImages
//       │
//       ▼
//   split_train_val   → seeded shuffle, train/validation split
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher      → normalises pixels, stacks into tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// IDX binary format parser and encoder
pub mod idx;

/// Loads MNIST-style splits from a directory
pub mod loader;

/// Pixel normalisation
pub mod preprocessor;

/// Implements Burn's Dataset trait for labelled images
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
