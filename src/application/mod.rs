// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one user-level goal per file.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// Load data, train, write a checkpoint
pub mod train_use_case;

// Rebuild from a checkpoint, score a split
pub mod evaluate_use_case;

// Rebuild from a checkpoint, classify one image
pub mod predict_use_case;

// Read a checkpoint record without building a model
pub mod inspect_use_case;
