// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// system works with: images, network architectures, parameter
// arrays and the errors around persisting them.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Keeping the checkpoint schema here (rather than next to the
// Burn model) means it can be validated and tested without a
// tensor backend.

/// Input/hidden/output widths and positional parameter naming
pub mod architecture;

/// Errors raised by the checkpoint writer and reader
pub mod error;

/// Labelled images, dataset families and splits
pub mod image;

/// Ordered name → array mapping persisted in checkpoints
pub mod state_dict;

/// Core abstractions (traits) that other layers implement
pub mod traits;
