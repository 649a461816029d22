// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Reads a checkpoint record without building a model and lists
// what it holds: the architecture and each parameter's shape.
// The record is fully validated, so a checkpoint that inspects
// cleanly will also load.

use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::architecture::Architecture;
use crate::infra::checkpoint::{Checkpoint, CheckpointFormat};

#[derive(Debug, Clone)]
pub struct CheckpointSummary {
    pub format:       CheckpointFormat,
    pub architecture: Architecture,
    /// (name, shape) in record order
    pub parameters:   Vec<(String, Vec<usize>)>,
}

impl CheckpointSummary {
    pub fn parameter_count(&self) -> usize {
        self.parameters
            .iter()
            .map(|(_, shape)| shape.iter().product::<usize>())
            .sum()
    }
}

pub fn inspect(path: &Path) -> Result<CheckpointSummary> {
    let format = CheckpointFormat::from_path(path)?;
    let checkpoint = Checkpoint::read(path)
        .with_context(|| format!("Cannot read checkpoint '{}'", path.display()))?;

    let parameters = checkpoint
        .state_dict
        .iter()
        .map(|(name, tensor)| (name.to_string(), tensor.shape.clone()))
        .collect();

    Ok(CheckpointSummary {
        format,
        architecture: checkpoint.architecture(),
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::checkpoint::save_checkpoint;
    use crate::ml::{backend::{default_device, InnerBackend}, model::ClassifierConfig};

    #[test]
    fn lists_parameters_in_layer_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("m.json");
        let model = ClassifierConfig::new(784, 10, vec![64]).init::<InnerBackend>(&default_device());
        save_checkpoint(&model, &path).unwrap();

        let summary = inspect(&path).unwrap();
        assert_eq!(summary.format, CheckpointFormat::Json);
        assert_eq!(summary.architecture, Architecture::new(784, 10, [64]));

        let names: Vec<&str> = summary.parameters.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec![
            "hidden_layers.0.weight",
            "hidden_layers.0.bias",
            "output.weight",
            "output.bias",
        ]);
        assert_eq!(summary.parameter_count(), summary.architecture.parameter_count());
    }
}
