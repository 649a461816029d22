// ============================================================
// Layer 3 — Network Architecture Descriptor
// ============================================================
// Describes the shape of a fully-connected classifier:
//
//   input_size ─► hidden_layers[0] ─► ... ─► hidden_layers[n-1] ─► output_size
//
// This is the metadata a checkpoint stores next to the weights,
// so a loader can rebuild the exact network before filling it.
//
// Parameter naming is positional and stable:
//   hidden_layers.{i}.weight   (hidden_layers[i], previous width)
//   hidden_layers.{i}.bias     (hidden_layers[i],)
//   output.weight              (output_size, hidden_layers[n-1])
//   output.bias                (output_size,)

use serde::{Deserialize, Serialize};

use crate::domain::error::CheckpointError;

/// Input width, output width and the ordered hidden-layer widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    /// Width of the flattened input fed to the first layer
    pub input_size: usize,

    /// Number of output classes
    pub output_size: usize,

    /// One width per hidden layer, input-adjacent first
    pub hidden_layers: Vec<usize>,
}

/// One linear layer of the network as seen by the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    /// Key prefix, e.g. `hidden_layers.2` or `output`
    pub prefix: String,
    pub in_features: usize,
    pub out_features: usize,
}

impl LayerSpec {
    pub fn weight_key(&self) -> String {
        format!("{}.weight", self.prefix)
    }

    pub fn bias_key(&self) -> String {
        format!("{}.bias", self.prefix)
    }

    /// Weights are stored as (out_features, in_features).
    pub fn weight_shape(&self) -> Vec<usize> {
        vec![self.out_features, self.in_features]
    }

    pub fn bias_shape(&self) -> Vec<usize> {
        vec![self.out_features]
    }
}

impl Architecture {
    pub fn new(input_size: usize, output_size: usize, hidden_layers: impl Into<Vec<usize>>) -> Self {
        Self {
            input_size,
            output_size,
            hidden_layers: hidden_layers.into(),
        }
    }

    /// Reject descriptors that can't describe a multi-layer classifier.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.input_size == 0 {
            return Err(CheckpointError::invalid_architecture("input_size must be positive"));
        }
        if self.output_size == 0 {
            return Err(CheckpointError::invalid_architecture("output_size must be positive"));
        }
        if self.hidden_layers.is_empty() {
            return Err(CheckpointError::invalid_architecture(
                "at least one hidden layer is required",
            ));
        }
        if let Some(i) = self.hidden_layers.iter().position(|&w| w == 0) {
            return Err(CheckpointError::invalid_architecture(format!(
                "hidden layer {i} has width 0"
            )));
        }
        Ok(())
    }

    /// Hidden layers plus the output layer.
    pub fn layer_count(&self) -> usize {
        self.hidden_layers.len() + 1
    }

    /// Every linear layer in network order, with its in/out widths.
    pub fn layers(&self) -> Vec<LayerSpec> {
        let mut specs = Vec::with_capacity(self.layer_count());
        let mut previous = self.input_size;

        for (i, &width) in self.hidden_layers.iter().enumerate() {
            specs.push(LayerSpec {
                prefix:       format!("hidden_layers.{i}"),
                in_features:  previous,
                out_features: width,
            });
            previous = width;
        }

        specs.push(LayerSpec {
            prefix:       "output".to_string(),
            in_features:  previous,
            out_features: self.output_size,
        });
        specs
    }

    /// (key, shape) for every parameter, ordered by depth, weight before bias.
    pub fn expected_shapes(&self) -> Vec<(String, Vec<usize>)> {
        self.layers()
            .iter()
            .flat_map(|layer| {
                [
                    (layer.weight_key(), layer.weight_shape()),
                    (layer.bias_key(), layer.bias_shape()),
                ]
            })
            .collect()
    }

    /// Total number of trainable scalars.
    pub fn parameter_count(&self) -> usize {
        self.layers()
            .iter()
            .map(|l| l.out_features * l.in_features + l.out_features)
            .sum()
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.input_size)?;
        for width in &self.hidden_layers {
            write!(f, " -> {width}")?;
        }
        write!(f, " -> {}", self.output_size)
    }
}
