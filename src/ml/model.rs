use burn::{
    module::Param,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::{
        activation::{log_softmax, relu},
        TensorData,
    },
};

use crate::domain::{
    architecture::{Architecture, LayerSpec},
    error::CheckpointError,
    state_dict::{ParamTensor, StateDict},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub input_size:    usize,
    pub output_size:   usize,
    pub hidden_layers: Vec<usize>,
    #[config(default = 0.5)]
    pub dropout:       f64,
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Classifier<B> {
        let mut previous = self.input_size;
        let hidden_layers: Vec<Linear<B>> = self
            .hidden_layers
            .iter()
            .map(|&width| {
                let layer = LinearConfig::new(previous, width).init(device);
                previous = width;
                layer
            })
            .collect();
        let output  = LinearConfig::new(previous, self.output_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        Classifier { hidden_layers, output, dropout }
    }

    pub fn architecture(&self) -> Architecture {
        Architecture::new(self.input_size, self.output_size, self.hidden_layers.clone())
    }
}

impl From<&Architecture> for ClassifierConfig {
    fn from(arch: &Architecture) -> Self {
        ClassifierConfig::new(arch.input_size, arch.output_size, arch.hidden_layers.clone())
    }
}

/// Fully-connected classifier:
/// (Linear → ReLU → Dropout) per hidden layer, then Linear → log-softmax.
#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    pub hidden_layers: Vec<Linear<B>>,
    pub output:        Linear<B>,
    pub dropout:       Dropout,
}

impl<B: Backend> Classifier<B> {
    /// images: [batch, input_size] → log-probabilities: [batch, output_size]
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = images;
        for layer in &self.hidden_layers {
            x = self.dropout.forward(relu(layer.forward(x)));
        }
        log_softmax(self.output.forward(x), 1)
    }

    /// Class probabilities (exp of the log-probabilities).
    pub fn probabilities(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward(images).exp()
    }

    /// Returns (mean NLL loss, log-probabilities).
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let log_probs = self.forward(images);
        let loss = nll_loss(log_probs.clone(), targets);
        (loss, log_probs)
    }

    /// Widths read back from the layers themselves, the way a checkpoint
    /// writer sees a live model.
    pub fn architecture(&self) -> Architecture {
        let first = self.hidden_layers.first().unwrap_or(&self.output);
        let [input_size, _] = linear_dims(first);
        let hidden_layers = self
            .hidden_layers
            .iter()
            .map(|layer| linear_dims(layer)[1])
            .collect::<Vec<_>>();
        let [_, output_size] = linear_dims(&self.output);
        Architecture::new(input_size, output_size, hidden_layers)
    }

    fn linears(&self) -> impl Iterator<Item = &Linear<B>> {
        self.hidden_layers.iter().chain(std::iter::once(&self.output))
    }

    /// Export every parameter as a named (out, in) / (out,) array.
    pub fn state_dict(&self) -> Result<StateDict, CheckpointError> {
        let arch = self.architecture();
        let mut dict = StateDict::new();

        for (spec, layer) in arch.layers().iter().zip(self.linears()) {
            let weight = layer.weight.val().transpose();
            let shape  = weight.dims().to_vec();
            dict.insert(spec.weight_key(), ParamTensor::new(shape, tensor_values(weight.into_data())?));

            let bias = layer
                .bias
                .as_ref()
                .ok_or_else(|| {
                    CheckpointError::invalid_architecture(format!("layer '{}' has no bias", spec.prefix))
                })?
                .val();
            let shape = bias.dims().to_vec();
            dict.insert(spec.bias_key(), ParamTensor::new(shape, tensor_values(bias.into_data())?));
        }

        Ok(dict)
    }

    /// A copy of this model with every parameter replaced from `state`.
    ///
    /// All slots are checked before anything is built, so a mismatching
    /// state dict leaves no half-loaded model behind, and `self` is never
    /// modified.
    pub fn with_state_dict(&self, state: &StateDict) -> Result<Self, CheckpointError> {
        let arch = self.architecture();
        state.check_against(&arch.expected_shapes())?;

        let specs = arch.layers();
        let (output_spec, hidden_specs) = specs
            .split_last()
            .ok_or_else(|| CheckpointError::invalid_architecture("model has no layers"))?;

        let hidden_layers = self
            .hidden_layers
            .iter()
            .zip(hidden_specs)
            .map(|(layer, spec)| import_linear(layer, spec, state))
            .collect::<Result<Vec<_>, _>>()?;
        let output = import_linear(&self.output, output_spec, state)?;

        Ok(Self {
            hidden_layers,
            output,
            dropout: self.dropout.clone(),
        })
    }
}

/// Mean negative log-likelihood of the target classes.
pub fn nll_loss<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let [batch_size, _] = log_probs.dims();
    log_probs
        .gather(1, targets.reshape([batch_size, 1]))
        .mean()
        .neg()
}

/// Burn stores Linear weights as [d_input, d_output].
fn linear_dims<B: Backend>(layer: &Linear<B>) -> [usize; 2] {
    layer.weight.val().dims()
}

fn tensor_values(data: TensorData) -> Result<Vec<f32>, CheckpointError> {
    data.convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| CheckpointError::Serialization(format!("{e:?}")))
}

fn lookup<'a>(state: &'a StateDict, key: &str) -> Result<&'a ParamTensor, CheckpointError> {
    state
        .get(key)
        .ok_or_else(|| CheckpointError::malformed(format!("missing parameter '{key}'")))
}

fn import_linear<B: Backend>(
    layer: &Linear<B>,
    spec:  &LayerSpec,
    state: &StateDict,
) -> Result<Linear<B>, CheckpointError> {
    let device = layer.weight.val().device();
    let weight = lookup(state, &spec.weight_key())?;
    let bias   = lookup(state, &spec.bias_key())?;

    // Stored as (out, in); Burn wants [in, out].
    let weight = Tensor::<B, 2>::from_data(
        TensorData::new(weight.values.clone(), weight.shape.clone()),
        &device,
    )
    .transpose();
    let bias = Tensor::<B, 1>::from_data(
        TensorData::new(bias.values.clone(), bias.shape.clone()),
        &device,
    );

    let mut layer = layer.clone();
    layer.weight = Param::from_tensor(weight);
    layer.bias   = Some(Param::from_tensor(bias));
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn model(hidden: &[usize]) -> Classifier<TestBackend> {
        ClassifierConfig::new(6, 3, hidden.to_vec()).init(&Default::default())
    }

    fn outputs(model: &Classifier<TestBackend>) -> Vec<f32> {
        let input = Tensor::<TestBackend, 2>::from_data(
            TensorData::new((0..12).map(|v| v as f32 / 12.0).collect::<Vec<_>>(), [2, 6]),
            &Default::default(),
        );
        model.forward(input).into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn forward_returns_log_probabilities() {
        let m = model(&[5, 4]);
        let probs = m.probabilities(Tensor::zeros([4, 6], &Default::default()));
        assert_eq!(probs.dims(), [4, 3]);

        let row_sums = probs.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for s in row_sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn nll_loss_picks_target_log_probability() {
        let device = Default::default();
        let log_probs = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![-0.5f32, -2.0, -3.0, -1.0], [2, 2]),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 1], &device);
        let loss: f32 = nll_loss(log_probs, targets).into_scalar();
        // (0.5 + 1.0) / 2
        assert!((loss - 0.75).abs() < 1e-6);
    }

    #[test]
    fn architecture_is_read_from_layers() {
        let m = model(&[5, 4]);
        assert_eq!(m.architecture(), Architecture::new(6, 3, [5, 4]));
    }

    #[test]
    fn state_dict_uses_out_in_layout() {
        let m = ClassifierConfig::new(784, 10, vec![512, 256, 128]).init::<TestBackend>(&Default::default());
        let dict = m.state_dict().unwrap();

        assert_eq!(dict.len(), 8);
        assert_eq!(dict.get("hidden_layers.0.weight").unwrap().shape, vec![512, 784]);
        assert_eq!(dict.get("hidden_layers.2.bias").unwrap().shape, vec![128]);
        assert_eq!(dict.get("output.weight").unwrap().shape, vec![10, 128]);
        assert_eq!(dict.get("output.bias").unwrap().shape, vec![10]);
    }

    #[test]
    fn state_dict_transposes_burn_weights() {
        let m = model(&[2]);
        let burn_weight = m.hidden_layers[0].weight.val().into_data().to_vec::<f32>().unwrap();
        let exported = m.state_dict().unwrap();
        let stored = &exported.get("hidden_layers.0.weight").unwrap().values;

        // stored[o][i] == burn[i][o]; burn is [6, 2]
        for o in 0..2 {
            for i in 0..6 {
                assert_eq!(stored[o * 6 + i].to_bits(), burn_weight[i * 2 + o].to_bits());
            }
        }
    }

    #[test]
    fn with_state_dict_copies_parameters_exactly() {
        let source = model(&[5, 4]);
        let target = model(&[5, 4]);
        let before = outputs(&target);

        let loaded = target.with_state_dict(&source.state_dict().unwrap()).unwrap();

        assert!(loaded.state_dict().unwrap().bitwise_eq(&source.state_dict().unwrap()));
        assert_eq!(outputs(&loaded), outputs(&source));
        // the original target is untouched
        assert_eq!(outputs(&target), before);
    }

    #[test]
    fn with_state_dict_rejects_other_hidden_widths() {
        let device = Default::default();
        let saved = ClassifierConfig::new(784, 10, vec![400, 200, 100]).init::<TestBackend>(&device);
        let wrong = ClassifierConfig::new(784, 10, vec![512, 256, 128]).init::<TestBackend>(&device);

        match wrong.with_state_dict(&saved.state_dict().unwrap()) {
            Err(CheckpointError::ShapeMismatch { key, expected, actual }) => {
                assert_eq!(key, "hidden_layers.0.weight");
                assert_eq!(expected, vec![512, 784]);
                assert_eq!(actual, vec![400, 784]);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn config_round_trips_architecture() {
        let arch = Architecture::new(784, 10, [64]);
        let cfg = ClassifierConfig::from(&arch);
        assert_eq!(cfg.dropout, 0.5);
        assert_eq!(cfg.architecture(), arch);
    }
}
