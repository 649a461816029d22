// ============================================================
// Layer 3 — State Dict
// ============================================================
// An ordered mapping from parameter name to a plain numeric
// array (shape + row-major f32 values). This is framework-free:
// the ml layer converts Burn tensors to and from these arrays.
//
// Serialised as a map so JSON checkpoints read naturally:
//
//   "state_dict": {
//     "hidden_layers.0.weight": { "shape": [512, 784], "values": [...] },
//     ...
//   }
//
// Insertion order is preserved in both directions.

use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::domain::error::CheckpointError;

/// A single named parameter array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamTensor {
    pub shape: Vec<usize>,

    #[serde(with = "exact_f32")]
    pub values: Vec<f32>,
}

impl ParamTensor {
    pub fn new(shape: impl Into<Vec<usize>>, values: Vec<f32>) -> Self {
        Self { shape: shape.into(), values }
    }

    /// Number of elements implied by the shape.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Bit-level equality, so NaN payloads and signed zeros count.
    pub fn bitwise_eq(&self, other: &Self) -> bool {
        self.shape == other.shape
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Ordered name → array mapping.
#[derive(Debug, Clone, Default)]
pub struct StateDict {
    entries: Vec<(String, ParamTensor)>,
}

impl StateDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, replacing any existing entry with the same name
    /// in place.
    pub fn insert(&mut self, name: impl Into<String>, tensor: ParamTensor) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = tensor,
            None => self.entries.push((name, tensor)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamTensor> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, t)| t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamTensor)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn bitwise_eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|((ka, ta), (kb, tb))| ka == kb && ta.bitwise_eq(tb))
    }

    /// Check this state dict against the (key, shape) list a model expects.
    ///
    /// Shape disagreements on present keys are reported first, since they
    /// are the common failure (loading into a differently-sized model).
    /// Missing keys, unexpected keys and value counts that don't match a
    /// shape are reported as malformed.
    pub fn check_against(&self, expected: &[(String, Vec<usize>)]) -> Result<(), CheckpointError> {
        let mut missing = Vec::new();

        for (key, shape) in expected {
            match self.get(key) {
                Some(tensor) if tensor.shape != *shape => {
                    return Err(CheckpointError::shape_mismatch(key, shape, &tensor.shape));
                }
                Some(_) => {}
                None => missing.push(key.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(CheckpointError::malformed(format!(
                "missing parameters: {}",
                missing.join(", ")
            )));
        }

        let unexpected: Vec<&str> = self
            .keys()
            .filter(|k| !expected.iter().any(|(e, _)| e.as_str() == *k))
            .collect();
        if !unexpected.is_empty() {
            return Err(CheckpointError::malformed(format!(
                "unexpected parameters: {}",
                unexpected.join(", ")
            )));
        }

        for (key, tensor) in self.iter() {
            if tensor.values.len() != tensor.numel() {
                return Err(CheckpointError::malformed(format!(
                    "'{key}' has shape {:?} but {} values",
                    tensor.shape,
                    tensor.values.len()
                )));
            }
        }

        Ok(())
    }
}

// Equality is bitwise so NaN parameters still compare equal to themselves.
impl PartialEq for ParamTensor {
    fn eq(&self, other: &Self) -> bool {
        self.bitwise_eq(other)
    }
}

impl PartialEq for StateDict {
    fn eq(&self, other: &Self) -> bool {
        self.bitwise_eq(other)
    }
}

impl Serialize for StateDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, tensor) in &self.entries {
            map.serialize_entry(name, tensor)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StateDict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StateDictVisitor;

        impl<'de> Visitor<'de> for StateDictVisitor {
            type Value = StateDict;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of parameter names to arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StateDict, A::Error> {
                let mut dict = StateDict::new();
                while let Some((name, tensor)) = access.next_entry::<String, ParamTensor>()? {
                    if dict.get(&name).is_some() {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate parameter '{name}'"
                        )));
                    }
                    dict.entries.push((name, tensor));
                }
                Ok(dict)
            }
        }

        deserializer.deserialize_map(StateDictVisitor)
    }
}

/// f32 arrays that survive text encodings bit-for-bit.
///
/// Human-readable formats get each finite value widened to f64 (exact),
/// which JSON writes and reads back without rounding. JSON has no NaN or
/// infinity, so those are written as their bit pattern, e.g. `"0x7fc00000"`.
/// Binary formats keep raw f32.
mod exact_f32 {
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum TextF32 {
        Number(f64),
        Bits(String),
    }

    impl TextF32 {
        fn encode(v: f32) -> Self {
            if v.is_finite() {
                Self::Number(f64::from(v))
            } else {
                Self::Bits(format!("{:#010x}", v.to_bits()))
            }
        }

        fn decode(self) -> Result<f32, String> {
            match self {
                Self::Number(v) => Ok(v as f32),
                Self::Bits(text) => text
                    .strip_prefix("0x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .map(f32::from_bits)
                    .ok_or_else(|| format!("invalid f32 bit pattern '{text}'")),
            }
        }
    }

    pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_seq(values.iter().map(|&v| TextF32::encode(v)))
        } else {
            values.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        if deserializer.is_human_readable() {
            Vec::<TextF32>::deserialize(deserializer)?
                .into_iter()
                .map(|v| v.decode().map_err(D::Error::custom))
                .collect()
        } else {
            Vec::<f32>::deserialize(deserializer)
        }
    }
}
