// Copyright 2019 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Loss over several model outputs
//! Models such as question answering heads produce several outputs, each paired with its own
//! target. A `MultiTargetLoss` holds one `LossSlot` per output: the loss function and its
//! options, a weight, the activation applied at inference and the decoding of activations into
//! predictions.
//!
//! ```no_run
//! use tch::Tensor;
//! use transformer_adapters::modeling::MultiTargetLoss;
//! # fn main() -> anyhow::Result<()> {
//! let loss_fn = MultiTargetLoss::default();
//! let start_logits = Tensor::from_slice(&[0.1f32, 2.0, 0.3]).view([1, 3]);
//! let end_logits = Tensor::from_slice(&[0.2f32, 0.1, 1.5]).view([1, 3]);
//! let loss = loss_fn.forward(
//!     &[start_logits, end_logits],
//!     &[Tensor::from_slice(&[1i64]), Tensor::from_slice(&[2i64])],
//! )?;
//! # Ok(())
//! # }
//! ```

use crate::common::error::AdapterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tch::{Kind, Reduction, Tensor};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// # Reduction applied to the per-element losses
pub enum LossReduction {
    None,
    Mean,
    Sum,
}

impl Default for LossReduction {
    fn default() -> Self {
        LossReduction::Mean
    }
}

impl From<LossReduction> for Reduction {
    fn from(reduction: LossReduction) -> Self {
        match reduction {
            LossReduction::None => Reduction::None,
            LossReduction::Mean => Reduction::Mean,
            LossReduction::Sum => Reduction::Sum,
        }
    }
}

/// Custom loss: `(output, target, reduction) -> loss`
pub type CustomLoss =
    Arc<dyn Fn(&Tensor, &Tensor, LossReduction) -> Result<Tensor, AdapterError> + Send + Sync>;

/// # Loss function of a slot
#[derive(Clone)]
pub enum LossFunction {
    CrossEntropy,
    MeanSquaredError,
    L1,
    BinaryCrossEntropyWithLogits,
    Custom(CustomLoss),
}

impl fmt::Debug for LossFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossFunction::CrossEntropy => write!(f, "CrossEntropy"),
            LossFunction::MeanSquaredError => write!(f, "MeanSquaredError"),
            LossFunction::L1 => write!(f, "L1"),
            LossFunction::BinaryCrossEntropyWithLogits => write!(f, "BinaryCrossEntropyWithLogits"),
            LossFunction::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// # Extra arguments of a loss function
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct LossOptions {
    /// Target value ignored by the cross-entropy loss
    #[serde(default = "default_ignore_index")]
    pub ignore_index: i64,
    /// Cross-entropy label smoothing
    #[serde(default)]
    pub label_smoothing: f64,
}

fn default_ignore_index() -> i64 {
    -100
}

impl Default for LossOptions {
    fn default() -> Self {
        LossOptions {
            ignore_index: default_ignore_index(),
            label_smoothing: 0.0,
        }
    }
}

impl LossFunction {
    /// Computes the loss of an output against its target
    pub fn compute(
        &self,
        output: &Tensor,
        target: &Tensor,
        reduction: LossReduction,
        options: &LossOptions,
    ) -> Result<Tensor, AdapterError> {
        Ok(match self {
            LossFunction::CrossEntropy => output.f_cross_entropy_loss::<Tensor>(
                target,
                None,
                reduction.into(),
                options.ignore_index,
                options.label_smoothing,
            )?,
            LossFunction::MeanSquaredError => output.f_mse_loss(target, reduction.into())?,
            LossFunction::L1 => output.f_l1_loss(target, reduction.into())?,
            LossFunction::BinaryCrossEntropyWithLogits => output
                .f_binary_cross_entropy_with_logits::<Tensor>(
                    target,
                    None,
                    None,
                    reduction.into(),
                )?,
            LossFunction::Custom(function) => function(output, target, reduction)?,
        })
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
/// # Activation turning raw outputs into scores at inference
pub enum Activation {
    Softmax(i64),
    Sigmoid,
    Identity,
}

impl Activation {
    pub fn apply(&self, output: &Tensor) -> Tensor {
        match self {
            Activation::Softmax(dim) => output.softmax(*dim, Kind::Float),
            Activation::Sigmoid => output.sigmoid(),
            Activation::Identity => output.shallow_clone(),
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
/// # Decoding of activations into predictions
pub enum Decode {
    Argmax(i64),
    /// Elementwise `activation > threshold`, as 0/1 integers
    Threshold(f64),
    Identity,
}

impl Decode {
    pub fn apply(&self, activation: &Tensor) -> Tensor {
        match self {
            Decode::Argmax(dim) => activation.argmax(*dim, false),
            Decode::Threshold(threshold) => activation.gt(*threshold).to_kind(Kind::Int64),
            Decode::Identity => activation.shallow_clone(),
        }
    }
}

/// # Loss configuration of one output/target pair
#[derive(Clone, Debug)]
pub struct LossSlot {
    pub loss: LossFunction,
    pub options: LossOptions,
    pub weight: f64,
    pub activation: Activation,
    pub decode: Decode,
}

impl LossSlot {
    /// Cross-entropy slot of weight 1, with softmax activation and argmax decoding
    pub fn cross_entropy() -> LossSlot {
        LossSlot {
            loss: LossFunction::CrossEntropy,
            options: LossOptions::default(),
            weight: 1.0,
            activation: Activation::Softmax(-1),
            decode: Decode::Argmax(-1),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> LossSlot {
        self.weight = weight;
        self
    }
}

/// # Weighted sum of per-output losses
#[derive(Clone, Debug)]
pub struct MultiTargetLoss {
    slots: Vec<LossSlot>,
    reduction: LossReduction,
}

impl Default for MultiTargetLoss {
    /// Two cross-entropy slots (start and end logits of question answering)
    fn default() -> Self {
        MultiTargetLoss {
            slots: vec![LossSlot::cross_entropy(), LossSlot::cross_entropy()],
            reduction: LossReduction::Mean,
        }
    }
}

impl MultiTargetLoss {
    pub fn new(
        slots: Vec<LossSlot>,
        reduction: LossReduction,
    ) -> Result<MultiTargetLoss, AdapterError> {
        if slots.is_empty() {
            return Err(AdapterError::InvalidConfigurationError(
                "A multi-target loss requires at least one slot".to_string(),
            ));
        }
        Ok(MultiTargetLoss { slots, reduction })
    }

    pub fn slots(&self) -> &[LossSlot] {
        &self.slots
    }

    pub fn reduction(&self) -> LossReduction {
        self.reduction
    }

    fn check_count(&self, name: &str, count: usize) -> Result<(), AdapterError> {
        if count != self.slots.len() {
            return Err(AdapterError::ValueError(format!(
                "Expected {} {}, got {}",
                self.slots.len(),
                name,
                count
            )));
        }
        Ok(())
    }

    /// Weighted sum of the losses of every output against its target.
    /// Outputs and targets must both match the number of slots.
    pub fn forward(&self, outputs: &[Tensor], targets: &[Tensor]) -> Result<Tensor, AdapterError> {
        self.check_count("outputs", outputs.len())?;
        self.check_count("targets", targets.len())?;
        let mut total: Option<Tensor> = None;
        for ((slot, output), target) in self.slots.iter().zip(outputs).zip(targets) {
            let loss = slot
                .loss
                .compute(output, target, self.reduction, &slot.options)?
                .f_mul_scalar(slot.weight)?;
            total = Some(match total {
                Some(total) => total.f_add(&loss)?,
                None => loss,
            });
        }
        total.ok_or_else(|| AdapterError::ValueError("No output to compute a loss on".to_string()))
    }

    /// Applies the activation of each slot to its output
    pub fn activation(&self, outputs: &[Tensor]) -> Result<Vec<Tensor>, AdapterError> {
        self.check_count("outputs", outputs.len())?;
        Ok(self
            .slots
            .iter()
            .zip(outputs)
            .map(|(slot, output)| slot.activation.apply(output))
            .collect())
    }

    /// Decodes each activation into predictions
    pub fn decodes(&self, activations: &[Tensor]) -> Result<Vec<Tensor>, AdapterError> {
        self.check_count("activations", activations.len())?;
        Ok(self
            .slots
            .iter()
            .zip(activations)
            .map(|(slot, activation)| slot.decode.apply(activation))
            .collect())
    }
}
