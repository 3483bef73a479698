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

//! # Minimal training loop
//! Runs the callbacks around each forward pass, computes the `MultiTargetLoss` and steps a
//! `tch` optimizer.

use crate::common::error::AdapterError;
use crate::data::input::TokenizedInput;
use crate::modeling::arguments::ModelArguments;
use crate::modeling::callback::{BatchState, Callback};
use crate::modeling::loss::MultiTargetLoss;
use crate::modeling::wrapper::TransformerModel;
use tch::{nn, Tensor};
use tracing::debug;

/// # Activations and decoded predictions of a batch
pub struct Predictions {
    pub activations: Vec<Tensor>,
    pub decoded: Vec<Tensor>,
}

pub struct Learner<'a, M: TransformerModel> {
    model: M,
    loss: MultiTargetLoss,
    callbacks: Vec<Box<dyn Callback + 'a>>,
    fitting: bool,
}

impl<'a, M: TransformerModel> Learner<'a, M> {
    pub fn new(model: M, loss: MultiTargetLoss) -> Learner<'a, M> {
        Learner {
            model,
            loss,
            callbacks: vec![],
            fitting: false,
        }
    }

    pub fn with_callback<C: Callback + 'a>(mut self, callback: C) -> Learner<'a, M> {
        self.callbacks.push(Box::new(callback));
        self.fitting = false;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn loss(&self) -> &MultiTargetLoss {
        &self.loss
    }

    /// Runs the `begin_fit` hooks, once per learner
    pub fn begin_fit(&mut self) -> Result<(), AdapterError> {
        if self.fitting {
            return Ok(());
        }
        for callback in self.callbacks.iter_mut() {
            callback.begin_fit(&self.model)?;
        }
        self.fitting = true;
        Ok(())
    }

    fn predict_state(
        &mut self,
        xb: TokenizedInput,
        train: bool,
    ) -> Result<BatchState, AdapterError> {
        self.begin_fit()?;
        let mut state = BatchState::new(xb);
        for callback in self.callbacks.iter_mut() {
            callback.begin_batch(&mut state)?;
        }
        let arguments = match state.arguments.take() {
            Some(arguments) => arguments,
            None => ModelArguments::from_input(&state.xb),
        };
        state.pred = self.model.forward_t(&arguments, train)?;
        for callback in self.callbacks.iter_mut() {
            callback.after_pred(&mut state)?;
        }
        Ok(state)
    }

    /// Forward and backward pass on one batch, followed by an optimizer step.
    /// Returns the loss value.
    pub fn train_batch(
        &mut self,
        xb: TokenizedInput,
        targets: &[Tensor],
        optimizer: &mut nn::Optimizer,
    ) -> Result<f64, AdapterError> {
        let state = self.predict_state(xb, true)?;
        let loss = self.loss.forward(&state.pred, targets)?;
        if loss.numel() != 1 {
            return Err(AdapterError::InvalidConfigurationError(format!(
                "training requires a scalar loss, got shape {:?}",
                loss.size()
            )));
        }
        optimizer.zero_grad();
        loss.f_backward()?;
        optimizer.step();
        let value = loss.f_double_value(&[])?;
        debug!(loss = value, "training step");
        Ok(value)
    }

    /// Loss of one batch, without gradient tracking
    pub fn validate_batch(
        &mut self,
        xb: TokenizedInput,
        targets: &[Tensor],
    ) -> Result<f64, AdapterError> {
        let loss = tch::no_grad(|| -> Result<Tensor, AdapterError> {
            let state = self.predict_state(xb, false)?;
            self.loss.forward(&state.pred, targets)
        })?;
        Ok(loss.f_double_value(&[])?)
    }

    /// Activations and decoded predictions of one batch
    pub fn predict_batch(&mut self, xb: TokenizedInput) -> Result<Predictions, AdapterError> {
        tch::no_grad(|| {
            let state = self.predict_state(xb, false)?;
            let activations = self.loss.activation(&state.pred)?;
            let decoded = self.loss.decodes(&activations)?;
            Ok(Predictions {
                activations,
                decoded,
            })
        })
    }
}
