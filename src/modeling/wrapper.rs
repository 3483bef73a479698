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

//! # Wrappers around pretrained transformer models
//! The training loop hands the model a whole `TokenizedInput`. The wrappers forward only the
//! arguments the model accepts and reduce its outputs to what the loss expects.

use crate::common::error::AdapterError;
use crate::data::input::TokenizedInput;
use crate::modeling::arguments::{ForwardParameters, ModelArguments};
use tch::Tensor;
use tracing::debug;

/// # Pretrained transformer model
/// Implemented by models consuming `ModelArguments` and returning a sequence of outputs
/// (logits first).
pub trait TransformerModel {
    /// Names of the arguments accepted by `forward_t` (e.g. `input_ids`, `attention_mask`)
    fn forward_parameters(&self) -> &[&str];

    /// Forward pass through the model
    ///
    /// # Arguments
    ///
    /// * `arguments` - `ModelArguments` holding the selected inputs
    /// * `train` - boolean flag to turn on/off the dropout layers in the model
    ///
    /// # Returns
    ///
    /// * Model outputs, the logits being the first element
    fn forward_t(&self, arguments: &ModelArguments, train: bool)
        -> Result<Vec<Tensor>, AdapterError>;
}

impl<M: TransformerModel + ?Sized> TransformerModel for &M {
    fn forward_parameters(&self) -> &[&str] {
        (**self).forward_parameters()
    }

    fn forward_t(
        &self,
        arguments: &ModelArguments,
        train: bool,
    ) -> Result<Vec<Tensor>, AdapterError> {
        (**self).forward_t(arguments, train)
    }
}

impl<M: TransformerModel + ?Sized> TransformerModel for Box<M> {
    fn forward_parameters(&self) -> &[&str] {
        (**self).forward_parameters()
    }

    fn forward_t(
        &self,
        arguments: &ModelArguments,
        train: bool,
    ) -> Result<Vec<Tensor>, AdapterError> {
        (**self).forward_t(arguments, train)
    }
}

/// Reads the parameter names a model declares
pub fn forward_parameters<M: TransformerModel + ?Sized>(model: &M) -> ForwardParameters {
    ForwardParameters::new(model.forward_parameters().iter().copied())
}

/// # Model wrapper returning the first output (logits)
pub struct ModelWrapper<M: TransformerModel> {
    model: M,
    parameters: ForwardParameters,
}

impl<M: TransformerModel> ModelWrapper<M> {
    /// Wraps a model, reading its accepted parameters once
    pub fn new(model: M) -> ModelWrapper<M> {
        let parameters = forward_parameters(&model);
        debug!(parameters = parameters.len(), "wrapping transformer model");
        ModelWrapper { model, parameters }
    }

    /// Wrapped model
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn parameters(&self) -> &ForwardParameters {
        &self.parameters
    }

    /// Runs the model on the accepted inputs and returns all of its outputs
    pub fn forward_all_t(
        &self,
        input: &TokenizedInput,
        train: bool,
    ) -> Result<Vec<Tensor>, AdapterError> {
        let arguments = ModelArguments::select(input, &self.parameters);
        self.model.forward_t(&arguments, train)
    }

    /// Runs the model on the accepted inputs and returns its first output
    pub fn forward_t(&self, input: &TokenizedInput, train: bool) -> Result<Tensor, AdapterError> {
        self.forward_all_t(input, train)?
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::ValueError("Model returned no output".to_string()))
    }
}

/// # Model wrapper returning every output
/// Question answering models return a start and an end logits tensor, both consumed by the loss.
pub struct QuestionAnsweringModelWrapper<M: TransformerModel> {
    wrapper: ModelWrapper<M>,
}

impl<M: TransformerModel> QuestionAnsweringModelWrapper<M> {
    pub fn new(model: M) -> QuestionAnsweringModelWrapper<M> {
        QuestionAnsweringModelWrapper {
            wrapper: ModelWrapper::new(model),
        }
    }

    pub fn model(&self) -> &M {
        self.wrapper.model()
    }

    pub fn forward_t(
        &self,
        input: &TokenizedInput,
        train: bool,
    ) -> Result<Vec<Tensor>, AdapterError> {
        self.wrapper.forward_all_t(input, train)
    }
}
