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

//! # Training loop hooks
//! Alternative to the model wrappers: the `Learner` keeps the raw model and a
//! `TransformerInputCallback` selects its arguments before each forward pass and reduces its
//! outputs afterwards.

use crate::common::error::AdapterError;
use crate::data::input::{Task, TokenizedInput};
use crate::modeling::arguments::{ForwardParameters, ModelArguments};
use crate::modeling::wrapper::{forward_parameters, TransformerModel};
use tch::Tensor;
use tracing::debug;

/// # State of the batch going through the training loop
pub struct BatchState {
    /// Batch inputs
    pub xb: TokenizedInput,
    /// Arguments of the forward pass. When left empty, every present input is forwarded.
    pub arguments: Option<ModelArguments>,
    /// Model outputs
    pub pred: Vec<Tensor>,
}

impl BatchState {
    pub fn new(xb: TokenizedInput) -> BatchState {
        BatchState {
            xb,
            arguments: None,
            pred: vec![],
        }
    }
}

/// # Training loop callback
/// Every hook defaults to a no-op.
pub trait Callback {
    /// Called once before training or inference starts
    fn begin_fit(&mut self, _model: &dyn TransformerModel) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Called before the forward pass of every batch
    fn begin_batch(&mut self, _state: &mut BatchState) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Called after the forward pass of every batch
    fn after_pred(&mut self, _state: &mut BatchState) -> Result<(), AdapterError> {
        Ok(())
    }
}

/// # Argument selection and output reduction for transformer models
/// For `Task::Generic` the predictions are reduced to the first model output, for
/// `Task::QuestionAnswering` all outputs are kept.
pub struct TransformerInputCallback {
    task: Task,
    parameters: Option<ForwardParameters>,
}

impl TransformerInputCallback {
    pub fn new(task: Task) -> TransformerInputCallback {
        TransformerInputCallback {
            task,
            parameters: None,
        }
    }
}

impl Callback for TransformerInputCallback {
    fn begin_fit(&mut self, model: &dyn TransformerModel) -> Result<(), AdapterError> {
        let parameters = forward_parameters(model);
        debug!(parameters = parameters.len(), task = ?self.task, "reading model parameters");
        self.parameters = Some(parameters);
        Ok(())
    }

    fn begin_batch(&mut self, state: &mut BatchState) -> Result<(), AdapterError> {
        let parameters = self.parameters.as_ref().ok_or_else(|| {
            AdapterError::InvalidConfigurationError(
                "begin_fit must be called before the first batch".to_string(),
            )
        })?;
        state.arguments = Some(ModelArguments::select(&state.xb, parameters));
        Ok(())
    }

    fn after_pred(&mut self, state: &mut BatchState) -> Result<(), AdapterError> {
        if let Task::Generic = self.task {
            state.pred.truncate(1);
            if state.pred.is_empty() {
                return Err(AdapterError::ValueError(
                    "Model returned no output".to_string(),
                ));
            }
        }
        Ok(())
    }
}
