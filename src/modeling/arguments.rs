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

//! # Selection of the arguments passed to a transformer model
//! Optional inputs (token type ids, attention mask) are only forwarded when they are present
//! and the model declares a parameter with the same name. This lets the same batches feed model
//! families that do or do not accept these inputs.

use crate::common::error::AdapterError;
use crate::data::input::{is_absent, TokenizedInput};
use std::collections::HashSet;
use tch::Tensor;

pub const INPUT_IDS: &str = "input_ids";
pub const TOKEN_TYPE_IDS: &str = "token_type_ids";
pub const ATTENTION_MASK: &str = "attention_mask";

/// Decides whether an optional argument is passed to the model: the tensor must not hold the
/// absent marker and the model must declare a parameter named `name`.
pub fn include_argument(name: &str, tensor: &Tensor, parameters: &ForwardParameters) -> bool {
    !is_absent(tensor) && parameters.contains(name)
}

/// # Names of the arguments accepted by a model forward pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForwardParameters {
    names: HashSet<String>,
}

impl ForwardParameters {
    pub fn new<I, S>(names: I) -> ForwardParameters
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ForwardParameters {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// # Keyword arguments of a transformer forward pass
/// `input_ids` is always provided; optional inputs are `None` when withheld.
#[derive(Debug)]
pub struct ModelArguments {
    pub input_ids: Tensor,
    pub token_type_ids: Option<Tensor>,
    pub attention_mask: Option<Tensor>,
}

impl ModelArguments {
    pub fn new(input_ids: Tensor) -> ModelArguments {
        ModelArguments {
            input_ids,
            token_type_ids: None,
            attention_mask: None,
        }
    }

    /// Selects the inputs accepted by a model
    pub fn select(input: &TokenizedInput, parameters: &ForwardParameters) -> ModelArguments {
        let optional = |name: &str, tensor: &Tensor| {
            if include_argument(name, tensor, parameters) {
                Some(tensor.shallow_clone())
            } else {
                None
            }
        };
        ModelArguments {
            input_ids: input.input_ids.shallow_clone(),
            token_type_ids: optional(TOKEN_TYPE_IDS, &input.token_type_ids),
            attention_mask: optional(ATTENTION_MASK, &input.attention_mask),
        }
    }

    /// Forwards every input present in the batch, without checking the model parameters
    pub fn from_input(input: &TokenizedInput) -> ModelArguments {
        ModelArguments {
            input_ids: input.input_ids.shallow_clone(),
            token_type_ids: input.token_type_ids().map(Tensor::shallow_clone),
            attention_mask: input.attention_mask().map(Tensor::shallow_clone),
        }
    }

    /// Token type ids, for models that cannot run without them
    pub fn require_token_type_ids(&self) -> Result<&Tensor, AdapterError> {
        self.token_type_ids
            .as_ref()
            .ok_or_else(|| AdapterError::MissingArgument(TOKEN_TYPE_IDS.to_string()))
    }

    /// Attention mask, for models that cannot run without it
    pub fn require_attention_mask(&self) -> Result<&Tensor, AdapterError> {
        self.attention_mask
            .as_ref()
            .ok_or_else(|| AdapterError::MissingArgument(ATTENTION_MASK.to_string()))
    }
}
