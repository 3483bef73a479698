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

//! # Assembly of model inputs
//! Converts one or two sequences of token ids into the `(input_ids, token_type_ids,
//! attention_mask)` triple expected by transformer models. Fields a tokenizer does not produce
//! are replaced by a single-element tensor holding `ABSENT_FIELD_SENTINEL`, so that every
//! backend yields the same triple layout. The assembly algorithm depends on the `Task`.

use crate::common::error::AdapterError;
use crate::data::tokenizer::{EncodedPair, HubTokenizer, PaddingSide, TruncationStrategy};
use serde::{Deserialize, Serialize};
use tch::{Device, Tensor};
use tracing::debug;

/// Reserved value marking a field as absent. Not a valid vocabulary id.
pub const ABSENT_FIELD_SENTINEL: i64 = -9999;

/// Single-element tensor marking an absent field
pub fn absent_field() -> Tensor {
    Tensor::from_slice(&[ABSENT_FIELD_SENTINEL])
}

/// Checks whether a (possibly batched) field tensor holds the absent marker. The first element
/// is inspected; empty tensors are considered absent.
pub fn is_absent(tensor: &Tensor) -> bool {
    if tensor.numel() == 0 {
        return true;
    }
    tensor.flatten(0, -1).int64_value(&[0]) == ABSENT_FIELD_SENTINEL
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// # Task the inputs are assembled for
pub enum Task {
    /// Classification, regression and other single-output heads
    Generic,
    /// Extractive question answering (start/end logits)
    QuestionAnswering,
}

impl Default for Task {
    fn default() -> Self {
        Task::Generic
    }
}

impl Task {
    /// Assembles the model inputs for a sequence (pair) with the algorithm of this task.
    ///
    /// # Arguments
    ///
    /// * `tokenizer` - tokenizer providing the sequence-pair assembly
    /// * `token_ids_1` - primary sequence of token ids
    /// * `token_ids_2` - optional secondary sequence of token ids
    /// * `max_length` - length of the assembled input
    /// * `pad_to_max_length` - pad the inputs up to `max_length`
    /// * `truncation_strategy` - optional `TruncationStrategy`. Generic inputs default to
    ///   `LongestFirst`, question answering inputs derive it from the tokenizer padding side.
    pub fn build_input<T: HubTokenizer + ?Sized>(
        &self,
        tokenizer: &T,
        token_ids_1: &[i64],
        token_ids_2: Option<&[i64]>,
        max_length: usize,
        pad_to_max_length: bool,
        truncation_strategy: Option<TruncationStrategy>,
    ) -> Result<TokenizedInput, AdapterError> {
        match self {
            Task::Generic => build_generic_input(
                tokenizer,
                token_ids_1,
                token_ids_2,
                max_length,
                pad_to_max_length,
                truncation_strategy.unwrap_or_default(),
            ),
            Task::QuestionAnswering => build_question_answering_input(
                tokenizer,
                token_ids_1,
                token_ids_2,
                max_length,
                pad_to_max_length,
                truncation_strategy,
            ),
        }
    }
}

/// # Model inputs for a single sample (or a collated batch)
/// All tensors are `Int64`. Absent fields hold `[ABSENT_FIELD_SENTINEL]`.
#[derive(Debug)]
pub struct TokenizedInput {
    pub input_ids: Tensor,
    pub token_type_ids: Tensor,
    pub attention_mask: Tensor,
}

impl TokenizedInput {
    /// Converts an assembled pair into tensors, substituting the absent marker for missing fields.
    pub fn from_encoded(encoded: EncodedPair) -> TokenizedInput {
        let to_tensor = |field: Option<Vec<i64>>| match field {
            Some(values) => Tensor::from_slice(&values),
            None => absent_field(),
        };
        TokenizedInput {
            input_ids: Tensor::from_slice(&encoded.input_ids),
            token_type_ids: to_tensor(encoded.token_type_ids),
            attention_mask: to_tensor(encoded.attention_mask),
        }
    }

    /// Token type ids, `None` if the tokenizer did not produce them
    pub fn token_type_ids(&self) -> Option<&Tensor> {
        if is_absent(&self.token_type_ids) {
            None
        } else {
            Some(&self.token_type_ids)
        }
    }

    /// Attention mask, `None` if the tokenizer did not produce it
    pub fn attention_mask(&self) -> Option<&Tensor> {
        if is_absent(&self.attention_mask) {
            None
        } else {
            Some(&self.attention_mask)
        }
    }

    pub fn shallow_clone(&self) -> TokenizedInput {
        TokenizedInput {
            input_ids: self.input_ids.shallow_clone(),
            token_type_ids: self.token_type_ids.shallow_clone(),
            attention_mask: self.attention_mask.shallow_clone(),
        }
    }

    pub fn to_device(&self, device: Device) -> TokenizedInput {
        TokenizedInput {
            input_ids: self.input_ids.to_device(device),
            token_type_ids: self.token_type_ids.to_device(device),
            attention_mask: self.attention_mask.to_device(device),
        }
    }

    /// Stacks per-sample inputs into batch tensors of shape `[batch_size, length]`.
    pub fn collate(inputs: &[TokenizedInput]) -> Result<TokenizedInput, AdapterError> {
        if inputs.is_empty() {
            return Err(AdapterError::ValueError(
                "Cannot collate an empty batch".to_string(),
            ));
        }
        let input_ids: Vec<&Tensor> = inputs.iter().map(|input| &input.input_ids).collect();
        let token_type_ids: Vec<&Tensor> =
            inputs.iter().map(|input| &input.token_type_ids).collect();
        let attention_mask: Vec<&Tensor> =
            inputs.iter().map(|input| &input.attention_mask).collect();
        Ok(TokenizedInput {
            input_ids: Tensor::f_stack(&input_ids, 0)?,
            token_type_ids: Tensor::f_stack(&token_type_ids, 0)?,
            attention_mask: Tensor::f_stack(&attention_mask, 0)?,
        })
    }
}

/// Assembles generic model inputs: the tokenizer pairs, truncates and pads the sequences.
pub fn build_generic_input<T: HubTokenizer + ?Sized>(
    tokenizer: &T,
    token_ids_1: &[i64],
    token_ids_2: Option<&[i64]>,
    max_length: usize,
    pad_to_max_length: bool,
    truncation_strategy: TruncationStrategy,
) -> Result<TokenizedInput, AdapterError> {
    let encoded = tokenizer.prepare_for_model(
        token_ids_1,
        token_ids_2,
        max_length,
        pad_to_max_length,
        truncation_strategy,
    )?;
    Ok(TokenizedInput::from_encoded(encoded))
}

/// Assembles question answering inputs. The order of the sequences and the default truncation
/// strategy follow the tokenizer padding side: with right padding the pair is passed as
/// `(first, second)` and only the second sequence is truncated; with left padding the pair is
/// passed as `(second, first)` and only the first sequence is truncated.
pub fn build_question_answering_input<T: HubTokenizer + ?Sized>(
    tokenizer: &T,
    token_ids_1: &[i64],
    token_ids_2: Option<&[i64]>,
    max_length: usize,
    pad_to_max_length: bool,
    truncation_strategy: Option<TruncationStrategy>,
) -> Result<TokenizedInput, AdapterError> {
    let padding_side = tokenizer.padding_side();
    let truncation_strategy = truncation_strategy.unwrap_or_else(|| {
        let strategy = match padding_side {
            PaddingSide::Right => TruncationStrategy::OnlySecond,
            PaddingSide::Left => TruncationStrategy::OnlyFirst,
        };
        debug!(%strategy, ?padding_side, "defaulted question answering truncation strategy");
        strategy
    });

    let encoded = match (padding_side, token_ids_2) {
        (PaddingSide::Left, Some(token_ids_2)) => tokenizer.prepare_for_model(
            token_ids_2,
            Some(token_ids_1),
            max_length,
            pad_to_max_length,
            truncation_strategy,
        )?,
        _ => tokenizer.prepare_for_model(
            token_ids_1,
            token_ids_2,
            max_length,
            pad_to_max_length,
            truncation_strategy,
        )?,
    };
    Ok(TokenizedInput::from_encoded(encoded))
}
