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

//! # Mini-batch assembly
//! The `BatchTransform` runs right before a mini-batch is handed to the training loop. Each
//! sample holds numericalized text (a single sequence or a pair) followed by opaque targets; the
//! text is assembled into a `TokenizedInput` and the targets are forwarded untouched.

use crate::common::error::AdapterError;
use crate::data::input::{Task, TokenizedInput};
use crate::data::tokenizer::{HubTokenizer, TruncationStrategy};
use crate::Config;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// # Numericalized text of a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleText {
    /// Single text column
    Single(Vec<i64>),
    /// Dual text task (e.g. question and context)
    Pair(Vec<i64>, Vec<i64>),
}

impl SampleText {
    /// Primary and optional secondary sequences
    pub fn sequences(&self) -> (&[i64], Option<&[i64]>) {
        match self {
            SampleText::Single(token_ids) => (token_ids, None),
            SampleText::Pair(token_ids_1, token_ids_2) => (token_ids_1, Some(token_ids_2)),
        }
    }

    /// Total number of token ids
    pub fn len(&self) -> usize {
        match self {
            SampleText::Single(token_ids) => token_ids.len(),
            SampleText::Pair(token_ids_1, token_ids_2) => token_ids_1.len() + token_ids_2.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// # Sample before batch assembly
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<Y> {
    pub text: SampleText,
    pub targets: Y,
}

impl<Y> Sample<Y> {
    pub fn new(text: SampleText, targets: Y) -> Sample<Y> {
        Sample { text, targets }
    }
}

/// # Sample after batch assembly
#[derive(Debug)]
pub struct EncodedSample<Y> {
    pub input: TokenizedInput,
    pub targets: Y,
}

fn default_max_seq_len() -> usize {
    512
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// # Configuration for a `BatchTransform`
pub struct BatchTransformConfig {
    /// Length of the assembled inputs
    #[serde(default = "default_max_seq_len")]
    pub max_seq_len: usize,
    /// Truncation strategy, defaults depend on the task
    #[serde(default)]
    pub truncation_strategy: Option<TruncationStrategy>,
    /// Task driving the input assembly
    #[serde(default)]
    pub task: Task,
}

impl Config for BatchTransformConfig {}

impl Default for BatchTransformConfig {
    fn default() -> BatchTransformConfig {
        BatchTransformConfig {
            max_seq_len: default_max_seq_len(),
            truncation_strategy: None,
            task: Task::Generic,
        }
    }
}

/// # Assembles mini-batches of inputs and targets
pub struct BatchTransform<T: HubTokenizer> {
    tokenizer: Arc<T>,
    max_seq_len: usize,
    truncation_strategy: Option<TruncationStrategy>,
    task: Task,
}

impl<T: HubTokenizer> BatchTransform<T> {
    /// Build a new `BatchTransform`
    ///
    /// # Arguments
    ///
    /// * `tokenizer` - shared tokenizer performing the sequence-pair assembly
    /// * `config` - `BatchTransformConfig` (maximum length, truncation strategy and task)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use transformer_adapters::data::{
    ///     BatchTransform, BatchTransformConfig, ModelType, Sample, SampleText, TokenizerConfig,
    ///     TransformerTokenizer,
    /// };
    /// # fn main() -> anyhow::Result<()> {
    /// let tokenizer = TransformerTokenizer::from_file(
    ///     &TokenizerConfig::new(ModelType::Bert, true),
    ///     "path/to/vocab.txt",
    ///     None,
    /// )?;
    /// let batch_transform =
    ///     BatchTransform::new(Arc::new(tokenizer), BatchTransformConfig::default());
    /// let sample = Sample::new(SampleText::Single(vec![7592, 2088]), 1);
    /// let batch = batch_transform.encodes(vec![sample])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(tokenizer: Arc<T>, config: BatchTransformConfig) -> BatchTransform<T> {
        BatchTransform {
            tokenizer,
            max_seq_len: config.max_seq_len,
            truncation_strategy: config.truncation_strategy,
            task: config.task,
        }
    }

    pub fn tokenizer(&self) -> &T {
        self.tokenizer.as_ref()
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Assembles the inputs of every sample of a batch, preserving order and targets.
    /// The first failing sample aborts the batch.
    pub fn encodes<Y>(
        &self,
        samples: Vec<Sample<Y>>,
    ) -> Result<Vec<EncodedSample<Y>>, AdapterError> {
        debug!(
            batch_size = samples.len(),
            task = ?self.task,
            max_seq_len = self.max_seq_len,
            "assembling batch"
        );
        samples
            .into_iter()
            .map(|sample| {
                let (token_ids_1, token_ids_2) = sample.text.sequences();
                let input = self.task.build_input(
                    self.tokenizer.as_ref(),
                    token_ids_1,
                    token_ids_2,
                    self.max_seq_len,
                    true,
                    self.truncation_strategy,
                )?;
                Ok(EncodedSample {
                    input,
                    targets: sample.targets,
                })
            })
            .collect()
    }
}

/// Collates assembled samples into batch tensors and the list of their targets.
pub fn collate_samples<Y>(
    samples: Vec<EncodedSample<Y>>,
) -> Result<(TokenizedInput, Vec<Y>), AdapterError> {
    let (inputs, targets): (Vec<TokenizedInput>, Vec<Y>) = samples
        .into_iter()
        .map(|sample| (sample.input, sample.targets))
        .unzip();
    Ok((TokenizedInput::collate(&inputs)?, targets))
}
