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

//! # Pretrained tokenizers exposed through a uniform interface
//! The `HubTokenizer` trait is the capability the data pipeline relies on: word-piece
//! tokenization, vocabulary access, sequence-pair assembly and decoding. `TransformerTokenizer`
//! implements it on top of the `rust_tokenizers` backends and carries the per-architecture
//! conventions (padding side, padding token, presence of token type ids).
//!
//! ```no_run
//! use transformer_adapters::data::{
//!     ModelType, TokenizerAdapter, TokenizerConfig, TransformerTokenizer,
//! };
//! # fn main() -> anyhow::Result<()> {
//! let config = TokenizerConfig::new(ModelType::Bert, true);
//! let tokenizer = TransformerTokenizer::from_file(&config, "path/to/vocab.txt", None)?;
//! let adapter = TokenizerAdapter::new(&tokenizer);
//! let tokens: Vec<Vec<String>> = adapter
//!     .tokenize_items(&["Hello world", "Good morning"])
//!     .collect();
//! # Ok(())
//! # }
//! ```

use crate::common::error::AdapterError;
use crate::resources::ResourceProvider;
use crate::Config;
use rust_tokenizers::tokenizer::{
    truncate_sequences, AlbertTokenizer, BertTokenizer, RobertaTokenizer, Tokenizer,
    XLNetTokenizer,
};
use rust_tokenizers::vocab::Vocab;
use rust_tokenizers::{Mask, TokenIdsWithOffsets};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// # Pretrained vocabulary files available on the model hub
pub struct VocabResources;

/// # Pretrained BPE merges files available on the model hub
pub struct MergesResources;

impl VocabResources {
    /// Shared under Apache 2.0 license by the Google team at <https://github.com/google-research/bert>.
    pub const BERT_BASE_UNCASED: (&'static str, &'static str) = (
        "bert-base-uncased/vocab",
        "https://huggingface.co/bert-base-uncased/resolve/main/vocab.txt",
    );
    /// Shared under Apache 2.0 license by the Hugging Face Inc. team at <https://huggingface.co/distilbert-base-uncased>.
    pub const DISTIL_BERT_BASE_UNCASED: (&'static str, &'static str) = (
        "distilbert-base-uncased/vocab",
        "https://huggingface.co/distilbert-base-uncased/resolve/main/vocab.txt",
    );
    /// Shared under MIT license by the Facebook AI team at <https://github.com/pytorch/fairseq>.
    pub const ROBERTA_BASE: (&'static str, &'static str) = (
        "roberta-base/vocab",
        "https://huggingface.co/roberta-base/resolve/main/vocab.json",
    );
    /// Shared under Apache 2.0 license by the Google team at <https://github.com/google-research/albert>.
    pub const ALBERT_BASE_V2: (&'static str, &'static str) = (
        "albert-base-v2/spiece",
        "https://huggingface.co/albert-base-v2/resolve/main/spiece.model",
    );
    /// Shared under Apache 2.0 license by the XLNet Authors at <https://github.com/zihangdai/xlnet>.
    pub const XLNET_BASE_CASED: (&'static str, &'static str) = (
        "xlnet-base-cased/spiece",
        "https://huggingface.co/xlnet-base-cased/resolve/main/spiece.model",
    );
}

impl MergesResources {
    /// Shared under MIT license by the Facebook AI team at <https://github.com/pytorch/fairseq>.
    pub const ROBERTA_BASE: (&'static str, &'static str) = (
        "roberta-base/merges",
        "https://huggingface.co/roberta-base/resolve/main/merges.txt",
    );
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// # Identifies the architecture family of a pretrained tokenizer
pub enum ModelType {
    Bert,
    DistilBert,
    Electra,
    Roberta,
    Albert,
    #[serde(rename = "xlnet")]
    XLNet,
}

impl ModelType {
    fn pad_token(&self) -> &'static str {
        match self {
            ModelType::Bert | ModelType::DistilBert | ModelType::Electra => "[PAD]",
            ModelType::Roberta | ModelType::Albert | ModelType::XLNet => "<pad>",
        }
    }

    /// Unknown token registered in the vocabulary of this architecture
    pub fn unknown_token(&self) -> &'static str {
        match self {
            ModelType::Bert | ModelType::DistilBert | ModelType::Electra => "[UNK]",
            ModelType::Roberta | ModelType::Albert | ModelType::XLNet => "<unk>",
        }
    }

    /// Side on which padding tokens are added by default
    pub fn default_padding_side(&self) -> PaddingSide {
        match self {
            ModelType::XLNet => PaddingSide::Left,
            _ => PaddingSide::Right,
        }
    }

    fn pad_token_type_id(&self) -> i64 {
        match self {
            ModelType::XLNet => 3,
            _ => 0,
        }
    }

    /// Whether the model consumes token type (segment) ids
    pub fn uses_token_type_ids(&self) -> bool {
        !matches!(self, ModelType::DistilBert | ModelType::Roberta)
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// # Side of the sequence receiving the padding tokens
pub enum PaddingSide {
    Left,
    Right,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// # Strategy used to truncate a sequence pair exceeding the maximum length
pub enum TruncationStrategy {
    /// Iteratively remove a token from the longest sequence
    LongestFirst,
    /// Only truncate the first sequence
    OnlyFirst,
    /// Only truncate the second sequence
    OnlySecond,
    /// Fail if the input exceeds the maximum length
    DoNotTruncate,
}

impl Default for TruncationStrategy {
    fn default() -> Self {
        TruncationStrategy::LongestFirst
    }
}

impl From<TruncationStrategy> for rust_tokenizers::tokenizer::TruncationStrategy {
    fn from(strategy: TruncationStrategy) -> Self {
        match strategy {
            TruncationStrategy::LongestFirst => Self::LongestFirst,
            TruncationStrategy::OnlyFirst => Self::OnlyFirst,
            TruncationStrategy::OnlySecond => Self::OnlySecond,
            TruncationStrategy::DoNotTruncate => Self::DoNotTruncate,
        }
    }
}

impl FromStr for TruncationStrategy {
    type Err = AdapterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "longest_first" => Ok(TruncationStrategy::LongestFirst),
            "only_first" => Ok(TruncationStrategy::OnlyFirst),
            "only_second" => Ok(TruncationStrategy::OnlySecond),
            "do_not_truncate" => Ok(TruncationStrategy::DoNotTruncate),
            _ => Err(AdapterError::InvalidConfigurationError(format!(
                "Unknown truncation strategy {}",
                value
            ))),
        }
    }
}

impl fmt::Display for TruncationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TruncationStrategy::LongestFirst => "longest_first",
            TruncationStrategy::OnlyFirst => "only_first",
            TruncationStrategy::OnlySecond => "only_second",
            TruncationStrategy::DoNotTruncate => "do_not_truncate",
        };
        f.write_str(name)
    }
}

/// # Output of the sequence pair assembly
/// Fields the tokenizer does not produce are left as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPair {
    pub input_ids: Vec<i64>,
    pub token_type_ids: Option<Vec<i64>>,
    pub attention_mask: Option<Vec<i64>>,
}

/// # Tokenizer capability consumed by the data pipeline
pub trait HubTokenizer {
    /// Splits a text into (sub-word) tokens
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Converts tokens into vocabulary ids
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64>;

    /// Returns the full vocabulary as a token to id mapping
    fn get_vocab(&self) -> HashMap<String, i64>;

    /// Token used for out-of-vocabulary entries
    fn unknown_token(&self) -> &str;

    /// Side on which the tokenizer pads its inputs
    fn padding_side(&self) -> PaddingSide;

    /// Assembles a sequence (pair) of token ids for the model: truncation, special tokens
    /// insertion and padding.
    ///
    /// # Arguments
    ///
    /// * `token_ids_1` - first sequence of token ids
    /// * `token_ids_2` - optional second sequence of token ids
    /// * `max_length` - maximum length of the assembled input, special tokens included
    /// * `pad_to_max_length` - pad the assembled input up to `max_length`
    /// * `truncation_strategy` - `TruncationStrategy` applied when the pair exceeds `max_length`
    fn prepare_for_model(
        &self,
        token_ids_1: &[i64],
        token_ids_2: Option<&[i64]>,
        max_length: usize,
        pad_to_max_length: bool,
        truncation_strategy: TruncationStrategy,
    ) -> Result<EncodedPair, AdapterError>;

    /// Converts a sequence of ids back into a string
    fn decode(&self, token_ids: &[i64], skip_special_tokens: bool) -> String;
}

/// # Abstraction that holds a particular `rust_tokenizers` backend
pub enum TokenizerOption {
    /// Bert Tokenizer (also used by DistilBERT and Electra)
    Bert(BertTokenizer),
    /// Roberta Tokenizer
    Roberta(RobertaTokenizer),
    /// Albert Tokenizer
    Albert(AlbertTokenizer),
    /// XLNet Tokenizer
    XLNet(XLNetTokenizer),
}

fn num_added_tokens<T: Vocab, U: Tokenizer<T>>(tokenizer: &U, pair: bool) -> usize {
    let empty = || TokenIdsWithOffsets {
        ids: vec![],
        offsets: vec![],
        reference_offsets: vec![],
        masks: vec![],
    };
    tokenizer
        .build_input_with_special_tokens(empty(), if pair { Some(empty()) } else { None })
        .token_ids
        .len()
}

fn build_with_special_tokens<T: Vocab, U: Tokenizer<T>>(
    tokenizer: &U,
    token_ids_1: TokenIdsWithOffsets,
    token_ids_2: Option<TokenIdsWithOffsets>,
) -> (Vec<i64>, Vec<i8>) {
    let encoded = tokenizer.build_input_with_special_tokens(token_ids_1, token_ids_2);
    (encoded.token_ids, encoded.segment_ids)
}

fn to_token_ids_with_offsets(token_ids: &[i64]) -> TokenIdsWithOffsets {
    TokenIdsWithOffsets {
        ids: token_ids.to_vec(),
        offsets: vec![None; token_ids.len()],
        reference_offsets: vec![vec![]; token_ids.len()],
        masks: vec![Mask::None; token_ids.len()],
    }
}

impl TokenizerOption {
    /// Interface method to load a backend tokenizer from file
    pub fn from_file<P: AsRef<Path>>(
        model_type: ModelType,
        vocab_path: P,
        merges_path: Option<P>,
        lower_case: bool,
        strip_accents: Option<bool>,
        add_prefix_space: Option<bool>,
    ) -> Result<Self, AdapterError> {
        let tokenizer = match model_type {
            ModelType::Bert | ModelType::DistilBert | ModelType::Electra => {
                if let Some(add_prefix_space) = add_prefix_space {
                    return Err(AdapterError::InvalidConfigurationError(format!(
                        "Optional input `add_prefix_space` set to value {} but cannot be used by {:?}",
                        add_prefix_space, model_type
                    )));
                }
                TokenizerOption::Bert(BertTokenizer::from_file(
                    vocab_path,
                    lower_case,
                    strip_accents.unwrap_or(lower_case),
                )?)
            }
            ModelType::Roberta => {
                if let Some(strip_accents) = strip_accents {
                    return Err(AdapterError::InvalidConfigurationError(format!(
                        "Optional input `strip_accents` set to value {} but cannot be used by {:?}",
                        strip_accents, model_type
                    )));
                }
                let merges_path = merges_path.ok_or_else(|| {
                    AdapterError::InvalidConfigurationError(format!(
                        "A merges file is required by {:?}",
                        model_type
                    ))
                })?;
                TokenizerOption::Roberta(RobertaTokenizer::from_file(
                    vocab_path,
                    merges_path,
                    lower_case,
                    add_prefix_space.unwrap_or(false),
                )?)
            }
            ModelType::Albert => {
                if let Some(add_prefix_space) = add_prefix_space {
                    return Err(AdapterError::InvalidConfigurationError(format!(
                        "Optional input `add_prefix_space` set to value {} but cannot be used by {:?}",
                        add_prefix_space, model_type
                    )));
                }
                TokenizerOption::Albert(AlbertTokenizer::from_file(
                    vocab_path,
                    lower_case,
                    strip_accents.unwrap_or(lower_case),
                )?)
            }
            ModelType::XLNet => {
                if let Some(add_prefix_space) = add_prefix_space {
                    return Err(AdapterError::InvalidConfigurationError(format!(
                        "Optional input `add_prefix_space` set to value {} but cannot be used by {:?}",
                        add_prefix_space, model_type
                    )));
                }
                TokenizerOption::XLNet(XLNetTokenizer::from_file(
                    vocab_path,
                    lower_case,
                    strip_accents.unwrap_or(false),
                )?)
            }
        };
        Ok(tokenizer)
    }

    /// Interface method to tokenization
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        match *self {
            Self::Bert(ref tokenizer) => tokenizer.tokenize(text),
            Self::Roberta(ref tokenizer) => tokenizer.tokenize(text),
            Self::Albert(ref tokenizer) => tokenizer.tokenize(text),
            Self::XLNet(ref tokenizer) => tokenizer.tokenize(text),
        }
    }

    /// Interface method to convert tokens to ids
    pub fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64> {
        match *self {
            Self::Bert(ref tokenizer) => tokenizer.convert_tokens_to_ids(tokens),
            Self::Roberta(ref tokenizer) => tokenizer.convert_tokens_to_ids(tokens),
            Self::Albert(ref tokenizer) => tokenizer.convert_tokens_to_ids(tokens),
            Self::XLNet(ref tokenizer) => tokenizer.convert_tokens_to_ids(tokens),
        }
    }

    /// Interface method to the vocabulary values
    pub fn vocab_values(&self) -> &HashMap<String, i64> {
        match *self {
            Self::Bert(ref tokenizer) => tokenizer.vocab().values(),
            Self::Roberta(ref tokenizer) => tokenizer.vocab().values(),
            Self::Albert(ref tokenizer) => tokenizer.vocab().values(),
            Self::XLNet(ref tokenizer) => tokenizer.vocab().values(),
        }
    }

    /// Number of special tokens added around a single sequence or a pair
    pub fn num_added_tokens(&self, pair: bool) -> usize {
        match *self {
            Self::Bert(ref tokenizer) => num_added_tokens(tokenizer, pair),
            Self::Roberta(ref tokenizer) => num_added_tokens(tokenizer, pair),
            Self::Albert(ref tokenizer) => num_added_tokens(tokenizer, pair),
            Self::XLNet(ref tokenizer) => num_added_tokens(tokenizer, pair),
        }
    }

    /// Interface method to add special tokens, returning the token ids and segment ids
    pub fn build_input_with_special_tokens(
        &self,
        token_ids_1: TokenIdsWithOffsets,
        token_ids_2: Option<TokenIdsWithOffsets>,
    ) -> (Vec<i64>, Vec<i8>) {
        match *self {
            Self::Bert(ref tokenizer) => {
                build_with_special_tokens(tokenizer, token_ids_1, token_ids_2)
            }
            Self::Roberta(ref tokenizer) => {
                build_with_special_tokens(tokenizer, token_ids_1, token_ids_2)
            }
            Self::Albert(ref tokenizer) => {
                build_with_special_tokens(tokenizer, token_ids_1, token_ids_2)
            }
            Self::XLNet(ref tokenizer) => {
                build_with_special_tokens(tokenizer, token_ids_1, token_ids_2)
            }
        }
    }

    /// Interface method to decoding
    pub fn decode(&self, token_ids: &[i64], skip_special_tokens: bool) -> String {
        match *self {
            Self::Bert(ref tokenizer) => tokenizer.decode(token_ids, skip_special_tokens, true),
            Self::Roberta(ref tokenizer) => tokenizer.decode(token_ids, skip_special_tokens, true),
            Self::Albert(ref tokenizer) => tokenizer.decode(token_ids, skip_special_tokens, true),
            Self::XLNet(ref tokenizer) => tokenizer.decode(token_ids, skip_special_tokens, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// # Configuration for a `TransformerTokenizer`
pub struct TokenizerConfig {
    /// Architecture family of the tokenizer
    pub model_type: ModelType,
    /// Lower case the input before tokenization
    #[serde(default)]
    pub lower_case: bool,
    /// Strip accents (Bert, Albert, XLNet only)
    #[serde(default)]
    pub strip_accents: Option<bool>,
    /// Add a prefix space before the first word (Roberta only)
    #[serde(default)]
    pub add_prefix_space: Option<bool>,
    /// Overrides the padding side of the architecture
    #[serde(default)]
    pub padding_side: Option<PaddingSide>,
}

impl Config for TokenizerConfig {}

impl TokenizerConfig {
    pub fn new(model_type: ModelType, lower_case: bool) -> TokenizerConfig {
        TokenizerConfig {
            model_type,
            lower_case,
            strip_accents: None,
            add_prefix_space: None,
            padding_side: None,
        }
    }
}

/// # Pretrained tokenizer with the assembly conventions of its architecture
pub struct TransformerTokenizer {
    tokenizer: TokenizerOption,
    model_type: ModelType,
    padding_side: PaddingSide,
    pad_token_id: i64,
}

impl TransformerTokenizer {
    /// Wraps a backend tokenizer. Fails if the padding token of the architecture is missing from
    /// the vocabulary.
    pub fn new(
        tokenizer: TokenizerOption,
        model_type: ModelType,
    ) -> Result<TransformerTokenizer, AdapterError> {
        let pad_token_id = *tokenizer
            .vocab_values()
            .get(model_type.pad_token())
            .ok_or_else(|| {
                AdapterError::InvalidConfigurationError(format!(
                    "Padding token {} not found in the vocabulary",
                    model_type.pad_token()
                ))
            })?;
        Ok(TransformerTokenizer {
            tokenizer,
            model_type,
            padding_side: model_type.default_padding_side(),
            pad_token_id,
        })
    }

    /// Loads a tokenizer from local vocabulary (and merges) files.
    ///
    /// # Arguments
    ///
    /// * `config` - `TokenizerConfig` with the architecture and tokenization options
    /// * `vocab_path` - path to the vocabulary file
    /// * `merges_path` - optional path to the merges file (BPE tokenizers)
    pub fn from_file<P: AsRef<Path>>(
        config: &TokenizerConfig,
        vocab_path: P,
        merges_path: Option<P>,
    ) -> Result<TransformerTokenizer, AdapterError> {
        let tokenizer = TokenizerOption::from_file(
            config.model_type,
            vocab_path,
            merges_path,
            config.lower_case,
            config.strip_accents,
            config.add_prefix_space,
        )?;
        let tokenizer = TransformerTokenizer::new(tokenizer, config.model_type)?;
        Ok(match config.padding_side {
            Some(padding_side) => tokenizer.with_padding_side(padding_side),
            None => tokenizer,
        })
    }

    /// Loads a tokenizer from local or remote resources.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use transformer_adapters::data::{
    ///     ModelType, TokenizerConfig, TransformerTokenizer, VocabResources,
    /// };
    /// use transformer_adapters::resources::RemoteResource;
    /// # fn main() -> anyhow::Result<()> {
    /// let vocab_resource = RemoteResource::from_pretrained(VocabResources::BERT_BASE_UNCASED);
    /// let tokenizer = TransformerTokenizer::from_resources(
    ///     &TokenizerConfig::new(ModelType::Bert, true),
    ///     &vocab_resource,
    ///     None,
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_resources(
        config: &TokenizerConfig,
        vocab_resource: &dyn ResourceProvider,
        merges_resource: Option<&dyn ResourceProvider>,
    ) -> Result<TransformerTokenizer, AdapterError> {
        let vocab_path = vocab_resource.get_local_path()?;
        let merges_path = merges_resource
            .map(|resource| resource.get_local_path())
            .transpose()?;
        TransformerTokenizer::from_file(config, vocab_path, merges_path)
    }

    /// Overrides the padding side of the architecture
    pub fn with_padding_side(mut self, padding_side: PaddingSide) -> TransformerTokenizer {
        self.padding_side = padding_side;
        self
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn pad_token_id(&self) -> i64 {
        self.pad_token_id
    }

    fn pad(&self, sequence: &mut Vec<i64>, value: i64, length: usize) {
        if sequence.len() >= length {
            return;
        }
        let padding = vec![value; length - sequence.len()];
        match self.padding_side {
            PaddingSide::Right => sequence.extend(padding),
            PaddingSide::Left => {
                let tokens = std::mem::replace(sequence, padding);
                sequence.extend(tokens);
            }
        }
    }
}

impl HubTokenizer for TransformerTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenizer.tokenize(text)
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64> {
        self.tokenizer.convert_tokens_to_ids(tokens)
    }

    fn get_vocab(&self) -> HashMap<String, i64> {
        self.tokenizer.vocab_values().clone()
    }

    fn unknown_token(&self) -> &str {
        self.model_type.unknown_token()
    }

    fn padding_side(&self) -> PaddingSide {
        self.padding_side
    }

    fn prepare_for_model(
        &self,
        token_ids_1: &[i64],
        token_ids_2: Option<&[i64]>,
        max_length: usize,
        pad_to_max_length: bool,
        truncation_strategy: TruncationStrategy,
    ) -> Result<EncodedPair, AdapterError> {
        let total_length = token_ids_1.len()
            + token_ids_2.map_or(0, |ids| ids.len())
            + self.tokenizer.num_added_tokens(token_ids_2.is_some());
        let num_tokens_to_remove = total_length.saturating_sub(max_length);

        let first = to_token_ids_with_offsets(token_ids_1);
        let second = token_ids_2.map(to_token_ids_with_offsets);
        let (first, second) = if num_tokens_to_remove > 0 {
            if truncation_strategy == TruncationStrategy::DoNotTruncate {
                return Err(AdapterError::SequenceOverflow(total_length, max_length));
            }
            let (first, second, _, _) = truncate_sequences(
                first,
                second,
                num_tokens_to_remove,
                &truncation_strategy.into(),
                0,
            )?;
            (first, second)
        } else {
            (first, second)
        };

        let (mut input_ids, segment_ids) =
            self.tokenizer.build_input_with_special_tokens(first, second);
        let mut token_type_ids: Vec<i64> = segment_ids.into_iter().map(i64::from).collect();
        let mut attention_mask = vec![1; input_ids.len()];
        if pad_to_max_length {
            self.pad(&mut input_ids, self.pad_token_id, max_length);
            self.pad(
                &mut token_type_ids,
                self.model_type.pad_token_type_id(),
                max_length,
            );
            self.pad(&mut attention_mask, 0, max_length);
        }

        Ok(EncodedPair {
            input_ids,
            token_type_ids: if self.model_type.uses_token_type_ids() {
                Some(token_type_ids)
            } else {
                None
            },
            attention_mask: Some(attention_mask),
        })
    }

    fn decode(&self, token_ids: &[i64], skip_special_tokens: bool) -> String {
        self.tokenizer.decode(token_ids, skip_special_tokens)
    }
}

impl<T: HubTokenizer + ?Sized> HubTokenizer for &T {
    fn tokenize(&self, text: &str) -> Vec<String> {
        (**self).tokenize(text)
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64> {
        (**self).convert_tokens_to_ids(tokens)
    }

    fn get_vocab(&self) -> HashMap<String, i64> {
        (**self).get_vocab()
    }

    fn unknown_token(&self) -> &str {
        (**self).unknown_token()
    }

    fn padding_side(&self) -> PaddingSide {
        (**self).padding_side()
    }

    fn prepare_for_model(
        &self,
        token_ids_1: &[i64],
        token_ids_2: Option<&[i64]>,
        max_length: usize,
        pad_to_max_length: bool,
        truncation_strategy: TruncationStrategy,
    ) -> Result<EncodedPair, AdapterError> {
        (**self).prepare_for_model(
            token_ids_1,
            token_ids_2,
            max_length,
            pad_to_max_length,
            truncation_strategy,
        )
    }

    fn decode(&self, token_ids: &[i64], skip_special_tokens: bool) -> String {
        (**self).decode(token_ids, skip_special_tokens)
    }
}

/// # Tokenization function handed to the text pipeline
/// Yields the tokens of each text lazily, in input order.
pub struct TokenizerAdapter<T: HubTokenizer> {
    tokenizer: T,
}

impl<T: HubTokenizer> TokenizerAdapter<T> {
    pub fn new(tokenizer: T) -> TokenizerAdapter<T> {
        TokenizerAdapter { tokenizer }
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Tokenizes a sequence of texts, one token sequence per input text.
    pub fn tokenize_items<'a, I>(&'a self, items: I) -> impl Iterator<Item = Vec<String>> + 'a
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        I::IntoIter: 'a,
    {
        items
            .into_iter()
            .map(move |text| self.tokenizer.tokenize(text.as_ref()))
    }
}
