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

//! # Text pipeline description
//! A `TextBlock` bundles the column-wise tokenization, the numericalization of the tokens and the
//! `BatchTransform` applied before each mini-batch. It can be built directly from the text
//! columns of a `TabularData` table.
//!
//! ```no_run
//! use std::sync::Arc;
//! use transformer_adapters::data::{
//!     ModelType, TabularData, Task, TextBlock, TokenizerConfig, TransformerTokenizer,
//! };
//! # fn main() -> anyhow::Result<()> {
//! let tokenizer = Arc::new(TransformerTokenizer::from_file(
//!     &TokenizerConfig::new(ModelType::Bert, true),
//!     "path/to/vocab.txt",
//!     None,
//! )?);
//! let data = TabularData::from_path("path/to/reviews.csv")?;
//! let block = TextBlock::from_columns(
//!     &[vec!["title", "review"]],
//!     tokenizer,
//!     Task::Generic,
//!     None,
//!     None,
//!     None,
//!     256,
//! )?;
//! let labels: Vec<i64> = data.parse_column("label")?;
//! let samples = block.samples(&data, labels)?;
//! for batch in block.dataloader(16).batches(samples)? {
//!     // hand the batch to the training loop
//! }
//! # Ok(())
//! # }
//! ```

use crate::common::error::AdapterError;
use crate::data::batch::{BatchTransform, BatchTransformConfig, EncodedSample, Sample, SampleText};
use crate::data::input::Task;
use crate::data::tokenizer::{HubTokenizer, TokenizerAdapter};
use std::collections::HashMap;
use std::fmt::Debug;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// # Column-addressed table of strings
#[derive(Debug, Clone, PartialEq)]
pub struct TabularData {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularData {
    /// Builds a table, failing if a row does not have one value per column.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<TabularData, AdapterError> {
        if let Some((position, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(AdapterError::ValueError(format!(
                "Row {} has {} values, expected {}",
                position,
                row.len(),
                headers.len()
            )));
        }
        Ok(TabularData { headers, rows })
    }

    /// Reads a CSV table with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<TabularData, AdapterError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers = csv.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in csv.records() {
            rows.push(record?.iter().map(String::from).collect());
        }
        TabularData::new(headers, rows)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<TabularData, AdapterError> {
        let file = std::fs::File::open(path.as_ref()).map_err(|e| {
            AdapterError::IOError(format!("{} not found: {}", path.as_ref().display(), e))
        })?;
        TabularData::from_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, AdapterError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| AdapterError::ValueError(format!("Column {} not found", name)))
    }

    /// Values of a column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&str>, AdapterError> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Parses the values of a column (e.g. integer labels)
    pub fn parse_column<F>(&self, name: &str) -> Result<Vec<F>, AdapterError>
    where
        F: FromStr,
        F::Err: Debug,
    {
        self.column(name)?
            .into_iter()
            .map(|value| {
                value.trim().parse::<F>().map_err(|e| {
                    AdapterError::ValueError(format!(
                        "Could not parse `{}` in column {}: {:?}",
                        value, name, e
                    ))
                })
            })
            .collect()
    }
}

/// # Tokenization of a group of text columns
/// The columns of a group are joined with a space and tokenized as a single text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTokenizer {
    text_cols: Vec<String>,
    res_col_name: String,
}

impl ColumnTokenizer {
    pub fn new(text_cols: Vec<String>, res_col_name: String) -> ColumnTokenizer {
        ColumnTokenizer {
            text_cols,
            res_col_name,
        }
    }

    pub fn text_cols(&self) -> &[String] {
        &self.text_cols
    }

    /// Name of the column holding the tokens
    pub fn res_col_name(&self) -> &str {
        &self.res_col_name
    }

    /// Tokenizes every row of the table
    pub fn tokenize<T: HubTokenizer>(
        &self,
        data: &TabularData,
        tokenizer: &TokenizerAdapter<T>,
    ) -> Result<Vec<Vec<String>>, AdapterError> {
        let indices = self
            .text_cols
            .iter()
            .map(|name| data.column_index(name))
            .collect::<Result<Vec<usize>, AdapterError>>()?;
        let texts = data.rows.iter().map(|row| {
            indices
                .iter()
                .map(|&index| row[index].as_str())
                .collect::<Vec<&str>>()
                .join(" ")
        });
        Ok(tokenizer.tokenize_items(texts).collect())
    }
}

/// # Conversion of tokens to ids through a vocabulary list
/// The id of a token is its position in the vocabulary. Unknown tokens map to the position of
/// the unknown token (0 if absent from the vocabulary).
#[derive(Debug, Clone)]
pub struct Numericalize {
    vocab: Vec<String>,
    o2i: HashMap<String, i64>,
    unknown_index: i64,
}

impl Numericalize {
    pub fn new(vocab: Vec<String>, unknown_token: &str) -> Numericalize {
        let o2i: HashMap<String, i64> = vocab
            .iter()
            .enumerate()
            .map(|(index, token)| (token.clone(), index as i64))
            .collect();
        let unknown_index = o2i.get(unknown_token).copied().unwrap_or(0);
        Numericalize {
            vocab,
            o2i,
            unknown_index,
        }
    }

    /// Uses the full vocabulary of the tokenizer, ordered by id.
    pub fn from_tokenizer<T: HubTokenizer + ?Sized>(tokenizer: &T) -> Numericalize {
        let mut entries: Vec<(String, i64)> = tokenizer.get_vocab().into_iter().collect();
        entries.sort_by_key(|(_, id)| *id);
        if entries
            .iter()
            .enumerate()
            .any(|(position, (_, id))| position as i64 != *id)
        {
            warn!(
                "tokenizer vocabulary ids are not contiguous, \
                 numericalized ids will differ from the tokenizer ids"
            );
        }
        let vocab = entries.into_iter().map(|(token, _)| token).collect();
        Numericalize::new(vocab, tokenizer.unknown_token())
    }

    pub fn vocab(&self) -> &[String] {
        &self.vocab
    }

    pub fn encode(&self, tokens: &[String]) -> Vec<i64> {
        tokens
            .iter()
            .map(|token| self.o2i.get(token).copied().unwrap_or(self.unknown_index))
            .collect()
    }

    pub fn decode(&self, token_ids: &[i64]) -> Vec<String> {
        token_ids
            .iter()
            .map(|&id| {
                self.vocab
                    .get(id as usize)
                    .or_else(|| self.vocab.get(self.unknown_index as usize))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// # Text pipeline: tokenization, numericalization and mini-batch assembly
pub struct TextBlock<T: HubTokenizer> {
    tokenizer: Arc<T>,
    tok_tfms: Vec<ColumnTokenizer>,
    numericalize: Numericalize,
    batch_transform: BatchTransform<T>,
}

impl<T: HubTokenizer> TextBlock<T> {
    /// Build a new `TextBlock`
    ///
    /// # Arguments
    ///
    /// * `tok_tfms` - one `ColumnTokenizer` per text input (at most two)
    /// * `tokenizer` - shared pretrained tokenizer
    /// * `task` - `Task` of the default batch transform
    /// * `batch_transform` - optional `BatchTransform`, replaces the default one
    /// * `vocab` - optional vocabulary list, defaults to the tokenizer vocabulary
    /// * `max_seq_len` - maximum length of the default batch transform
    ///
    /// The default batch transform leaves the truncation strategy unset, so each task applies its
    /// own default: `longest_first` for `Task::Generic`, and for `Task::QuestionAnswering` only the
    /// context is truncated (`only_second` with right padding, `only_first` with left padding).
    /// Pass a `BatchTransform` with `TruncationStrategy::LongestFirst` to truncate question and
    /// context alike.
    pub fn new(
        tok_tfms: Vec<ColumnTokenizer>,
        tokenizer: Arc<T>,
        task: Task,
        batch_transform: Option<BatchTransform<T>>,
        vocab: Option<Vec<String>>,
        max_seq_len: usize,
    ) -> Result<TextBlock<T>, AdapterError> {
        if tok_tfms.is_empty() || tok_tfms.len() > 2 {
            return Err(AdapterError::InvalidConfigurationError(format!(
                "A text block requires one or two text inputs, got {}",
                tok_tfms.len()
            )));
        }
        let batch_transform = batch_transform.unwrap_or_else(|| {
            BatchTransform::new(
                tokenizer.clone(),
                BatchTransformConfig {
                    max_seq_len,
                    truncation_strategy: None,
                    task,
                },
            )
        });
        let numericalize = match vocab {
            Some(vocab) => Numericalize::new(vocab, tokenizer.unknown_token()),
            None => Numericalize::from_tokenizer(tokenizer.as_ref()),
        };
        Ok(TextBlock {
            tokenizer,
            tok_tfms,
            numericalize,
            batch_transform,
        })
    }

    /// Creates a `TextBlock` from groups of text column names. Result columns default to
    /// `text0`, `text1`, ...
    pub fn from_columns<S: AsRef<str>>(
        text_cols_lists: &[Vec<S>],
        tokenizer: Arc<T>,
        task: Task,
        res_col_names: Option<Vec<String>>,
        vocab: Option<Vec<String>>,
        batch_transform: Option<BatchTransform<T>>,
        max_seq_len: usize,
    ) -> Result<TextBlock<T>, AdapterError> {
        let res_col_names = res_col_names.unwrap_or_else(|| {
            (0..text_cols_lists.len())
                .map(|index| format!("text{}", index))
                .collect()
        });
        if res_col_names.len() != text_cols_lists.len() {
            return Err(AdapterError::InvalidConfigurationError(format!(
                "{} result column names provided for {} text inputs",
                res_col_names.len(),
                text_cols_lists.len()
            )));
        }
        let tok_tfms = text_cols_lists
            .iter()
            .zip(res_col_names.into_iter())
            .map(|(text_cols, res_col_name)| {
                ColumnTokenizer::new(
                    text_cols
                        .iter()
                        .map(|name| name.as_ref().to_string())
                        .collect(),
                    res_col_name,
                )
            })
            .collect();
        TextBlock::new(
            tok_tfms,
            tokenizer,
            task,
            batch_transform,
            vocab,
            max_seq_len,
        )
    }

    pub fn tokenizer(&self) -> &T {
        self.tokenizer.as_ref()
    }

    pub fn tok_tfms(&self) -> &[ColumnTokenizer] {
        &self.tok_tfms
    }

    pub fn numericalize(&self) -> &Numericalize {
        &self.numericalize
    }

    pub fn batch_transform(&self) -> &BatchTransform<T> {
        &self.batch_transform
    }

    /// Tokenizes and numericalizes the text inputs of every row
    pub fn encode_texts(&self, data: &TabularData) -> Result<Vec<SampleText>, AdapterError> {
        let adapter = TokenizerAdapter::new(self.tokenizer.as_ref());
        let mut columns = self
            .tok_tfms
            .iter()
            .map(|tok_tfm| {
                tok_tfm.tokenize(data, &adapter).map(|rows| {
                    rows.iter()
                        .map(|tokens| self.numericalize.encode(tokens))
                        .collect::<Vec<Vec<i64>>>()
                })
            })
            .collect::<Result<Vec<Vec<Vec<i64>>>, AdapterError>>()?;
        debug!(rows = data.len(), inputs = columns.len(), "encoded text columns");

        let second = if columns.len() == 2 { columns.pop() } else { None };
        let first = columns.pop().unwrap_or_default();
        Ok(match second {
            Some(second) => first
                .into_iter()
                .zip(second.into_iter())
                .map(|(token_ids_1, token_ids_2)| SampleText::Pair(token_ids_1, token_ids_2))
                .collect(),
            None => first.into_iter().map(SampleText::Single).collect(),
        })
    }

    /// Builds the samples of a table, attaching one target per row
    pub fn samples<Y>(
        &self,
        data: &TabularData,
        targets: Vec<Y>,
    ) -> Result<Vec<Sample<Y>>, AdapterError> {
        if targets.len() != data.len() {
            return Err(AdapterError::ValueError(format!(
                "{} targets provided for {} rows",
                targets.len(),
                data.len()
            )));
        }
        Ok(self
            .encode_texts(data)?
            .into_iter()
            .zip(targets.into_iter())
            .map(|(text, targets)| Sample::new(text, targets))
            .collect())
    }

    /// Data loader applying the batch transform before each batch
    pub fn dataloader(&self, batch_size: usize) -> SortedDataLoader<'_, T> {
        SortedDataLoader::new(&self.batch_transform, batch_size)
    }
}

/// # Data loader sorting samples by decreasing length
/// Sorting groups samples of similar length in the same batch. The batch transform runs on each
/// batch before it is returned.
pub struct SortedDataLoader<'a, T: HubTokenizer> {
    before_batch: &'a BatchTransform<T>,
    batch_size: usize,
}

impl<'a, T: HubTokenizer> SortedDataLoader<'a, T> {
    pub fn new(before_batch: &'a BatchTransform<T>, batch_size: usize) -> SortedDataLoader<'a, T> {
        SortedDataLoader {
            before_batch,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batches<Y>(
        &self,
        mut samples: Vec<Sample<Y>>,
    ) -> Result<Vec<Vec<EncodedSample<Y>>>, AdapterError> {
        samples.sort_by(|a, b| b.text.len().cmp(&a.text.len()));
        let mut batches =
            Vec::with_capacity((samples.len() + self.batch_size - 1) / self.batch_size);
        let mut samples = samples.into_iter().peekable();
        while samples.peek().is_some() {
            let batch: Vec<Sample<Y>> = samples.by_ref().take(self.batch_size).collect();
            batches.push(self.before_batch.encodes(batch)?);
        }
        Ok(batches)
    }
}
