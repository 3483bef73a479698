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

//! # Tabular previews of batches and predictions
//! Input ids are decoded back to text with the tokenizer and displayed next to the targets
//! (and, after inference, the decoded predictions). Presentation only.

use crate::common::error::AdapterError;
use crate::data::tokenizer::HubTokenizer;
use std::convert::TryFrom;
use std::fmt;
use tch::{Kind, Tensor};

/// # Conversion of targets to preview cells
pub trait TargetFields {
    fn fields(&self) -> Vec<String>;
}

macro_rules! impl_scalar_target_fields {
    ($($type:ty),*) => {
        $(
            impl TargetFields for $type {
                fn fields(&self) -> Vec<String> {
                    vec![self.to_string()]
                }
            }
        )*
    };
}

impl_scalar_target_fields!(i64, i32, usize, f64, f32, bool, String, &str);

impl<T: fmt::Display> TargetFields for Vec<T> {
    fn fields(&self) -> Vec<String> {
        self.iter().map(|value| value.to_string()).collect()
    }
}

impl<A: fmt::Display, B: fmt::Display> TargetFields for (A, B) {
    fn fields(&self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

/// # Table of decoded inputs, targets and predictions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn column_names(prefix: &str, count: usize) -> Vec<String> {
    if count == 1 {
        vec![prefix.to_string()]
    } else {
        (1..=count)
            .map(|index| format!("{}{}", prefix, index))
            .collect()
    }
}

fn batch_size(tensor: &Tensor, name: &str) -> Result<usize, AdapterError> {
    match tensor.size().first() {
        Some(size) => Ok(*size as usize),
        None => Err(AdapterError::ValueError(format!(
            "{} has no batch dimension",
            name
        ))),
    }
}

fn format_cell(row: &Tensor) -> Result<String, AdapterError> {
    let values = Vec::<f64>::try_from(&row.to_kind(Kind::Double).flatten(0, -1))?;
    let format_value = |value: &f64| {
        if value.fract() == 0.0 {
            format!("{}", *value as i64)
        } else {
            format!("{:.4}", value)
        }
    };
    Ok(match values.as_slice() {
        [value] => format_value(value),
        values => format!(
            "[{}]",
            values
                .iter()
                .map(format_value)
                .collect::<Vec<String>>()
                .join(", ")
        ),
    })
}

/// Decodes the first `max_n` inputs of a batch and displays them with their targets.
///
/// # Arguments
///
/// * `tokenizer` - tokenizer used to decode the input ids
/// * `input_ids` - batch of input ids of shape `[batch_size, length]`
/// * `targets` - targets of each sample of the batch
/// * `max_n` - maximum number of samples displayed
pub fn show_batch<T: HubTokenizer + ?Sized, Y: TargetFields>(
    tokenizer: &T,
    input_ids: &Tensor,
    targets: &[Y],
    max_n: usize,
) -> Result<BatchPreview, AdapterError> {
    let num_rows = max_n.min(targets.len()).min(batch_size(input_ids, "input_ids")?);
    let mut rows = Vec::with_capacity(num_rows);
    let mut num_targets = 0;
    for (index, target) in targets.iter().take(num_rows).enumerate() {
        let token_ids = Vec::<i64>::try_from(&input_ids.f_get(index as i64)?)?;
        let mut row = vec![tokenizer.decode(&token_ids, true)];
        let fields = target.fields();
        num_targets = num_targets.max(fields.len());
        row.extend(fields);
        rows.push(row);
    }
    let mut columns = vec!["text".to_string()];
    columns.extend(column_names("target", num_targets));
    Ok(BatchPreview { columns, rows })
}

/// Same as `show_batch`, with the decoded predictions of each output appended.
///
/// # Arguments
///
/// * `predictions` - one decoded tensor per model output, of shape `[batch_size, ...]`
pub fn show_results<T: HubTokenizer + ?Sized, Y: TargetFields>(
    tokenizer: &T,
    input_ids: &Tensor,
    targets: &[Y],
    predictions: &[Tensor],
    max_n: usize,
) -> Result<BatchPreview, AdapterError> {
    let mut preview = show_batch(tokenizer, input_ids, targets, max_n)?;
    for (position, prediction) in predictions.iter().enumerate() {
        let num_predictions = batch_size(prediction, "prediction")?;
        if num_predictions < preview.rows.len() {
            return Err(AdapterError::ValueError(format!(
                "prediction {} has {} rows, {} are displayed",
                position,
                num_predictions,
                preview.rows.len()
            )));
        }
    }
    for (index, row) in preview.rows.iter_mut().enumerate() {
        for prediction in predictions {
            row.push(format_cell(&prediction.f_get(index as i64)?)?);
        }
    }
    preview
        .columns
        .extend(column_names("prediction", predictions.len()));
    Ok(preview)
}

impl fmt::Display for BatchPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.columns.iter().map(|name| name.chars().count()).collect();
        for row in &self.rows {
            for (position, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(position) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }
        let write_row = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let line = cells
                .iter()
                .zip(widths.iter())
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect::<Vec<String>>()
                .join(" | ");
            writeln!(f, "{}", line.trim_end())
        };
        write_row(f, &self.columns)?;
        let separator: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        writeln!(f, "{}", separator.join("-+-"))?;
        for row in &self.rows {
            write_row(f, row)?;
        }
        Ok(())
    }
}
