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

//! # Parameter groups for discriminative learning rates
//! Parameter names are dot-separated module paths (`bert.encoder.layer.0.attention.weight`).
//! The first root module (the transformer body) is split into its child modules, every other
//! root module (e.g. the classification head) forms one group. Parameters owned directly by the
//! model or by the body module are not assigned to any group.

use crate::common::error::AdapterError;
use tch::nn::VarStore;
use tch::Tensor;

/// Splits an ordered list of named parameters into groups
pub fn split_parameters<T>(named_parameters: Vec<(String, T)>) -> Vec<Vec<(String, T)>> {
    let mut body: Option<String> = None;
    let mut keys: Vec<String> = vec![];
    let mut groups: Vec<Vec<(String, T)>> = vec![];
    for (name, parameter) in named_parameters {
        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() < 2 {
            continue;
        }
        let root = segments[0];
        let body_name = body.get_or_insert_with(|| root.to_string());
        let key = if root == body_name.as_str() {
            if segments.len() < 3 {
                continue;
            }
            format!("{}.{}", root, segments[1])
        } else {
            root.to_string()
        };
        match keys.iter().position(|existing| existing == &key) {
            Some(position) => groups[position].push((name, parameter)),
            None => {
                keys.push(key);
                groups.push(vec![(name, parameter)]);
            }
        }
    }
    groups
}

/// Splits the variables of a `VarStore`. Names are sorted, except for the variables of
/// `body_module` that come first so that it is picked as the split module. Fails when no
/// variable belongs to `body_module`.
pub fn split_var_store(
    var_store: &VarStore,
    body_module: &str,
) -> Result<Vec<Vec<(String, Tensor)>>, AdapterError> {
    let prefix = format!("{}.", body_module);
    let mut variables: Vec<(String, Tensor)> = var_store.variables().into_iter().collect();
    if !variables.iter().any(|(name, _)| name.starts_with(&prefix)) {
        return Err(AdapterError::InvalidConfigurationError(format!(
            "no variable belongs to the body module {}",
            body_module
        )));
    }
    variables.sort_by(|(name_a, _), (name_b, _)| {
        (!name_a.starts_with(&prefix), name_a).cmp(&(!name_b.starts_with(&prefix), name_b))
    });
    Ok(split_parameters(variables))
}
