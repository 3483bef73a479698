//! # Transformer adapters
//!
//! Adapters plugging pretrained transformer models and their tokenizers into a text training
//! pipeline. Text columns are tokenized with the `rust_tokenizers` backends used by pretrained
//! checkpoints, assembled into `(input_ids, token_type_ids, attention_mask)` triples per task,
//! batched, and fed to `tch` models that only receive the arguments they accept.
//!
//! - `data`: tokenizer wrapper, input assembly, batch transform, text block and batch previews
//! - `modeling`: argument filter, model wrappers, training loop callback, multi-target loss,
//!   parameter splitter and a minimal learner
//! - `resources`: local and remote (cached) vocabulary files
//!
//! ```no_run
//! use std::sync::Arc;
//! use transformer_adapters::data::{
//!     BatchTransform, BatchTransformConfig, ModelType, Sample, SampleText, Task, TokenizerAdapter,
//!     TokenizerConfig, TransformerTokenizer,
//! };
//! use transformer_adapters::data::HubTokenizer;
//! use transformer_adapters::resources::RemoteResource;
//! use transformer_adapters::data::VocabResources;
//! # fn main() -> anyhow::Result<()> {
//! let vocab = RemoteResource::from_pretrained(VocabResources::BERT_BASE_UNCASED);
//! let tokenizer = Arc::new(TransformerTokenizer::from_resources(
//!     &TokenizerConfig::new(ModelType::Bert, true),
//!     &vocab,
//!     None,
//! )?);
//!
//! let adapter = TokenizerAdapter::new(tokenizer.as_ref());
//! let tokens: Vec<Vec<String>> = adapter.tokenize_items(vec!["Hello world"]).collect();
//! let ids = tokenizer.convert_tokens_to_ids(&tokens[0]);
//!
//! let batch_transform = BatchTransform::new(
//!     tokenizer.clone(),
//!     BatchTransformConfig {
//!         max_seq_len: 128,
//!         truncation_strategy: None,
//!         task: Task::Generic,
//!     },
//! );
//! let batch = batch_transform.encodes(vec![Sample::new(SampleText::Single(ids), 1i64)])?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod data;
pub mod modeling;

pub use common::config::Config;
pub use common::error::AdapterError;
pub use common::resources;
