//! # Text data pipeline
//!
//! Turns raw text into the inputs expected by pretrained transformer models:
//! - `tokenizer`: the `HubTokenizer` capability, its `rust_tokenizers`-backed implementation and
//!   the per-item `TokenizerAdapter`
//! - `input`: assembly of a sequence (pair) into the `TokenizedInput` triple, per `Task`
//! - `batch`: the `BatchTransform` applied to every mini-batch
//! - `block`: the declarative `TextBlock` wiring column tokenization, numericalization and batch
//!   assembly over `TabularData`
//! - `display`: previews of batches and results

pub mod batch;
pub mod block;
pub mod display;
pub mod input;
pub mod tokenizer;

pub use batch::{
    collate_samples, BatchTransform, BatchTransformConfig, EncodedSample, Sample, SampleText,
};
pub use block::{ColumnTokenizer, Numericalize, SortedDataLoader, TabularData, TextBlock};
pub use display::{show_batch, show_results, BatchPreview, TargetFields};
pub use input::{
    absent_field, build_generic_input, build_question_answering_input, is_absent, Task,
    TokenizedInput, ABSENT_FIELD_SENTINEL,
};
pub use tokenizer::{
    EncodedPair, HubTokenizer, MergesResources, ModelType, PaddingSide, TokenizerAdapter,
    TokenizerConfig, TokenizerOption, TransformerTokenizer, TruncationStrategy, VocabResources,
};
