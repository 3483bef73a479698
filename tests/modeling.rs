extern crate anyhow;

use std::io::Write;
use std::sync::Arc;
use tch::{nn, nn::Module, nn::OptimizerConfig, Device, Kind, Tensor};
use tempfile::NamedTempFile;
use transformer_adapters::data::{
    collate_samples, BatchTransform, BatchTransformConfig, ModelType, Sample, SampleText, Task,
    TokenizedInput, TokenizerConfig, TransformerTokenizer,
};
use transformer_adapters::modeling::arguments::{ATTENTION_MASK, INPUT_IDS, TOKEN_TYPE_IDS};
use transformer_adapters::modeling::{
    split_var_store, Learner, LossReduction, LossSlot, ModelArguments, ModelWrapper,
    MultiTargetLoss, QuestionAnsweringModelWrapper, TransformerInputCallback, TransformerModel,
};
use transformer_adapters::AdapterError;

const VOCAB: [&str; 13] = [
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "hello", "world", "the", "answer", "is", "what",
    "?", "here",
];

/// Embeddings followed by a linear head. Token type embeddings are used when
/// `token_type_ids` is declared.
struct TinyTransformer {
    word_embeddings: nn::Embedding,
    token_type_embeddings: nn::Embedding,
    head: nn::Linear,
    parameters: Vec<&'static str>,
    question_answering: bool,
}

impl TinyTransformer {
    fn new(vs: &nn::VarStore, parameters: Vec<&'static str>, question_answering: bool) -> Self {
        let body = vs.root() / "body";
        let num_outputs = 2;
        TinyTransformer {
            word_embeddings: nn::embedding(
                &body / "word_embeddings",
                VOCAB.len() as i64,
                8,
                Default::default(),
            ),
            token_type_embeddings: nn::embedding(
                &body / "token_type_embeddings",
                2,
                8,
                Default::default(),
            ),
            head: nn::linear(vs.root() / "head", 8, num_outputs, Default::default()),
            parameters,
            question_answering,
        }
    }
}

impl TransformerModel for TinyTransformer {
    fn forward_parameters(&self) -> &[&str] {
        &self.parameters
    }

    fn forward_t(
        &self,
        arguments: &ModelArguments,
        _train: bool,
    ) -> Result<Vec<Tensor>, AdapterError> {
        let mut hidden = self.word_embeddings.forward(&arguments.input_ids);
        if self.parameters.contains(&TOKEN_TYPE_IDS) {
            let token_type_ids = arguments.require_token_type_ids()?;
            hidden = hidden + self.token_type_embeddings.forward(token_type_ids);
        }
        if self.question_answering {
            let mut logits = hidden.apply(&self.head).split(1, -1);
            let mut end_logits = logits.pop().unwrap().squeeze_dim(-1);
            let mut start_logits = logits.pop().unwrap().squeeze_dim(-1);
            if let Some(mask) = &arguments.attention_mask {
                let penalty = (mask.to_kind(Kind::Float) - 1.0) * 10000.0;
                start_logits = start_logits + &penalty;
                end_logits = end_logits + &penalty;
            }
            Ok(vec![start_logits, end_logits])
        } else {
            let weights = match &arguments.attention_mask {
                Some(mask) => mask.to_kind(Kind::Float),
                None => arguments.input_ids.ones_like().to_kind(Kind::Float),
            };
            let pooled = weights.unsqueeze(1).matmul(&hidden).squeeze_dim(1);
            Ok(vec![pooled.apply(&self.head), hidden])
        }
    }
}

fn vocab_file() -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    for token in VOCAB.iter() {
        writeln!(file, "{}", token)?;
    }
    file.flush()?;
    Ok(file)
}

fn batch(model_type: ModelType, task: Task) -> anyhow::Result<TokenizedInput> {
    let vocab = vocab_file()?;
    let tokenizer = TransformerTokenizer::from_file(
        &TokenizerConfig::new(model_type, true),
        vocab.path(),
        None,
    )?;
    let batch_transform = BatchTransform::new(
        Arc::new(tokenizer),
        BatchTransformConfig {
            max_seq_len: 12,
            truncation_strategy: None,
            task,
        },
    );
    let samples = batch_transform.encodes(vec![
        Sample::new(SampleText::Pair(vec![10, 9, 7, 8, 11], vec![7, 8, 9, 12]), ()),
        Sample::new(SampleText::Pair(vec![10, 9, 11], vec![5, 6]), ()),
    ])?;
    Ok(collate_samples(samples)?.0)
}

#[test]
fn model_wrapper_filters_arguments() -> anyhow::Result<()> {
    let vs = nn::VarStore::new(Device::Cpu);
    let model = TinyTransformer::new(&vs, vec![INPUT_IDS, TOKEN_TYPE_IDS, ATTENTION_MASK], false);
    let wrapper = ModelWrapper::new(&model);

    let logits = wrapper.forward_t(&batch(ModelType::Bert, Task::Generic)?, false)?;
    assert_eq!(logits.size(), vec![2, 2]);

    let error = wrapper.forward_t(&batch(ModelType::DistilBert, Task::Generic)?, false);
    assert!(matches!(error, Err(AdapterError::MissingArgument(_))));

    let vs = nn::VarStore::new(Device::Cpu);
    let model = TinyTransformer::new(&vs, vec![INPUT_IDS, ATTENTION_MASK], false);
    let wrapper = ModelWrapper::new(&model);
    let logits = wrapper.forward_t(&batch(ModelType::DistilBert, Task::Generic)?, false)?;
    assert_eq!(logits.size(), vec![2, 2]);
    Ok(())
}

#[test]
fn question_answering_wrapper_and_loss() -> anyhow::Result<()> {
    let vs = nn::VarStore::new(Device::Cpu);
    let model = TinyTransformer::new(&vs, vec![INPUT_IDS, ATTENTION_MASK], true);
    let wrapper = QuestionAnsweringModelWrapper::new(&model);

    let outputs = wrapper.forward_t(&batch(ModelType::Bert, Task::QuestionAnswering)?, false)?;
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].size(), vec![2, 12]);
    assert_eq!(outputs[1].size(), vec![2, 12]);

    let targets = [Tensor::from_slice(&[7i64, 5]), Tensor::from_slice(&[8i64, 6])];
    let loss = MultiTargetLoss::default().forward(&outputs, &targets)?;
    assert!(loss.double_value(&[]).is_finite());

    let loss_fn = MultiTargetLoss::new(
        vec![LossSlot::cross_entropy(), LossSlot::cross_entropy().with_weight(2.0)],
        LossReduction::Mean,
    )?;
    let weighted = loss_fn.forward(&outputs, &targets)?;
    let l0 = outputs[0].cross_entropy_for_logits(&targets[0]).double_value(&[]);
    let l1 = outputs[1].cross_entropy_for_logits(&targets[1]).double_value(&[]);
    assert!((weighted.double_value(&[]) - (l0 + 2.0 * l1)).abs() < 1e-4);
    Ok(())
}

#[test]
fn learner_reduces_generic_loss() -> anyhow::Result<()> {
    tch::manual_seed(42);
    let vs = nn::VarStore::new(Device::Cpu);
    let model = TinyTransformer::new(&vs, vec![INPUT_IDS, TOKEN_TYPE_IDS, ATTENTION_MASK], false);
    let loss_fn = MultiTargetLoss::new(vec![LossSlot::cross_entropy()], LossReduction::Mean)?;
    let mut learner =
        Learner::new(&model, loss_fn).with_callback(TransformerInputCallback::new(Task::Generic));
    let mut optimizer = nn::Adam::default().build(&vs, 1e-2)?;
    let xb = batch(ModelType::Bert, Task::Generic)?;
    let targets = [Tensor::from_slice(&[1i64, 0])];

    let initial_loss = learner.validate_batch(xb.shallow_clone(), &targets)?;
    for _ in 0..50 {
        learner.train_batch(xb.shallow_clone(), &targets, &mut optimizer)?;
    }
    let final_loss = learner.validate_batch(xb.shallow_clone(), &targets)?;
    assert!(final_loss < initial_loss);

    let predictions = learner.predict_batch(xb)?;
    assert_eq!(predictions.activations.len(), 1);
    assert_eq!(predictions.activations[0].size(), vec![2, 2]);
    assert_eq!(predictions.decoded[0].size(), vec![2]);
    Ok(())
}

#[test]
fn learner_rejects_unreduced_training_loss() -> anyhow::Result<()> {
    let vs = nn::VarStore::new(Device::Cpu);
    let model = TinyTransformer::new(&vs, vec![INPUT_IDS, TOKEN_TYPE_IDS, ATTENTION_MASK], false);
    let loss_fn = MultiTargetLoss::new(vec![LossSlot::cross_entropy()], LossReduction::None)?;
    let mut learner =
        Learner::new(&model, loss_fn).with_callback(TransformerInputCallback::new(Task::Generic));
    let mut optimizer = nn::Sgd::default().build(&vs, 1e-2)?;
    let xb = batch(ModelType::Bert, Task::Generic)?;
    let targets = [Tensor::from_slice(&[1i64, 0])];

    let result = learner.train_batch(xb, &targets, &mut optimizer);
    assert!(matches!(
        result,
        Err(AdapterError::InvalidConfigurationError(_))
    ));
    Ok(())
}

#[test]
fn learner_without_callback_forwards_present_inputs() -> anyhow::Result<()> {
    let vs = nn::VarStore::new(Device::Cpu);
    let model = TinyTransformer::new(&vs, vec![INPUT_IDS, TOKEN_TYPE_IDS], true);
    let mut learner = Learner::new(&model, MultiTargetLoss::default());

    let predictions = learner.predict_batch(batch(ModelType::Bert, Task::QuestionAnswering)?)?;
    assert_eq!(predictions.decoded.len(), 2);
    assert_eq!(predictions.decoded[0].size(), vec![2]);

    let error = learner.predict_batch(batch(ModelType::DistilBert, Task::QuestionAnswering)?);
    assert!(matches!(error, Err(AdapterError::MissingArgument(_))));
    Ok(())
}

#[test]
fn parameter_groups_split_body_children() -> anyhow::Result<()> {
    let vs = nn::VarStore::new(Device::Cpu);
    let _model = TinyTransformer::new(&vs, vec![INPUT_IDS], false);

    let groups = split_var_store(&vs, "body")?;
    let names: Vec<Vec<String>> = groups
        .into_iter()
        .map(|group| group.into_iter().map(|(name, _)| name).collect())
        .collect();

    assert_eq!(
        names,
        vec![
            vec!["body.token_type_embeddings.weight".to_string()],
            vec!["body.word_embeddings.weight".to_string()],
            vec!["head.bias".to_string(), "head.weight".to_string()],
        ]
    );
    Ok(())
}
