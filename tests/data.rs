extern crate anyhow;

use std::convert::TryFrom;
use std::io::Write;
use std::sync::Arc;
use tch::Tensor;
use tempfile::NamedTempFile;
use transformer_adapters::data::{
    collate_samples, show_batch, show_results, BatchTransform, BatchTransformConfig, HubTokenizer,
    ModelType, PaddingSide, Sample, SampleText, TabularData, Task, TextBlock, TokenizerAdapter,
    TokenizerConfig, TokenizerOption, TransformerTokenizer, TruncationStrategy,
    ABSENT_FIELD_SENTINEL,
};
use transformer_adapters::resources::{LocalResource, ResourceProvider};
use transformer_adapters::AdapterError;

const VOCAB: [&str; 13] = [
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "hello", "world", "the", "answer", "is", "what",
    "?", "here",
];

fn vocab_file() -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    for token in VOCAB.iter() {
        writeln!(file, "{}", token)?;
    }
    file.flush()?;
    Ok(file)
}

fn tokenizer(model_type: ModelType, vocab: &NamedTempFile) -> anyhow::Result<TransformerTokenizer> {
    Ok(TransformerTokenizer::from_file(
        &TokenizerConfig::new(model_type, true),
        vocab.path(),
        None,
    )?)
}

fn values(tensor: &Tensor) -> anyhow::Result<Vec<i64>> {
    Ok(Vec::<i64>::try_from(&tensor.flatten(0, -1))?)
}

#[test]
fn tokenizer_adapter_preserves_items() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = tokenizer(ModelType::Bert, &vocab)?;
    let adapter = TokenizerAdapter::new(&tokenizer);

    let tokens: Vec<Vec<String>> = adapter
        .tokenize_items(vec!["Hello world", "", "What is the answer?"])
        .collect();

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0], vec!["hello", "world"]);
    assert!(tokens[1].is_empty());
    assert_eq!(tokens[2], vec!["what", "is", "the", "answer", "?"]);
    assert_eq!(
        tokenizer.convert_tokens_to_ids(&tokens[2]),
        vec![10, 9, 7, 8, 11]
    );
    Ok(())
}

#[test]
fn tokenizer_from_local_resource() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let resource = LocalResource::from(vocab.path().to_path_buf());
    assert_eq!(resource.get_local_path()?, vocab.path().to_path_buf());

    let tokenizer = TransformerTokenizer::from_resources(
        &TokenizerConfig::new(ModelType::Bert, true),
        &resource,
        None,
    )?;

    assert_eq!(tokenizer.pad_token_id(), 0);
    assert_eq!(tokenizer.get_vocab().len(), VOCAB.len());
    assert_eq!(tokenizer.padding_side(), PaddingSide::Right);
    Ok(())
}

#[test]
fn generic_input_is_padded() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = tokenizer(ModelType::Bert, &vocab)?;

    let input = Task::Generic.build_input(&tokenizer, &[5, 6], None, 5, true, None)?;

    assert_eq!(values(&input.input_ids)?, vec![2, 5, 6, 3, 0]);
    assert_eq!(values(&input.token_type_ids)?, vec![0, 0, 0, 0, 0]);
    assert_eq!(values(&input.attention_mask)?, vec![1, 1, 1, 1, 0]);
    assert_eq!(tokenizer.decode(&values(&input.input_ids)?, true), "hello world");
    Ok(())
}

#[test]
fn missing_token_type_ids_use_sentinel() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = tokenizer(ModelType::DistilBert, &vocab)?;

    let input = Task::Generic.build_input(&tokenizer, &[5, 6], None, 8, true, None)?;

    assert_eq!(values(&input.token_type_ids)?, vec![ABSENT_FIELD_SENTINEL]);
    assert!(input.token_type_ids().is_none());
    assert_eq!(values(&input.input_ids)?.len(), 8);
    assert!(input.attention_mask().is_some());
    Ok(())
}

#[test]
fn overflow_without_truncation_is_an_error() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = tokenizer(ModelType::Bert, &vocab)?;
    let token_ids = [5, 6, 7, 8, 9, 12];

    let result = Task::Generic.build_input(
        &tokenizer,
        &token_ids,
        None,
        5,
        true,
        Some(TruncationStrategy::DoNotTruncate),
    );
    assert!(matches!(result, Err(AdapterError::SequenceOverflow(8, 5))));

    let input = Task::Generic.build_input(&tokenizer, &token_ids, None, 5, true, None)?;
    assert_eq!(values(&input.input_ids)?, vec![2, 5, 6, 7, 3]);
    Ok(())
}

#[test]
fn question_answering_follows_padding_side() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let question = [10, 9, 7, 8, 11];
    let context = [12, 9, 7, 8];

    let right = tokenizer(ModelType::Bert, &vocab)?;
    let input =
        Task::QuestionAnswering.build_input(&right, &question, Some(&context[..]), 14, true, None)?;
    assert_eq!(
        values(&input.input_ids)?,
        vec![2, 10, 9, 7, 8, 11, 3, 12, 9, 7, 8, 3, 0, 0]
    );
    assert_eq!(
        values(&input.token_type_ids)?,
        vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 0, 0]
    );

    let left = tokenizer(ModelType::Bert, &vocab)?.with_padding_side(PaddingSide::Left);
    let input =
        Task::QuestionAnswering.build_input(&left, &question, Some(&context[..]), 14, true, None)?;
    assert_eq!(
        values(&input.input_ids)?,
        vec![0, 0, 2, 12, 9, 7, 8, 3, 10, 9, 7, 8, 11, 3]
    );
    assert_eq!(
        values(&input.attention_mask)?,
        vec![0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]
    );
    Ok(())
}

#[test]
fn question_answering_truncates_context() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = tokenizer(ModelType::Bert, &vocab)?;

    let input = Task::QuestionAnswering.build_input(
        &tokenizer,
        &[10, 9, 7, 8, 11],
        Some(&[12, 9, 7, 8][..]),
        10,
        true,
        None,
    )?;

    assert_eq!(
        values(&input.input_ids)?,
        vec![2, 10, 9, 7, 8, 11, 3, 12, 9, 3]
    );
    Ok(())
}

#[test]
fn batch_transform_keeps_order_and_targets() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = Arc::new(tokenizer(ModelType::Bert, &vocab)?);
    let batch_transform = BatchTransform::new(
        tokenizer,
        BatchTransformConfig {
            max_seq_len: 8,
            truncation_strategy: None,
            task: Task::Generic,
        },
    );

    let batch = batch_transform.encodes(vec![
        Sample::new(SampleText::Pair(vec![10, 9], vec![12]), 5i64),
        Sample::new(SampleText::Single(vec![5, 6]), 3i64),
    ])?;

    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].targets, 5);
    assert_eq!(
        values(&batch[0].input.input_ids)?,
        vec![2, 10, 9, 3, 12, 3, 0, 0]
    );
    assert_eq!(batch[1].targets, 3);
    assert_eq!(values(&batch[1].input.input_ids)?, vec![2, 5, 6, 3, 0, 0, 0, 0]);

    let (input, targets) = collate_samples(batch)?;
    assert_eq!(input.input_ids.size(), vec![2, 8]);
    assert_eq!(input.attention_mask.size(), vec![2, 8]);
    assert_eq!(targets, vec![5, 3]);
    Ok(())
}

#[test]
fn text_block_from_csv() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = Arc::new(tokenizer(ModelType::Bert, &vocab)?);
    let data = TabularData::from_reader(
        "question,context,label\nwhat is,the answer,1\nwhat,hello world here is,0\n".as_bytes(),
    )?;
    let labels: Vec<i64> = data.parse_column("label")?;

    let block = TextBlock::from_columns(
        &[vec!["question"], vec!["context"]],
        tokenizer,
        Task::Generic,
        None,
        None,
        None,
        16,
    )?;
    assert_eq!(block.tok_tfms()[1].res_col_name(), "text1");

    let samples = block.samples(&data, labels)?;
    assert_eq!(
        samples[0].text,
        SampleText::Pair(vec![10, 9], vec![7, 8])
    );
    assert_eq!(samples[1].text, SampleText::Pair(vec![10], vec![5, 6, 12, 9]));

    let batches = block.dataloader(1).batches(samples)?;
    assert_eq!(batches.len(), 2);
    // longest sample first
    assert_eq!(batches[0][0].targets, 0);
    assert_eq!(batches[1][0].targets, 1);

    let (input, targets) = collate_samples(batches.into_iter().flatten().collect())?;
    let preview = show_batch(block.tokenizer(), &input.input_ids, &targets, 1)?;
    assert_eq!(preview.columns, vec!["text", "target"]);
    assert_eq!(preview.rows, vec![vec!["what hello world here is", "0"]]);
    Ok(())
}

#[test]
fn text_block_joins_text_columns() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = Arc::new(tokenizer(ModelType::Bert, &vocab)?);
    let data = TabularData::from_reader("title,body\nhello,world\n".as_bytes())?;

    let block = TextBlock::from_columns(
        &[vec!["title", "body"]],
        tokenizer,
        Task::Generic,
        Some(vec!["text".to_string()]),
        None,
        None,
        16,
    )?;

    assert_eq!(
        block.encode_texts(&data)?,
        vec![SampleText::Single(vec![5, 6])]
    );
    assert!(matches!(
        TextBlock::from_columns(
            &[vec!["title"], vec!["body"], vec!["title"]],
            Arc::new(self::tokenizer(ModelType::Bert, &vocab)?),
            Task::Generic,
            None,
            None,
            None,
            16,
        ),
        Err(AdapterError::InvalidConfigurationError(_))
    ));
    Ok(())
}

#[test]
fn show_results_appends_prediction_columns() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = tokenizer(ModelType::Bert, &vocab)?;
    let input_ids = Tensor::from_slice(&[2i64, 5, 6, 3, 2, 10, 9, 3]).view([2, 4]);
    let targets = [1i64, 0];

    let preview = show_results(
        &tokenizer,
        &input_ids,
        &targets,
        &[Tensor::from_slice(&[1i64, 0])],
        4,
    )?;
    assert_eq!(preview.columns, vec!["text", "target", "prediction"]);
    assert_eq!(
        preview.rows,
        vec![vec!["hello world", "1", "1"], vec!["what is", "0", "0"]]
    );

    let probabilities = Tensor::from_slice(&[0.25f64, 0.75, 0.5, 0.5]).view([2, 2]);
    let preview = show_results(
        &tokenizer,
        &input_ids,
        &targets,
        &[Tensor::from_slice(&[1i64, 0]), probabilities],
        4,
    )?;
    assert_eq!(
        preview.columns,
        vec!["text", "target", "prediction1", "prediction2"]
    );
    assert_eq!(preview.rows[0][3], "[0.2500, 0.7500]");
    assert_eq!(preview.rows[1][3], "[0.5000, 0.5000]");
    Ok(())
}

#[test]
fn previews_reject_short_tensors() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = tokenizer(ModelType::Bert, &vocab)?;
    let input_ids = Tensor::from_slice(&[2i64, 5, 6, 3, 2, 10, 9, 3]).view([2, 4]);
    let short_predictions = [Tensor::from_slice(&[1i64])];

    let result = show_results(&tokenizer, &input_ids, &[1i64, 0], &short_predictions, 4);
    assert!(matches!(result, Err(AdapterError::ValueError(_))));

    let preview = show_results(&tokenizer, &input_ids, &[1i64, 0], &short_predictions, 1)?;
    assert_eq!(preview.rows, vec![vec!["hello world", "1", "1"]]);

    let result = show_batch(&tokenizer, &Tensor::from(3i64), &[1i64], 4);
    assert!(matches!(result, Err(AdapterError::ValueError(_))));
    Ok(())
}

#[test]
fn roberta_tokenizer_requires_merges() -> anyhow::Result<()> {
    let mut vocab = NamedTempFile::new()?;
    write!(
        vocab,
        r#"{{"<s>": 0, "<pad>": 1, "</s>": 2, "<unk>": 3, "<mask>": 4, "hello": 5, "world": 6}}"#
    )?;
    vocab.flush()?;
    let mut merges = NamedTempFile::new()?;
    writeln!(merges, "#version: 0.2")?;
    for pair in ["h e", "l l", "he ll", "hell o"].iter() {
        writeln!(merges, "{}", pair)?;
    }
    merges.flush()?;
    let config = TokenizerConfig::new(ModelType::Roberta, false);

    let missing_merges = TransformerTokenizer::from_file(&config, vocab.path(), None);
    assert!(matches!(
        missing_merges,
        Err(AdapterError::InvalidConfigurationError(_))
    ));

    let tokenizer = TransformerTokenizer::from_file(&config, vocab.path(), Some(merges.path()))?;
    assert_eq!(tokenizer.pad_token_id(), 1);
    assert_eq!(
        tokenizer.convert_tokens_to_ids(&tokenizer.tokenize("hello")),
        vec![5]
    );

    let encoded = tokenizer.prepare_for_model(
        &[5],
        Some(&[6][..]),
        8,
        true,
        TruncationStrategy::LongestFirst,
    )?;
    assert_eq!(encoded.input_ids, vec![0, 5, 2, 2, 6, 2, 1, 1]);
    assert!(encoded.token_type_ids.is_none());
    assert_eq!(encoded.attention_mask, Some(vec![1, 1, 1, 1, 1, 1, 0, 0]));
    Ok(())
}

#[test]
fn options_not_supported_by_the_architecture_are_rejected() -> anyhow::Result<()> {
    let vocab = vocab_file()?;

    let mut config = TokenizerConfig::new(ModelType::Bert, true);
    config.add_prefix_space = Some(true);
    assert!(matches!(
        TransformerTokenizer::from_file(&config, vocab.path(), None),
        Err(AdapterError::InvalidConfigurationError(_))
    ));

    let mut config = TokenizerConfig::new(ModelType::Roberta, false);
    config.strip_accents = Some(true);
    assert!(matches!(
        TransformerTokenizer::from_file(&config, vocab.path(), Some(vocab.path())),
        Err(AdapterError::InvalidConfigurationError(_))
    ));
    Ok(())
}

#[test]
fn xlnet_conventions_pad_left() -> anyhow::Result<()> {
    let mut vocab = vocab_file()?;
    writeln!(vocab, "<pad>")?;
    vocab.flush()?;
    let backend =
        TokenizerOption::from_file(ModelType::Bert, vocab.path(), None, true, None, None)?;
    let tokenizer = TransformerTokenizer::new(backend, ModelType::XLNet)?;
    assert_eq!(tokenizer.padding_side(), PaddingSide::Left);
    assert_eq!(tokenizer.pad_token_id(), 13);

    let encoded =
        tokenizer.prepare_for_model(&[5, 6], None, 6, true, TruncationStrategy::LongestFirst)?;
    assert_eq!(encoded.input_ids, vec![13, 13, 2, 5, 6, 3]);
    assert_eq!(encoded.token_type_ids, Some(vec![3, 3, 0, 0, 0, 0]));
    assert_eq!(encoded.attention_mask, Some(vec![0, 0, 1, 1, 1, 1]));
    Ok(())
}

#[test]
fn question_answering_truncation_can_be_longest_first() -> anyhow::Result<()> {
    let vocab = vocab_file()?;
    let tokenizer = Arc::new(tokenizer(ModelType::Bert, &vocab)?);
    let sample = || Sample::new(SampleText::Pair(vec![10, 9, 7, 8, 11], vec![12, 9, 7, 8]), ());
    let encode = |truncation_strategy: Option<TruncationStrategy>| -> anyhow::Result<Vec<i64>> {
        let batch_transform = BatchTransform::new(
            tokenizer.clone(),
            BatchTransformConfig {
                max_seq_len: 10,
                truncation_strategy,
                task: Task::QuestionAnswering,
            },
        );
        values(&batch_transform.encodes(vec![sample()])?[0].input.input_ids)
    };

    assert_eq!(encode(None)?, vec![2, 10, 9, 7, 8, 11, 3, 12, 9, 3]);
    assert_eq!(
        encode(Some(TruncationStrategy::LongestFirst))?,
        vec![2, 10, 9, 7, 3, 12, 9, 7, 8, 3]
    );
    Ok(())
}
