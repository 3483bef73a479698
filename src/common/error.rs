use rust_tokenizers::error::TokenizerError;
use tch::TchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Endpoint not available error: {0}")]
    FileDownloadError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Tch tensor error: {0}")]
    TchError(String),

    #[error("Tokenizer error: {0}")]
    TokenizerError(String),

    #[error("Invalid configuration error: {0}")]
    InvalidConfigurationError(String),

    #[error("Value error: {0}")]
    ValueError(String),

    #[error("Sequence overflow: {0} tokens exceed the maximum length of {1} and truncation is disabled")]
    SequenceOverflow(usize, usize),

    #[error("Missing model argument: {0}")]
    MissingArgument(String),
}

#[cfg(feature = "remote")]
impl From<cached_path::Error> for AdapterError {
    fn from(error: cached_path::Error) -> Self {
        AdapterError::FileDownloadError(error.to_string())
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(error: std::io::Error) -> Self {
        AdapterError::IOError(error.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(error: serde_json::Error) -> Self {
        AdapterError::InvalidConfigurationError(error.to_string())
    }
}

impl From<csv::Error> for AdapterError {
    fn from(error: csv::Error) -> Self {
        AdapterError::IOError(error.to_string())
    }
}

impl From<TokenizerError> for AdapterError {
    fn from(error: TokenizerError) -> Self {
        AdapterError::TokenizerError(error.to_string())
    }
}

impl From<TchError> for AdapterError {
    fn from(error: TchError) -> Self {
        AdapterError::TchError(error.to_string())
    }
}
