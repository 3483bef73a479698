//! # Resource definitions for tokenizer vocabularies, merges and adapter configuration files
//!
//! Pretrained tokenizers are loaded from files that either live on the local file system or are
//! downloaded from the model hub. Two types of resources are pre-defined:
//! - LocalResource: points to a local file
//! - RemoteResource: points to a remote file via a URL (requires the `remote` feature)
//!
//! For both types of resources, the local location of the file can be retrieved using
//! `get_local_path`, allowing to reference the resource file location regardless if it is a remote
//! or local resource. Default `RemoteResource`s for common vocabularies are available in
//! `data::tokenizer`.

mod local;

use crate::common::error::AdapterError;
pub use local::LocalResource;
use std::path::PathBuf;

/// # Resource Trait that can provide the location of a vocabulary, merges or configuration file
pub trait ResourceProvider {
    /// Provides the local path for a resource.
    ///
    /// # Returns
    ///
    /// * `PathBuf` pointing to the resource file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use transformer_adapters::resources::{LocalResource, ResourceProvider};
    /// use std::path::PathBuf;
    /// let vocab_resource = LocalResource {
    ///     local_path: PathBuf::from("path/to/vocab.txt"),
    /// };
    /// let vocab_path = vocab_resource.get_local_path();
    /// ```
    fn get_local_path(&self) -> Result<PathBuf, AdapterError>;
}

impl<T: ResourceProvider + ?Sized> ResourceProvider for Box<T> {
    fn get_local_path(&self) -> Result<PathBuf, AdapterError> {
        T::get_local_path(self)
    }
}

#[cfg(feature = "remote")]
mod remote;
#[cfg(feature = "remote")]
pub use remote::RemoteResource;
