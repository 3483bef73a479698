use super::*;
use crate::common::error::AdapterError;
use cached_path::{Cache, Options, ProgressBar};
use dirs::cache_dir;
use lazy_static::lazy_static;
use std::path::PathBuf;

/// # Remote resource that will be downloaded and cached locally on demand
#[derive(Debug, PartialEq, Clone)]
pub struct RemoteResource {
    /// Remote path/url for the resource
    pub url: String,
    /// Local subdirectory of the cache root where this resource is saved
    pub cache_subdir: String,
}

impl RemoteResource {
    /// Creates a new RemoteResource from an URL and a cache subdirectory. Note that this does not
    /// download the resource (only declares the remote and local locations)
    ///
    /// # Arguments
    ///
    /// * `url` - `&str` Location of the remote resource
    /// * `cache_subdir` - `&str` Local subdirectory of the cache root to save the resource to
    ///
    /// # Example
    ///
    /// ```no_run
    /// use transformer_adapters::resources::RemoteResource;
    /// let vocab_resource = RemoteResource::new(
    ///     "https://huggingface.co/bert-base-uncased/resolve/main/vocab.txt",
    ///     "bert/vocab",
    /// );
    /// ```
    pub fn new(url: &str, cache_subdir: &str) -> RemoteResource {
        RemoteResource {
            url: url.to_string(),
            cache_subdir: cache_subdir.to_string(),
        }
    }

    /// Creates a new RemoteResource from a (cache subdirectory, URL) pair, as exposed by the
    /// pretrained resource constants.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use transformer_adapters::data::VocabResources;
    /// use transformer_adapters::resources::RemoteResource;
    /// let vocab_resource = RemoteResource::from_pretrained(VocabResources::BERT_BASE_UNCASED);
    /// ```
    pub fn from_pretrained(name_url_tuple: (&str, &str)) -> RemoteResource {
        let cache_subdir = name_url_tuple.0.to_string();
        let url = name_url_tuple.1.to_string();
        RemoteResource { url, cache_subdir }
    }
}

impl ResourceProvider for RemoteResource {
    /// Gets the local path for a remote resource.
    ///
    /// The remote resource is downloaded and cached. Then the path
    /// to the local cache is returned.
    fn get_local_path(&self) -> Result<PathBuf, AdapterError> {
        let cached_path = CACHE
            .cached_path_with_options(&self.url, &Options::default().subdir(&self.cache_subdir))?;
        Ok(cached_path)
    }
}

/// Environment variable overriding the cache location
pub const CACHE_ENV_VAR: &str = "TRANSFORMER_ADAPTERS_CACHE";

lazy_static! {
/// # Global cache directory
/// If the environment variable `TRANSFORMER_ADAPTERS_CACHE` is set, will save the cache files at
/// that location. Otherwise defaults to `$XDG_CACHE_HOME/.transformer_adapters`, or
/// corresponding user cache for the current system.
    pub static ref CACHE: Cache = Cache::builder()
        .dir(_get_cache_directory(std::env::var(CACHE_ENV_VAR).ok()))
        .progress_bar(Some(ProgressBar::Light))
        .build()
        .expect("Unable to create the resource cache directory");
}

fn _get_cache_directory(env_value: Option<String>) -> PathBuf {
    match env_value {
        Some(value) => PathBuf::from(value),
        None => {
            let mut home = cache_dir().unwrap_or_else(std::env::temp_dir);
            home.push(".transformer_adapters");
            home
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cache_directory_is_crate_specific() {
        assert_eq!(
            _get_cache_directory(Some("/tmp/adapters".to_string())),
            PathBuf::from("/tmp/adapters")
        );
        let default = _get_cache_directory(None);
        assert!(default.ends_with(".transformer_adapters"));
        assert!(!default.to_string_lossy().contains("rustbert"));
    }
}
