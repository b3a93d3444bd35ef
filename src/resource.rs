//! Resource indirection: expressions stored outside the source text

use crate::error::{Result, SimpleError};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

/// Prefix marking a source as a reference to a file holding the expression
pub const FILE_RESOURCE_PREFIX: &str = "resource:file:";

/// Replaces a source with the expression it refers to before compiling
pub trait ResourceLoader: Send + Sync + fmt::Debug {
    /// Return the expression text for `source`, borrowing it unchanged when it
    /// is not a resource reference
    fn resolve<'a>(&self, source: &'a str) -> Result<Cow<'a, str>>;
}

/// Loader that never replaces anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResourceLoader;

impl ResourceLoader for NoopResourceLoader {
    fn resolve<'a>(&self, source: &'a str) -> Result<Cow<'a, str>> {
        Ok(Cow::Borrowed(source))
    }
}

/// Loads `resource:file:<path>` sources from the file system.
///
/// Relative paths are taken from the base directory when one is set.
/// Trailing line breaks in the file are dropped.
#[derive(Debug, Clone, Default)]
pub struct FileResourceLoader {
    base_dir: Option<PathBuf>,
}

impl FileResourceLoader {
    /// Create a loader resolving paths against the working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader resolving relative paths against `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }
}

impl ResourceLoader for FileResourceLoader {
    fn resolve<'a>(&self, source: &'a str) -> Result<Cow<'a, str>> {
        let Some(path) = source.trim().strip_prefix(FILE_RESOURCE_PREFIX) else {
            return Ok(Cow::Borrowed(source));
        };
        let path = PathBuf::from(path.trim());
        let full_path = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(&path),
            _ => path,
        };
        log::debug!("Loading expression from {}", full_path.display());

        let text = std::fs::read_to_string(&full_path).map_err(|e| SimpleError::Resource {
            resource: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Cow::Owned(text.trim_end_matches(['\r', '\n']).to_string()))
    }
}
