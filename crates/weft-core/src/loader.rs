//! Template source retrieval
//!
//! The engine never touches the filesystem directly; it asks a
//! [`TemplateLoader`] for raw text by name. [`FsLoader`] is the standard
//! implementation reading below a configured root directory;
//! [`MapLoader`] serves templates from memory for tests and embedding.

use crate::config::SourceEncoding;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading template source text
#[derive(Debug, Error)]
pub enum LoadError {
    /// No template is registered or stored under the given name
    #[error("template \"{0}\" not found")]
    NotFound(String),

    /// Underlying IO failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Source bytes did not match the configured encoding
    #[error("template \"{name}\" is not valid {encoding}")]
    Decode { name: String, encoding: String },
}

/// Collaborator supplying raw template text by name
#[async_trait]
pub trait TemplateLoader: Send + Sync {
    /// Load the source text for `name`
    async fn load(&self, name: &str) -> Result<String, LoadError>;
}

/// Filesystem loader rooted at a directory
pub struct FsLoader {
    root: PathBuf,
    encoding: SourceEncoding,
}

impl FsLoader {
    /// Create a loader reading UTF-8 files below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            encoding: SourceEncoding::Utf8,
        }
    }

    /// Create a loader with an explicit source encoding
    pub fn with_encoding(root: impl Into<PathBuf>, encoding: SourceEncoding) -> Self {
        Self {
            root: root.into(),
            encoding,
        }
    }

    /// The configured root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl TemplateLoader for FsLoader {
    async fn load(&self, name: &str) -> Result<String, LoadError> {
        let path = self.root.join(name);
        tracing::debug!(path = %path.display(), "loading template");
        let bytes = tokio::fs::read(&path).await?;
        match self.encoding {
            SourceEncoding::Utf8 => String::from_utf8(bytes).map_err(|_| LoadError::Decode {
                name: name.to_string(),
                encoding: "utf-8".to_string(),
            }),
            SourceEncoding::Utf8Lossy => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

/// In-memory loader keyed by template name
#[derive(Default, Clone)]
pub struct MapLoader {
    templates: HashMap<String, String>,
}

impl MapLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a template under a name
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    /// Builder-style variant of [`MapLoader::insert`]
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }
}

#[async_trait]
impl TemplateLoader for MapLoader {
    async fn load(&self, name: &str) -> Result<String, LoadError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_loader_reads_below_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.tpl"), "hello").unwrap();

        let loader = FsLoader::new(dir.path());
        assert_eq!(loader.load("page.tpl").await.unwrap(), "hello");
        assert!(loader.load("missing.tpl").await.is_err());
    }

    #[tokio::test]
    async fn fs_loader_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.tpl"), [0xff, 0xfe, 0x00]).unwrap();

        let strict = FsLoader::new(dir.path());
        assert!(matches!(
            strict.load("bad.tpl").await,
            Err(LoadError::Decode { .. })
        ));

        let lossy = FsLoader::with_encoding(dir.path(), SourceEncoding::Utf8Lossy);
        assert!(lossy.load("bad.tpl").await.is_ok());
    }

    #[tokio::test]
    async fn map_loader_round_trip() {
        let loader = MapLoader::new().with("a.tpl", "A");
        assert_eq!(loader.load("a.tpl").await.unwrap(), "A");
        assert!(matches!(
            loader.load("b.tpl").await,
            Err(LoadError::NotFound(_))
        ));
    }
}
