//! Engine configuration
//!
//! All knobs are fixed at engine construction and threaded explicitly
//! through every component. There is no ambient/global configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Character encoding of template source files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceEncoding {
    /// Strict UTF-8; invalid bytes are a load error
    #[default]
    Utf8,
    /// UTF-8 with invalid sequences replaced by U+FFFD
    Utf8Lossy,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Strict mode: missing parameters and evaluation failures are fatal
    pub strict: bool,
    /// Root directory for template and include resolution
    pub template_dir: PathBuf,
    /// Source file encoding
    pub encoding: SourceEncoding,
    /// Tag start delimiter
    pub tag_open: String,
    /// Tag end delimiter
    pub tag_close: String,
    /// Comment marker, relative to the tag delimiters
    pub comment_char: char,
    /// Nested-interpolation start marker
    pub interp_open: String,
    /// Nested-interpolation end marker
    pub interp_close: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict: false,
            template_dir: PathBuf::from("."),
            encoding: SourceEncoding::Utf8,
            tag_open: "[%".to_string(),
            tag_close: "%]".to_string(),
            comment_char: '#',
            interp_open: "${".to_string(),
            interp_close: "}".to_string(),
        }
    }
}

impl EngineConfig {
    /// Configuration with strict mode enabled
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Comment open marker, e.g. `[%#`
    pub fn comment_open(&self) -> String {
        format!("{}{}", self.tag_open, self.comment_char)
    }

    /// Comment close marker, e.g. `#%]`
    pub fn comment_close(&self) -> String {
        format!("{}{}", self.comment_char, self.tag_close)
    }

    /// Block start marker for a keyword, e.g. `[% IF ` (trailing space intended)
    pub fn block_start(&self, keyword: &str) -> String {
        format!("{} {} ", self.tag_open, keyword)
    }

    /// Block end marker for a keyword, e.g. `[% /IF %]`
    pub fn block_end(&self, keyword: &str) -> String {
        format!("{} /{} {}", self.tag_open, keyword, self.tag_close)
    }

    /// Same-level else marker, e.g. `[% ELSE %]`
    pub fn else_marker(&self) -> String {
        format!("{} ELSE {}", self.tag_open, self.tag_close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_markers() {
        let config = EngineConfig::default();
        assert_eq!(config.comment_open(), "[%#");
        assert_eq!(config.comment_close(), "#%]");
        assert_eq!(config.block_start("IF"), "[% IF ");
        assert_eq!(config.block_end("FOR"), "[% /FOR %]");
        assert_eq!(config.else_marker(), "[% ELSE %]");
    }

    #[test]
    fn custom_delimiters() {
        let config = EngineConfig {
            tag_open: "{{".to_string(),
            tag_close: "}}".to_string(),
            ..EngineConfig::default()
        };
        assert_eq!(config.block_end("IF"), "{{ /IF }}");
        assert_eq!(config.comment_open(), "{{#");
    }
}
