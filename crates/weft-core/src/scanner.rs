//! Tag scanner
//!
//! Locates the first tag in a node's template text and splits the text
//! into leading output, the tag expression, and the unparsed remainder.
//! Comment tags are elided here and never produce a tag node.

use crate::config::EngineConfig;
use crate::error::{WeftError, WeftResult};

/// Result of scanning one node's template text
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// No tag found: the whole remainder is terminal output
    Text(String),
    /// Comment tag: `prefix` is output, parsing resumes at `rest`
    Comment { prefix: String, rest: String },
    /// Active tag with its trimmed expression and the text after the close delimiter
    Tag {
        prefix: String,
        expression: String,
        rest: String,
    },
}

/// Scan a template for its first tag
pub fn scan(template: &str, config: &EngineConfig) -> WeftResult<ScanOutcome> {
    let Some(open_pos) = template.find(&config.tag_open) else {
        return Ok(ScanOutcome::Text(template.to_string()));
    };

    let prefix = template[..open_pos].to_string();
    let after_open = open_pos + config.tag_open.len();

    if template[open_pos..].starts_with(&config.comment_open()) {
        let comment_close = config.comment_close();
        // The opening marker itself ends in the comment char, so an empty
        // comment still matches when searching from the open delimiter.
        let Some(close_rel) = template[after_open..].find(&comment_close) else {
            return Err(WeftError::parse(format!(
                "unterminated comment near \"{}\"",
                snippet(&template[open_pos..])
            )));
        };
        let rest = template[after_open + close_rel + comment_close.len()..].to_string();
        return Ok(ScanOutcome::Comment { prefix, rest });
    }

    let Some(close_rel) = template[after_open..].find(&config.tag_close) else {
        return Err(WeftError::parse(format!(
            "unclosed tag near \"{}\"",
            snippet(&template[open_pos..])
        )));
    };
    let expression = template[after_open..after_open + close_rel].trim().to_string();
    let rest = template[after_open + close_rel + config.tag_close.len()..].to_string();

    Ok(ScanOutcome::Tag {
        prefix,
        expression,
        rest,
    })
}

/// First few characters of a fragment, for error messages
fn snippet(text: &str) -> &str {
    match text.char_indices().nth(40) {
        Some((pos, _)) => &text[..pos],
        None => text,
    }
}
