//! Block matching for conditional and loop tags
//!
//! Finds the close tag that matches an already-consumed block open tag,
//! respecting nesting of the same kind. Each kind scans only for its own
//! markers, so blocks of a different kind are inert text to the scan and
//! mixed nesting (a loop inside a conditional inside a loop) just works.

use crate::config::EngineConfig;
use crate::error::{WeftError, WeftResult};

/// Upper bound on nested-scan iterations before giving up
pub const MAX_BLOCK_SCAN: usize = 100;

/// Locate the close tag matching a block open tag
///
/// `rest` is the template text immediately after the open tag. Returns the
/// block body and the text following the matched close tag.
pub fn match_block(
    rest: &str,
    keyword: &str,
    expression: &str,
    config: &EngineConfig,
) -> WeftResult<(String, String)> {
    let start_marker = config.block_start(keyword);
    let end_marker = config.block_end(keyword);

    let mut remaining = rest;
    let mut nest = 0usize;
    let mut end_pos = 0usize;
    let mut tries = 0usize;

    loop {
        tries += 1;
        if tries > MAX_BLOCK_SCAN {
            return Err(WeftError::parse(format!(
                "\"{expression}\" close tag search exceeded {MAX_BLOCK_SCAN} iterations"
            )));
        }

        let close = remaining.find(&end_marker);
        let open = remaining.find(&start_marker);
        match (close, open) {
            (None, _) => {
                return Err(WeftError::parse(format!(
                    "\"{expression}\" close tag not found"
                )));
            }
            (Some(close_pos), open) if open.is_none() || close_pos <= open.unwrap_or(0) => {
                if nest == 0 {
                    end_pos += close_pos;
                    break;
                }
                nest -= 1;
                let consumed = close_pos + end_marker.len();
                end_pos += consumed;
                remaining = &remaining[consumed..];
            }
            (Some(_), Some(open_pos)) => {
                nest += 1;
                let consumed = open_pos + start_marker.len();
                end_pos += consumed;
                remaining = &remaining[consumed..];
            }
            // `open.is_none()` satisfies the guard above, so this can't happen.
            (Some(_), None) => unreachable!(),
        }
    }

    let body = rest[..end_pos].to_string();
    let after = rest[end_pos + end_marker.len()..].to_string();
    Ok((body, after))
}

/// Split a conditional block body at its same-level `ELSE` marker
///
/// Else markers belonging to nested conditionals are skipped by jumping
/// past each nested close tag. Without a same-level else the whole body is
/// the true branch.
pub fn split_else(body: &str, config: &EngineConfig) -> WeftResult<(String, String)> {
    let else_marker = config.else_marker();
    let start_marker = config.block_start("IF");
    let end_marker = config.block_end("IF");

    let Some(mut else_rel) = body.find(&else_marker) else {
        return Ok((body.to_string(), String::new()));
    };

    let mut remaining = body;
    let mut offset = 0usize;
    let mut tries = 0usize;

    loop {
        tries += 1;
        if tries > MAX_BLOCK_SCAN {
            return Err(WeftError::parse(format!(
                "else search exceeded {MAX_BLOCK_SCAN} iterations in block \"{}\"",
                snippet(body)
            )));
        }

        // No nested conditional ahead of the marker: this else is ours.
        let open = remaining.find(&start_marker);
        if open.is_none() || else_rel < open.unwrap_or(0) {
            let pos = offset + else_rel;
            let true_branch = body[..pos].to_string();
            let false_branch = body[pos + else_marker.len()..].to_string();
            return Ok((true_branch, false_branch));
        }

        // Skip the nested conditional and search again after its close tag.
        let Some(end) = remaining.find(&end_marker) else {
            return Ok((body.to_string(), String::new()));
        };
        let consumed = end + end_marker.len();
        offset += consumed;
        remaining = &remaining[consumed..];
        match remaining.find(&else_marker) {
            Some(pos) => else_rel = pos,
            None => return Ok((body.to_string(), String::new())),
        }
    }
}

fn snippet(text: &str) -> &str {
    match text.char_indices().nth(40) {
        Some((pos, _)) => &text[..pos],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn simple_block() {
        let rest = "body[% /IF %]after";
        let (body, after) = match_block(rest, "IF", "IF flag", &config()).unwrap();
        assert_eq!(body, "body");
        assert_eq!(after, "after");
    }

    #[test]
    fn empty_block() {
        let (body, after) = match_block("[% /IF %]x", "IF", "IF flag", &config()).unwrap();
        assert_eq!(body, "");
        assert_eq!(after, "x");
    }

    #[test]
    fn nested_same_kind() {
        let rest = "a[% IF inner %]b[% /IF %]c[% /IF %]d";
        let (body, after) = match_block(rest, "IF", "IF outer", &config()).unwrap();
        assert_eq!(body, "a[% IF inner %]b[% /IF %]c");
        assert_eq!(after, "d");
    }

    #[test]
    fn foreign_blocks_are_inert() {
        let rest = "x[% FOR i IN items %]y[% /FOR %]z[% /IF %]w";
        let (body, after) = match_block(rest, "IF", "IF flag", &config()).unwrap();
        assert_eq!(body, "x[% FOR i IN items %]y[% /FOR %]z");
        assert_eq!(after, "w");
    }

    #[test]
    fn missing_close_names_the_tag() {
        let err = match_block("no close here", "FOR", "FOR x IN items", &config()).unwrap_err();
        assert!(err.to_string().contains("FOR x IN items"));
    }

    #[test]
    fn deep_nesting_exceeds_budget() {
        let open = "[% IF x %]".repeat(120);
        let close = "[% /IF %]".repeat(121);
        let rest = format!("{open}{close}");
        let err = match_block(&rest, "IF", "IF x", &config()).unwrap_err();
        assert!(err.to_string().contains("exceeded"));
        assert!(err.to_string().contains("IF x"));
    }

    #[test]
    fn else_split_plain() {
        let (t, f) = split_else("yes[% ELSE %]no", &config()).unwrap();
        assert_eq!(t, "yes");
        assert_eq!(f, "no");
    }

    #[test]
    fn no_else_means_empty_false_branch() {
        let (t, f) = split_else("only true", &config()).unwrap();
        assert_eq!(t, "only true");
        assert_eq!(f, "");
    }

    #[test]
    fn nested_else_belongs_to_inner_conditional() {
        let body = "a[% IF x %]b[% ELSE %]c[% /IF %]d";
        let (t, f) = split_else(body, &config()).unwrap();
        assert_eq!(t, body);
        assert_eq!(f, "");
    }

    #[test]
    fn outer_else_after_nested_conditional() {
        let body = "a[% IF x %]b[% ELSE %]c[% /IF %]d[% ELSE %]e";
        let (t, f) = split_else(body, &config()).unwrap();
        assert_eq!(t, "a[% IF x %]b[% ELSE %]c[% /IF %]d");
        assert_eq!(f, "e");
    }
}
