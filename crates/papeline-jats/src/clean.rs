//! Text cleanup: cross-reference stripping, whitespace normalization, and
//! citation-bracket artifact removal.

use crate::xmltree::{Node, Xml};
use regex::Regex;
use std::sync::LazyLock;

/// Element local names treated as in-text cross-references to strip.
const XREF_NAMES: &[&str] = &["xref", "target", "ref"];

/// Replace every cross-reference element in the tree with a single-space
/// text node, so surrounding words don't get glued together. Run this
/// before extracting any text content meant for human reading (abstract,
/// body paragraphs, figure/table captions).
pub fn strip_xrefs(tree: &mut Xml) {
    for i in 0..tree.arena.len() {
        let children = std::mem::take(&mut tree.arena[i].children);
        let replaced: Vec<Node> = children
            .into_iter()
            .map(|node| match node {
                Node::Element(eid) if XREF_NAMES.contains(&tree.arena[eid].name.as_str()) => {
                    Node::Text(" ".to_string())
                }
                other => other,
            })
            .collect();
        tree.arena[i].children = replaced;
    }
}

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\n\r]+").unwrap());
static EMPTY_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[(]\s*[,;]?\s*[\]\)]").unwrap());
static DANGLING_BRACKET_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[(]\s*([,;])\s*").unwrap());
static SPACE_BEFORE_PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+([,.;:])").unwrap());

/// Collapse whitespace runs to single spaces, drop citation-bracket
/// artifacts left behind by [`strip_xrefs`] (e.g. `"[, ]"`, `"(, )"`), and
/// trim the result.
pub fn normalize_text(raw: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(raw, " ");
    let no_empty_brackets = EMPTY_BRACKETS.replace_all(&collapsed, "");
    let no_dangling = DANGLING_BRACKET_PUNCT.replace_all(&no_empty_brackets, "");
    let no_space_before_punct = SPACE_BEFORE_PUNCT.replace_all(&no_dangling, "$1");
    no_space_before_punct.trim().to_string()
}
