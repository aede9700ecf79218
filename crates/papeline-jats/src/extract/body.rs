//! Body extraction (§4.6 "Body (flat view)", "Body (nested view)",
//! "Paragraphs view"). All three views come from one traversal so their
//! section boundaries and titles never disagree with each other.
//!
//! Runs against the cleaned tree.

use crate::clean::normalize_text;
use crate::document::{BodyNode, Paragraph};
use crate::xmltree::{ElementId, Xml};
use indexmap::IndexMap;
use std::collections::HashMap;

const UNTITLED: &str = "Untitled Section";

/// Resolve each section's display title, de-duplicating siblings at the
/// same level with a deterministic ` (2)`, ` (3)`, … suffix in the order
/// they're encountered.
fn titled_siblings(tree: &Xml, secs: &[ElementId]) -> Vec<(String, ElementId)> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    secs.iter()
        .map(|&id| {
            let base = tree
                .child_named(id, "title")
                .map(|t| normalize_text(&tree.text_content(t)))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string());
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let title = if *count == 1 {
                base
            } else {
                format!("{base} ({count})")
            };
            (title, id)
        })
        .collect()
}

fn own_paragraph_text(tree: &Xml, sec: ElementId) -> String {
    tree.children_named(sec, "p")
        .into_iter()
        .map(|p| normalize_text(&tree.text_content(p)))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn flat_text(tree: &Xml, sec: ElementId) -> String {
    let mut parts = Vec::new();
    let own = own_paragraph_text(tree, sec);
    if !own.is_empty() {
        parts.push(own);
    }
    let children = titled_siblings(tree, &tree.children_named(sec, "sec"));
    for (title, child_id) in children {
        let child_flat = flat_text(tree, child_id);
        parts.push(format!("SECTION: {title}:\n\n    {child_flat}"));
    }
    parts.join("\n\n")
}

fn nested_node(tree: &Xml, sec: ElementId) -> BodyNode {
    let mut node = BodyNode {
        text: own_paragraph_text(tree, sec),
        children: IndexMap::new(),
    };
    for (title, child_id) in titled_siblings(tree, &tree.children_named(sec, "sec")) {
        node.children.insert(title, nested_node(tree, child_id));
    }
    node
}

fn collect_paragraphs(
    tree: &Xml,
    sec: ElementId,
    top_title: &str,
    path: &[String],
    out: &mut Vec<Paragraph>,
) {
    let subsection = path.join(" / ");
    for (i, p) in tree.children_named(sec, "p").into_iter().enumerate() {
        let text = normalize_text(&tree.text_content(p));
        if text.is_empty() {
            continue;
        }
        out.push(Paragraph {
            section: top_title.to_string(),
            subsection: subsection.clone(),
            paragraph_index: i,
            text,
        });
    }
    for (title, child_id) in titled_siblings(tree, &tree.children_named(sec, "sec")) {
        let mut new_path = path.to_vec();
        new_path.push(title);
        collect_paragraphs(tree, child_id, top_title, &new_path, out);
    }
}

/// Extract all three body views in one pass.
pub fn extract_body(tree: &Xml) -> (IndexMap<String, String>, BodyNode, Vec<Paragraph>) {
    let mut body = IndexMap::new();
    let mut nested = BodyNode::default();
    let mut paragraphs = Vec::new();

    let Some(body_el) = tree.child_named(tree.root, "body") else {
        return (body, nested, paragraphs);
    };

    let top_secs = titled_siblings(tree, &tree.children_named(body_el, "sec"));
    for (title, sec_id) in top_secs {
        body.insert(title.clone(), flat_text(tree, sec_id));
        nested.children.insert(title.clone(), nested_node(tree, sec_id));
        collect_paragraphs(tree, sec_id, &title, &[], &mut paragraphs);
    }

    (body, nested, paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::strip_xrefs;
    use crate::xmltree::parse;

    #[test]
    fn empty_body_yields_empty_map() {
        let xml = b"<article><body></body></article>";
        let mut tree = parse(xml).unwrap();
        strip_xrefs(&mut tree);
        let (body, _, paragraphs) = extract_body(&tree);
        assert!(body.is_empty());
        assert!(paragraphs.is_empty());
    }

    #[test]
    fn missing_title_becomes_untitled_section() {
        let xml = b"<article><body><sec><p>No title here.</p></sec></body></article>";
        let mut tree = parse(xml).unwrap();
        strip_xrefs(&mut tree);
        let (body, _, _) = extract_body(&tree);
        assert_eq!(body.keys().next().unwrap(), "Untitled Section");
    }

    #[test]
    fn duplicate_titles_get_suffixed() {
        let xml = b"<article><body>\
            <sec><title>Results</title><p>A</p></sec>\
            <sec><title>Results</title><p>B</p></sec>\
            <sec><title>Results</title><p>C</p></sec>\
            </body></article>";
        let mut tree = parse(xml).unwrap();
        strip_xrefs(&mut tree);
        let (body, _, _) = extract_body(&tree);
        let keys: Vec<&str> = body.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Results", "Results (2)", "Results (3)"]);
    }

    #[test]
    fn nested_subsections_fidelity() {
        let xml = b"<article><body>\
            <sec><title>Results</title><p>Intro prose.</p>\
                <sec><title>Exp A</title><p>Exp A text.</p></sec>\
                <sec><title>Exp B</title><p>Exp B text.</p></sec>\
            </sec></body></article>";
        let mut tree = parse(xml).unwrap();
        strip_xrefs(&mut tree);
        let (body, nested, paragraphs) = extract_body(&tree);

        let results = body.get("Results").unwrap();
        assert!(results.contains("Intro prose."));
        assert!(results.contains("SECTION: Exp A:\n\n    Exp A text."));
        assert!(results.contains("SECTION: Exp B:\n\n    Exp B text."));

        let results_node = nested.children.get("Results").unwrap();
        assert_eq!(results_node.text, "Intro prose.");
        assert_eq!(results_node.children.get("Exp A").unwrap().text, "Exp A text.");
        assert_eq!(results_node.children.get("Exp B").unwrap().text, "Exp B text.");

        let exp_a_para = paragraphs.iter().find(|p| p.subsection == "Exp A").unwrap();
        assert_eq!(exp_a_para.section, "Results");
        assert_eq!(exp_a_para.paragraph_index, 0);
    }

    #[test]
    fn paragraph_index_is_zero_based_within_leaf_section() {
        let xml = b"<article><body><sec><title>Methods</title><p>One.</p><p>Two.</p></sec></body></article>";
        let mut tree = parse(xml).unwrap();
        strip_xrefs(&mut tree);
        let (_, _, paragraphs) = extract_body(&tree);
        assert_eq!(paragraphs[0].paragraph_index, 0);
        assert_eq!(paragraphs[1].paragraph_index, 1);
    }
}
