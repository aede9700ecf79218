//! Abstract extraction (§4.6 "Abstract").
//!
//! Runs against the cleaned tree (xrefs stripped, not yet
//! whitespace-normalized at the element level — normalization happens
//! per paragraph here).

use crate::clean::normalize_text;
use crate::xmltree::{Node, Xml};
use indexmap::IndexMap;

const UNLABELED_KEY: &str = "Abstract";

/// Extract the ordered label→text abstract mapping. Unlabeled leading
/// prose (direct `<p>` children of `<abstract>`, not inside a `<sec>`)
/// accumulates under `"Abstract"`. Label casing is preserved verbatim.
pub fn extract_abstract(tree: &Xml) -> IndexMap<String, String> {
    let mut out: IndexMap<String, String> = IndexMap::new();

    for abs in tree.find_all(tree.root, "abstract") {
        for child in &tree.get(abs).children {
            let Node::Element(eid) = child else { continue };
            let el = tree.get(*eid);
            match el.name.as_str() {
                "sec" => {
                    let label = tree
                        .child_named(*eid, "title")
                        .map(|t| tree.text_content(t).trim().to_string())
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| UNLABELED_KEY.to_string());
                    let text = join_paragraphs(tree, *eid);
                    append(&mut out, label, text);
                }
                "title" => {}
                "p" => {
                    let text = normalize_text(&tree.text_content(*eid));
                    append(&mut out, UNLABELED_KEY.to_string(), text);
                }
                _ => {}
            }
        }
    }

    out
}

fn join_paragraphs(tree: &Xml, sec: crate::xmltree::ElementId) -> String {
    let paras: Vec<String> = tree
        .children_named(sec, "p")
        .into_iter()
        .map(|p| normalize_text(&tree.text_content(p)))
        .filter(|s| !s.is_empty())
        .collect();
    paras.join(" ")
}

fn append(map: &mut IndexMap<String, String>, key: String, text: String) {
    if text.is_empty() {
        return;
    }
    map.entry(key)
        .and_modify(|existing| {
            existing.push(' ');
            existing.push_str(&text);
        })
        .or_insert(text);
}

/// `abstract_text` := join of `abstract` values in insertion order, with
/// `"\n\n"` between entries.
pub fn abstract_text(sections: &IndexMap<String, String>) -> String {
    sections.values().cloned().collect::<Vec<_>>().join("\n\n")
}
