//! The long tail of §4.6 extractors: identifiers, journal/publisher
//! metadata, keywords, categories, funding, and the remaining
//! low-cardinality fields of [`crate::document::Document`].

use crate::clean::normalize_text;
use crate::document::Counts;
use crate::xmltree::Xml;
use indexmap::IndexMap;

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|s| !s.is_empty() && seen.insert(s.clone())).collect()
}

pub fn extract_title(tree: &Xml) -> String {
    tree.find_first(tree.root, "article-title")
        .map(|t| normalize_text(&tree.text_content(t)))
        .unwrap_or_default()
}

/// Maps JATS `pub-id-type` values to the document's `article_id` keys.
fn article_id_key(pub_id_type: &str) -> String {
    match pub_id_type {
        "pmc" | "pmcid" => "pmcid".to_string(),
        other => other.to_string(),
    }
}

pub fn extract_article_id(tree: &Xml) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for id_el in tree.find_all(tree.root, "article-id") {
        let Some(kind) = tree.get(id_el).attr("pub-id-type") else {
            continue;
        };
        let value = tree.text_content(id_el).trim().to_string();
        if !value.is_empty() {
            out.insert(article_id_key(kind), value);
        }
    }
    out
}

pub fn extract_journal_meta(tree: &Xml) -> (String, IndexMap<String, String>, String, String) {
    let journal_title = tree
        .find_first(tree.root, "journal-title")
        .map(|t| normalize_text(&tree.text_content(t)))
        .unwrap_or_default();

    let mut journal_id = IndexMap::new();
    for id_el in tree.find_all(tree.root, "journal-id") {
        if let Some(kind) = tree.get(id_el).attr("journal-id-type") {
            let value = tree.text_content(id_el).trim().to_string();
            if !value.is_empty() {
                journal_id.insert(kind.to_string(), value);
            }
        }
    }

    let publisher_name = tree
        .find_first(tree.root, "publisher-name")
        .map(|t| normalize_text(&tree.text_content(t)))
        .unwrap_or_default();
    let publisher_location = tree
        .find_first(tree.root, "publisher-loc")
        .map(|t| normalize_text(&tree.text_content(t)))
        .unwrap_or_default();

    (journal_title, journal_id, publisher_name, publisher_location)
}

/// volume, issue, first_page, last_page, elocation_id.
pub fn extract_article_meta_fields(tree: &Xml) -> (String, String, String, String, String) {
    let text_of = |name: &str| {
        tree.find_first(tree.root, name)
            .map(|t| tree.text_content(t).trim().to_string())
            .unwrap_or_default()
    };
    (
        text_of("volume"),
        text_of("issue"),
        text_of("fpage"),
        text_of("lpage"),
        text_of("elocation-id"),
    )
}

pub fn extract_keywords(tree: &Xml) -> Vec<String> {
    let mut out = Vec::new();
    for group in tree.find_all(tree.root, "kwd-group") {
        for kwd in tree.children_named(group, "kwd") {
            out.push(normalize_text(&tree.text_content(kwd)));
        }
    }
    dedup(out)
}

pub fn extract_article_types(tree: &Xml) -> Vec<String> {
    tree.get(tree.root)
        .attr("article-type")
        .map(|t| vec![t.to_string()])
        .unwrap_or_default()
}

pub fn extract_article_categories(tree: &Xml) -> Vec<String> {
    let mut out = Vec::new();
    for cats in tree.find_all(tree.root, "article-categories") {
        for subject in tree.find_all(cats, "subject") {
            out.push(normalize_text(&tree.text_content(subject)));
        }
    }
    dedup(out)
}

pub fn extract_funding(tree: &Xml) -> Vec<String> {
    let mut out = Vec::new();
    for group in tree.find_all(tree.root, "funding-group") {
        for award in tree.find_all(group, "award-group") {
            if let Some(src) = tree.find_first(award, "funding-source") {
                out.push(normalize_text(&tree.text_content(src)));
            }
        }
        for statement in tree.find_all(group, "funding-statement") {
            out.push(normalize_text(&tree.text_content(statement)));
        }
    }
    dedup(out)
}

pub fn extract_ethics(tree: &Xml) -> Vec<String> {
    let mut out = Vec::new();
    for sec in tree.find_all(tree.root, "sec") {
        let is_ethics = tree
            .get(sec)
            .attr("sec-type")
            .map(|t| t.contains("ethic"))
            .unwrap_or(false)
            || tree
                .child_named(sec, "title")
                .map(|t| tree.text_content(t).to_lowercase().contains("ethic"))
                .unwrap_or(false);
        if is_ethics {
            let text = normalize_text(&tree.text_content(sec));
            if !text.is_empty() {
                out.push(text);
            }
        }
    }
    out
}

pub fn extract_supplementary_materials(tree: &Xml) -> Vec<String> {
    tree.find_all(tree.root, "supplementary-material")
        .into_iter()
        .map(|el| {
            tree.child_named(el, "caption")
                .or_else(|| tree.child_named(el, "label"))
                .map(|t| normalize_text(&tree.text_content(t)))
                .unwrap_or_default()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn extract_footnotes(tree: &Xml) -> Vec<String> {
    let mut out = Vec::new();
    for group in tree.find_all(tree.root, "fn-group") {
        for fnote in tree.children_named(group, "fn") {
            let text = normalize_text(&tree.text_content(fnote));
            if !text.is_empty() {
                out.push(text);
            }
        }
    }
    out
}

pub fn extract_acknowledgements(tree: &Xml) -> String {
    tree.find_first(tree.root, "ack")
        .map(|t| normalize_text(&tree.text_content(t)))
        .unwrap_or_default()
}

pub fn extract_notes(tree: &Xml) -> Vec<String> {
    tree.find_all(tree.root, "notes")
        .into_iter()
        .map(|t| normalize_text(&tree.text_content(t)))
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn extract_appendices(tree: &Xml) -> Vec<String> {
    tree.find_all(tree.root, "app")
        .into_iter()
        .map(|t| normalize_text(&tree.text_content(t)))
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn extract_glossary(tree: &Xml) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for glossary in tree.find_all(tree.root, "glossary") {
        for def_item in tree.find_all(glossary, "def-item") {
            let term = tree
                .child_named(def_item, "term")
                .map(|t| normalize_text(&tree.text_content(t)));
            let def = tree
                .child_named(def_item, "def")
                .map(|t| normalize_text(&tree.text_content(t)));
            if let (Some(term), Some(def)) = (term, def) {
                if !term.is_empty() {
                    out.insert(term, def);
                }
            }
        }
    }
    out
}

pub fn extract_related_articles(tree: &Xml) -> Vec<String> {
    tree.find_all(tree.root, "related-article")
        .into_iter()
        .filter_map(|el| tree.get(el).attr("href").or_else(|| tree.get(el).attr("id")).map(str::to_string))
        .collect()
}

pub fn extract_conference(tree: &Xml) -> String {
    tree.find_first(tree.root, "conference")
        .map(|t| normalize_text(&tree.text_content(t)))
        .unwrap_or_default()
}

pub fn extract_translated_titles(tree: &Xml) -> Vec<String> {
    tree.find_all(tree.root, "trans-title")
        .into_iter()
        .map(|t| normalize_text(&tree.text_content(t)))
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn extract_translated_abstracts(tree: &Xml) -> Vec<String> {
    tree.find_all(tree.root, "trans-abstract")
        .into_iter()
        .map(|t| normalize_text(&tree.text_content(t)))
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn extract_version_history(tree: &Xml) -> Vec<String> {
    tree.find_all(tree.root, "article-version")
        .into_iter()
        .map(|t| normalize_text(&tree.text_content(t)))
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn extract_self_uris(tree: &Xml) -> Vec<String> {
    tree.find_all(tree.root, "self-uri")
        .into_iter()
        .filter_map(|el| tree.get(el).attr("href").map(str::to_string))
        .collect()
}

pub fn extract_custom_meta(tree: &Xml) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for group in tree.find_all(tree.root, "custom-meta-group") {
        for meta in tree.children_named(group, "custom-meta") {
            let name = tree
                .child_named(meta, "meta-name")
                .map(|t| tree.text_content(t).trim().to_string());
            let value = tree
                .child_named(meta, "meta-value")
                .map(|t| normalize_text(&tree.text_content(t)));
            if let (Some(name), Some(value)) = (name, value) {
                if !name.is_empty() {
                    out.insert(name, value);
                }
            }
        }
    }
    out
}

pub fn extract_counts(tree: &Xml) -> Counts {
    let Some(counts) = tree.find_first(tree.root, "counts") else {
        return Counts::default();
    };
    let count_of = |name: &str| {
        tree.child_named(counts, name)
            .and_then(|el| tree.get(el).attr("count").and_then(|c| c.parse().ok()))
    };
    Counts {
        fig_count: count_of("fig-count"),
        table_count: count_of("table-count"),
        ref_count: count_of("ref-count"),
        page_count: count_of("page-count"),
    }
}
