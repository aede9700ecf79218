//! Contributor extraction (§4.6 "Authors").
//!
//! Runs against the *raw*, uncleaned tree: affiliation resolution needs
//! the `xref`/`rid` linkage that [`crate::clean::strip_xrefs`] destroys.

use crate::document::Author;
use crate::xmltree::Xml;
use indexmap::IndexMap;

/// Extract authors and non-author contributors from every `contrib-group`
/// under the article's front matter. Contributor order is preserved;
/// contributors whose declared type isn't `"author"` (case-insensitive)
/// go into the second return value.
pub fn extract_contributors(tree: &Xml) -> (Vec<Author>, Vec<Author>) {
    let mut authors = Vec::new();
    let mut others = Vec::new();

    let affs = collect_affiliations(tree);

    for group in tree.find_all(tree.root, "contrib-group") {
        for contrib in tree.children_named(group, "contrib") {
            let contrib_type = tree
                .get(contrib)
                .attr("contrib-type")
                .unwrap_or("author")
                .to_string();

            let mut author = Author::default();

            if let Some(name) = tree.find_first(contrib, "name") {
                if let Some(surname) = tree.child_named(name, "surname") {
                    author.last_name = normalize_name(&tree.text_content(surname));
                }
                if let Some(given) = tree.child_named(name, "given-names") {
                    author.first_name = normalize_name(&tree.text_content(given));
                }
            } else if let Some(collab) = tree.find_first(contrib, "collab") {
                // A group/collaborative author: entire name goes in last_name.
                author.last_name = normalize_name(&tree.text_content(collab));
            }

            if let Some(email_el) = tree.find_first(contrib, "email") {
                author.email = Some(tree.text_content(email_el).trim().to_string());
            }

            // Inline affiliations (nested directly inside the contrib).
            for aff in tree.children_named(contrib, "aff") {
                author.affiliations.push(clean_affiliation_text(&tree.text_content(aff)));
            }

            // Affiliations referenced via <xref ref-type="aff" rid="...">.
            for xref in tree.children_named(contrib, "xref") {
                let el = tree.get(xref);
                if el.attr("ref-type") == Some("aff") {
                    if let Some(rid) = el.attr("rid") {
                        for id in rid.split_whitespace() {
                            if let Some(text) = affs.get(id) {
                                if author.email.is_none() {
                                    if let Some(found) = extract_email_from_text(text) {
                                        author.email = Some(found);
                                    }
                                }
                                author.affiliations.push(text.clone());
                            }
                        }
                    }
                }
            }

            if let Some(orcid) = tree
                .find_first(contrib, "contrib-id")
                .filter(|&id| tree.get(id).attr("contrib-id-type") == Some("orcid"))
            {
                author
                    .extra
                    .insert("orcid".to_string(), tree.text_content(orcid).trim().to_string());
            }

            if !contrib_type.eq_ignore_ascii_case("author") {
                author
                    .extra
                    .insert("contributor_type".to_string(), title_case(&contrib_type));
                others.push(author);
            } else {
                authors.push(author);
            }
        }
    }

    (authors, others)
}

fn collect_affiliations(tree: &Xml) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for aff in tree.find_all(tree.root, "aff") {
        if let Some(id) = tree.get(aff).attr("id") {
            map.insert(id.to_string(), clean_affiliation_text(&tree.text_content(aff)));
        }
    }
    map
}

/// Affiliation text often begins with a numeric/alpha label (from a
/// nested `<label>`); drop it since it's only meaningful as an xref
/// target, not as prose.
fn clean_affiliation_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.').trim().to_string()
}

fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_case(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn extract_email_from_text(text: &str) -> Option<String> {
    text.split_whitespace()
        .find(|tok| tok.contains('@'))
        .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric() && c != '@' && c != '.').to_string())
}
