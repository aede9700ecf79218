//! Reference-list extraction (§4.6 "Citations").
//!
//! Runs against the raw tree. Every citation always retains a verbatim
//! `raw` string; structured fields are filled in on a best-effort basis
//! and left unset when the source citation doesn't carry them.

use crate::clean::normalize_text;
use crate::document::Citation;
use crate::xmltree::Xml;

pub fn extract_citations(tree: &Xml) -> Vec<Citation> {
    let mut out = Vec::new();
    for ref_list in tree.find_all(tree.root, "ref-list") {
        for r in tree.children_named(ref_list, "ref") {
            let id = tree.get(r).attr("id").unwrap_or_default().to_string();
            let raw = normalize_text(&tree.text_content(r));

            let citation_el = tree
                .find_first(r, "element-citation")
                .or_else(|| tree.find_first(r, "mixed-citation"));

            let mut citation = Citation {
                id,
                raw,
                ..Default::default()
            };

            if let Some(cid) = citation_el {
                citation.authors = extract_authors(tree, cid);
                citation.title = tree
                    .find_first(cid, "article-title")
                    .map(|t| normalize_text(&tree.text_content(t)))
                    .filter(|s| !s.is_empty());
                citation.source = tree
                    .child_named(cid, "source")
                    .map(|t| normalize_text(&tree.text_content(t)))
                    .filter(|s| !s.is_empty());
                citation.year = tree
                    .child_named(cid, "year")
                    .map(|t| normalize_text(&tree.text_content(t)))
                    .filter(|s| !s.is_empty());
                citation.volume = tree
                    .child_named(cid, "volume")
                    .map(|t| normalize_text(&tree.text_content(t)))
                    .filter(|s| !s.is_empty());
                citation.pages = extract_pages(tree, cid);

                for pub_id in tree.children_named(cid, "pub-id") {
                    let el = tree.get(pub_id);
                    let value = normalize_text(&tree.text_content(pub_id));
                    if value.is_empty() {
                        continue;
                    }
                    match el.attr("pub-id-type") {
                        Some("doi") => citation.doi = Some(value),
                        Some("pmid") => citation.pmid = Some(value),
                        Some("pmcid") | Some("pmc") => citation.pmcid = Some(value),
                        _ => {}
                    }
                }
            }

            out.push(citation);
        }
    }
    out
}

fn extract_authors(tree: &Xml, citation_el: crate::xmltree::ElementId) -> Vec<String> {
    let mut names = Vec::new();
    for group in tree.children_named(citation_el, "person-group") {
        for name in tree.children_named(group, "name") {
            let surname = tree
                .child_named(name, "surname")
                .map(|t| normalize_text(&tree.text_content(t)))
                .unwrap_or_default();
            let given = tree
                .child_named(name, "given-names")
                .map(|t| normalize_text(&tree.text_content(t)))
                .unwrap_or_default();
            let full = [surname, given].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");
            if !full.is_empty() {
                names.push(full);
            }
        }
        for collab in tree.children_named(group, "collab") {
            let text = normalize_text(&tree.text_content(collab));
            if !text.is_empty() {
                names.push(text);
            }
        }
    }
    names
}

fn extract_pages(tree: &Xml, citation_el: crate::xmltree::ElementId) -> Option<String> {
    let fpage = tree.child_named(citation_el, "fpage").map(|t| tree.text_content(t));
    let lpage = tree.child_named(citation_el, "lpage").map(|t| tree.text_content(t));
    match (fpage, lpage) {
        (Some(f), Some(l)) if !f.trim().is_empty() && !l.trim().is_empty() => {
            Some(format!("{}-{}", f.trim(), l.trim()))
        }
        (Some(f), _) if !f.trim().is_empty() => Some(f.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmltree::parse;

    #[test]
    fn structured_citation_extracts_known_fields() {
        let xml = br#"<article><back><ref-list>
            <ref id="b1"><element-citation>
                <person-group person-group-type="author">
                    <name><surname>Doe</surname><given-names>J</given-names></name>
                </person-group>
                <article-title>A great paper</article-title>
                <source>Journal of Examples</source>
                <year>2020</year>
                <volume>5</volume>
                <fpage>100</fpage>
                <lpage>110</lpage>
                <pub-id pub-id-type="doi">10.1/xyz</pub-id>
            </element-citation></ref>
        </ref-list></back></article>"#;
        let tree = parse(xml).unwrap();
        let citations = extract_citations(&tree);
        assert_eq!(citations.len(), 1);
        let c = &citations[0];
        assert_eq!(c.id, "b1");
        assert_eq!(c.title.as_deref(), Some("A great paper"));
        assert_eq!(c.authors, vec!["Doe J"]);
        assert_eq!(c.pages.as_deref(), Some("100-110"));
        assert_eq!(c.doi.as_deref(), Some("10.1/xyz"));
        assert!(!c.raw.is_empty());
    }

    #[test]
    fn unparseable_citation_keeps_only_raw() {
        let xml = b"<article><back><ref-list><ref id=\"b2\">Some freeform text, no markup.</ref></ref-list></back></article>";
        let tree = parse(xml).unwrap();
        let citations = extract_citations(&tree);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].raw, "Some freeform text, no markup.");
        assert!(citations[0].title.is_none());
        assert!(citations[0].doi.is_none());
    }
}
