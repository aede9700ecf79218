//! Document assembly (C7): runs every extractor in dependency order and
//! produces the final [`Document`], including its derived views.
//!
//! Extractors that need cross-reference linkage (`authors`, `citations`)
//! run against the raw tree; everything whose text should read cleanly
//! runs against a cleaned copy with xrefs stripped.

use crate::clean::strip_xrefs;
use crate::document::Document;
use crate::extract::{abstract_sec, authors, body, citations, dates, equations, figures, misc, permissions, tables};
use crate::xmltree;
use papeline_core::PmcError;

/// Parse and extract a complete [`Document`] from JATS XML bytes.
///
/// Deterministic: identical input bytes always produce a byte-for-byte
/// identical `Document` (and, downstream, identical serialized output).
pub fn parse_article(xml: &[u8]) -> Result<Document, PmcError> {
    let raw = xmltree::parse(xml)?;
    let mut cleaned = raw.clone();
    strip_xrefs(&mut cleaned);

    let (authors, non_author_contributors) = authors::extract_contributors(&raw);
    let citations = citations::extract_citations(&raw);
    let article_id = misc::extract_article_id(&raw);
    let (journal_title, journal_id, publisher_name, publisher_location) =
        misc::extract_journal_meta(&raw);
    let (volume, issue, first_page, last_page, elocation_id) =
        misc::extract_article_meta_fields(&raw);
    let published_date = dates::extract_published_date(&raw);
    let history_dates = dates::extract_history_dates(&raw);
    let permissions = permissions::extract_permissions(&raw);

    let abstract_sections = abstract_sec::extract_abstract(&cleaned);
    let abstract_text = abstract_sec::abstract_text(&abstract_sections);
    let (body_map, body_nested, paragraphs) = body::extract_body(&cleaned);
    let tables = tables::extract_tables(&cleaned);
    let figures = figures::extract_figures(&cleaned);
    let equations = equations::extract_equations(&cleaned);

    let full_text = assemble_full_text(&abstract_text, &body_map);

    let pmc_id = article_id
        .get("pmcid")
        .and_then(|raw_id| papeline_core::normalize_pmcid(raw_id).ok())
        .unwrap_or_default();

    let copyright_statement = permissions.copyright_statement.clone().unwrap_or_default();
    let license_type = permissions.license_type.clone().unwrap_or_default();

    Ok(Document {
        pmc_id,
        title: misc::extract_title(&raw),
        abstract_text,
        abstract_sections,
        body: body_map,
        body_nested,
        paragraphs,
        authors,
        non_author_contributors,
        article_id,
        journal_title,
        journal_id,
        publisher_name,
        publisher_location,
        volume,
        issue,
        first_page,
        last_page,
        elocation_id,
        published_date,
        history_dates,
        keywords: misc::extract_keywords(&raw),
        article_types: misc::extract_article_types(&raw),
        article_categories: misc::extract_article_categories(&raw),
        citations,
        tables,
        figures,
        equations,
        supplementary_materials: misc::extract_supplementary_materials(&cleaned),
        footnotes: misc::extract_footnotes(&cleaned),
        acknowledgements: misc::extract_acknowledgements(&cleaned),
        notes: misc::extract_notes(&cleaned),
        appendices: misc::extract_appendices(&cleaned),
        glossary: misc::extract_glossary(&cleaned),
        funding: misc::extract_funding(&raw),
        ethics: misc::extract_ethics(&cleaned),
        permissions,
        copyright_statement,
        license_type,
        related_articles: misc::extract_related_articles(&raw),
        conference: misc::extract_conference(&cleaned),
        translated_titles: misc::extract_translated_titles(&cleaned),
        translated_abstracts: misc::extract_translated_abstracts(&cleaned),
        version_history: misc::extract_version_history(&raw),
        counts: misc::extract_counts(&raw),
        self_uris: misc::extract_self_uris(&raw),
        custom_meta: misc::extract_custom_meta(&raw),
        full_text,
    })
}

/// `full_text` := `abstract_text` + `"\n\n"` + join of `body` values in
/// insertion order; degenerates to whichever side is non-empty when the
/// other is empty (§8).
fn assemble_full_text(abstract_text: &str, body: &indexmap::IndexMap<String, String>) -> String {
    let body_text = body.values().cloned().collect::<Vec<_>>().join("\n\n");
    match (abstract_text.is_empty(), body_text.is_empty()) {
        (true, true) => String::new(),
        (true, false) => body_text,
        (false, true) => abstract_text.to_string(),
        (false, false) => format!("{abstract_text}\n\n{body_text}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<article article-type="research-article">
      <front>
        <journal-meta>
          <journal-id journal-id-type="nlm-ta">J Example</journal-id>
          <journal-title-group><journal-title>Journal of Examples</journal-title></journal-title-group>
          <publisher><publisher-name>Example Press</publisher-name></publisher>
        </journal-meta>
        <article-meta>
          <article-id pub-id-type="pmc">PMC7181753</article-id>
          <article-id pub-id-type="doi">10.1/example</article-id>
          <title-group><article-title>An Example Study</article-title></title-group>
          <contrib-group>
            <contrib contrib-type="author">
              <name><surname>Doe</surname><given-names>Jane</given-names></name>
              <email>jane@example.com</email>
            </contrib>
          </contrib-group>
          <volume>12</volume>
          <issue>3</issue>
          <fpage>100</fpage>
          <lpage>110</lpage>
          <pub-date pub-type="epub"><year>2020</year><month>5</month><day>1</day></pub-date>
          <abstract><p>This is the summary.</p></abstract>
        </article-meta>
      </front>
      <body>
        <sec><title>Introduction</title><p>We studied <xref ref-type="bibr" rid="b1">1</xref> things.</p></sec>
        <sec><title>Methods</title><p>We did things.</p></sec>
      </body>
      <back>
        <ref-list>
          <ref id="b1"><element-citation><article-title>Prior work</article-title></element-citation></ref>
        </ref-list>
      </back>
    </article>"#;

    #[test]
    fn assembles_full_document() {
        let doc = parse_article(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.pmc_id, "7181753");
        assert_eq!(doc.article_id.get("pmcid").unwrap(), "PMC7181753");
        assert_eq!(doc.title, "An Example Study");
        assert_eq!(doc.authors.len(), 1);
        assert_eq!(doc.authors[0].last_name, "Doe");
        assert_eq!(doc.journal_title, "Journal of Examples");
        assert_eq!(doc.volume, "12");
        assert_eq!(doc.first_page, "100");
        assert_eq!(doc.published_date.get("epub").unwrap(), "2020-05-01");
        assert!(doc.body.contains_key("Introduction"));
        assert!(doc.body["Introduction"].contains("We studied things."));
        assert_eq!(doc.citations.len(), 1);
        assert!(doc.full_text.contains("This is the summary."));
        assert!(doc.full_text.contains("We did things."));
    }

    #[test]
    fn full_text_degenerates_when_body_empty() {
        let xml = b"<article><front><article-meta><abstract><p>Only an abstract.</p></abstract></article-meta></front></article>";
        let doc = parse_article(xml).unwrap();
        assert_eq!(doc.full_text, "Only an abstract.");
        assert!(doc.body.is_empty());
    }

    #[test]
    fn full_text_degenerates_when_abstract_empty() {
        let xml = b"<article><body><sec><title>Intro</title><p>Body text.</p></sec></body></article>";
        let doc = parse_article(xml).unwrap();
        assert_eq!(doc.full_text, "Body text.");
        assert!(doc.abstract_sections.is_empty());
    }

    #[test]
    fn toc_matches_body_keys() {
        let doc = parse_article(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.get_toc(), vec!["Introduction", "Methods"]);
    }

    #[test]
    fn deterministic_across_repeated_parses() {
        let first = parse_article(SAMPLE.as_bytes()).unwrap();
        let second = parse_article(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let xml = b"<article><front><article-meta";
        assert!(parse_article(xml).is_err());
    }
}
