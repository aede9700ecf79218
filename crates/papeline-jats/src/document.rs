//! The structured document model produced by the transform pipeline.
//!
//! Field order on [`Document`] is significant: `#[derive(Serialize)]`
//! emits struct fields in declaration order for JSON, so the order below
//! *is* the on-disk field order. Don't reorder without checking downstream
//! consumers.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A single author or non-author contributor.
///
/// `contributor_type` (e.g. "Editor", "Translator") and rarely-used
/// attributes like `orcid` live in `extra` rather than as dedicated
/// fields — most author records never need them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Author {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub affiliations: Vec<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Citation {
    pub id: String,
    pub raw: String,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmcid: Option<String>,
}

/// A table-wrap reduced to a rectangular matrix. `rows` includes header
/// rows (from `thead`) before body rows (from `tbody`); colspan/rowspan
/// are expanded by repeating the cell value into the spanned positions,
/// and short rows are right-padded with empty strings so every row has
/// the same length.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Table {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Figure {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphic_href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Equation {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mathml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tex: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Paragraph {
    pub section: String,
    pub subsection: String,
    pub paragraph_index: usize,
    pub text: String,
}

/// One node of the nested-section view of the article body.
///
/// Serializes as a map with a reserved `"_text"` key holding this node's
/// own paragraph text, plus one entry per child section keyed by section
/// title.
#[derive(Debug, Clone, Default)]
pub struct BodyNode {
    pub text: String,
    pub children: IndexMap<String, BodyNode>,
}

impl Serialize for BodyNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.children.len()))?;
        map.serialize_entry("_text", &self.text)?;
        for (title, child) in &self.children {
            map.serialize_entry(title, child)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Permissions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_statement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Counts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fig_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

/// A fully extracted and assembled JATS article.
///
/// Field order matches the fixed output contract; see the module doc.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    pub pmc_id: String,
    pub title: String,
    pub abstract_text: String,
    #[serde(rename = "abstract")]
    pub abstract_sections: IndexMap<String, String>,
    pub body: IndexMap<String, String>,
    pub body_nested: BodyNode,
    pub paragraphs: Vec<Paragraph>,
    pub authors: Vec<Author>,
    pub non_author_contributors: Vec<Author>,
    pub article_id: IndexMap<String, String>,
    pub journal_title: String,
    pub journal_id: IndexMap<String, String>,
    pub publisher_name: String,
    pub publisher_location: String,
    pub volume: String,
    pub issue: String,
    pub first_page: String,
    pub last_page: String,
    pub elocation_id: String,
    pub published_date: IndexMap<String, String>,
    pub history_dates: IndexMap<String, String>,
    pub keywords: Vec<String>,
    pub article_types: Vec<String>,
    pub article_categories: Vec<String>,
    pub citations: Vec<Citation>,
    pub tables: Vec<Table>,
    pub figures: Vec<Figure>,
    pub equations: Vec<Equation>,
    pub supplementary_materials: Vec<String>,
    pub footnotes: Vec<String>,
    pub acknowledgements: String,
    pub notes: Vec<String>,
    pub appendices: Vec<String>,
    pub glossary: IndexMap<String, String>,
    pub funding: Vec<String>,
    pub ethics: Vec<String>,
    pub permissions: Permissions,
    pub copyright_statement: String,
    pub license_type: String,
    pub related_articles: Vec<String>,
    pub conference: String,
    pub translated_titles: Vec<String>,
    pub translated_abstracts: Vec<String>,
    pub version_history: Vec<String>,
    pub counts: Counts,
    pub self_uris: Vec<String>,
    pub custom_meta: IndexMap<String, String>,
    pub full_text: String,
}

impl Document {
    /// Ordered list of top-level section titles from `body`, per §8's
    /// `get_toc() == list(body.keys())` invariant.
    pub fn get_toc(&self) -> Vec<String> {
        self.body.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_node_serializes_text_key_first() {
        let mut node = BodyNode {
            text: "intro text".to_string(),
            children: IndexMap::new(),
        };
        node.children.insert(
            "Methods".to_string(),
            BodyNode {
                text: "methods text".to_string(),
                children: IndexMap::new(),
            },
        );
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.starts_with(r#"{"_text":"intro text","Methods":"#));
    }

    #[test]
    fn document_field_order_matches_contract() {
        let doc = Document::default();
        let json = serde_json::to_value(&doc).unwrap();
        let obj = json.as_object().unwrap();
        let keys: Vec<&str> = obj.keys().map(|s| s.as_str()).collect();
        assert_eq!(keys[0], "pmc_id");
        assert_eq!(keys[1], "title");
        assert_eq!(keys[2], "abstract_text");
        assert_eq!(keys[3], "abstract");
        assert_eq!(keys[4], "body");
        assert_eq!(*keys.last().unwrap(), "full_text");
    }

    #[test]
    fn contributor_type_folds_into_extra() {
        let mut author = Author::default();
        author
            .extra
            .insert("contributor_type".to_string(), "Editor".to_string());
        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json["contributor_type"], "Editor");
    }

    #[test]
    fn toc_matches_body_key_order() {
        let mut doc = Document::default();
        doc.body.insert("Introduction".to_string(), "x".to_string());
        doc.body.insert("Methods".to_string(), "y".to_string());
        assert_eq!(doc.get_toc(), vec!["Introduction", "Methods"]);
    }
}
