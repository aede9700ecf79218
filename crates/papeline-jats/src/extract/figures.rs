//! Figure extraction (§4.6 "Figures"). No image bytes are ever downloaded;
//! only the first graphic's `href` is kept.

use crate::clean::normalize_text;
use crate::document::Figure;
use crate::xmltree::Xml;

pub fn extract_figures(tree: &Xml) -> Vec<Figure> {
    tree.find_all(tree.root, "fig")
        .into_iter()
        .map(|fig| {
            let id = tree.get(fig).attr("id").unwrap_or_default().to_string();
            let label = tree
                .child_named(fig, "label")
                .map(|t| normalize_text(&tree.text_content(t)))
                .filter(|s| !s.is_empty());
            let caption = tree
                .child_named(fig, "caption")
                .map(|t| normalize_text(&tree.text_content(t)))
                .filter(|s| !s.is_empty());
            let graphic_href = tree
                .find_first(fig, "graphic")
                .and_then(|g| tree.get(g).attr("href"))
                .map(str::to_string);
            let alt_text = tree
                .find_first(fig, "alt-text")
                .map(|t| normalize_text(&tree.text_content(t)))
                .filter(|s| !s.is_empty());

            Figure {
                id,
                label,
                caption,
                graphic_href,
                alt_text,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmltree::parse;

    #[test]
    fn extracts_label_caption_and_first_graphic() {
        let xml = br#"<article><body><fig id="f1">
            <label>Figure 1</label>
            <caption><p>A description.</p></caption>
            <graphic xlink:href="fig1.tif"/>
            <alt-text>alt</alt-text>
        </fig></body></article>"#;
        let tree = parse(xml).unwrap();
        let figures = extract_figures(&tree);
        assert_eq!(figures.len(), 1);
        let f = &figures[0];
        assert_eq!(f.id, "f1");
        assert_eq!(f.label.as_deref(), Some("Figure 1"));
        assert_eq!(f.graphic_href.as_deref(), Some("fig1.tif"));
        assert_eq!(f.alt_text.as_deref(), Some("alt"));
    }

    #[test]
    fn missing_graphic_is_none() {
        let xml = b"<article><body><fig id=\"f2\"><label>Figure 2</label></fig></body></article>";
        let tree = parse(xml).unwrap();
        let figures = extract_figures(&tree);
        assert!(figures[0].graphic_href.is_none());
    }
}
