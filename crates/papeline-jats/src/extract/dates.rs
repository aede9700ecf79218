//! Date extraction (§4.6 "Dates"): `published_date` from `<pub-date>`
//! elements, `history_dates` from `<history><date>` elements. Both
//! assemble `YYYY-MM-DD`, defaulting missing month/day to `01`.

use crate::xmltree::{ElementId, Xml};
use indexmap::IndexMap;

fn iso_date(tree: &Xml, date_el: ElementId) -> Option<String> {
    let year = tree
        .child_named(date_el, "year")
        .map(|t| tree.text_content(t).trim().to_string())
        .filter(|s| !s.is_empty())?;
    let month = tree
        .child_named(date_el, "month")
        .map(|t| tree.text_content(t).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "01".to_string());
    let day = tree
        .child_named(date_el, "day")
        .map(|t| tree.text_content(t).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "01".to_string());
    Some(format!("{:0>4}-{:0>2}-{:0>2}", year, month, day))
}

pub fn extract_published_date(tree: &Xml) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for pub_date in tree.find_all(tree.root, "pub-date") {
        let key = tree
            .get(pub_date)
            .attr("pub-type")
            .or_else(|| tree.get(pub_date).attr("date-type"))
            .unwrap_or("pub-date")
            .to_string();
        if let Some(date) = iso_date(tree, pub_date) {
            out.insert(key, date);
        }
    }
    out
}

pub fn extract_history_dates(tree: &Xml) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for history in tree.find_all(tree.root, "history") {
        for date in tree.children_named(history, "date") {
            let key = tree.get(date).attr("date-type").unwrap_or("unknown").to_string();
            if let Some(iso) = iso_date(tree, date) {
                out.insert(key, iso);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmltree::parse;

    #[test]
    fn year_only_defaults_month_and_day() {
        let xml = b"<article><front><article-meta><pub-date pub-type=\"epub\"><year>2021</year></pub-date></article-meta></front></article>";
        let tree = parse(xml).unwrap();
        let dates = extract_published_date(&tree);
        assert_eq!(dates.get("epub").unwrap(), "2021-01-01");
    }

    #[test]
    fn full_date_is_assembled() {
        let xml = b"<article><front><article-meta><pub-date pub-type=\"ppub\"><year>2021</year><month>6</month><day>15</day></pub-date></article-meta></front></article>";
        let tree = parse(xml).unwrap();
        let dates = extract_published_date(&tree);
        assert_eq!(dates.get("ppub").unwrap(), "2021-06-15");
    }

    #[test]
    fn history_dates_keyed_by_date_type() {
        let xml = b"<article><front><article-meta><history>\
            <date date-type=\"received\"><year>2020</year><month>1</month><day>2</day></date>\
            <date date-type=\"accepted\"><year>2020</year><month>3</month><day>4</day></date>\
            </history></article-meta></front></article>";
        let tree = parse(xml).unwrap();
        let dates = extract_history_dates(&tree);
        assert_eq!(dates.get("received").unwrap(), "2020-01-02");
        assert_eq!(dates.get("accepted").unwrap(), "2020-03-04");
    }
}
