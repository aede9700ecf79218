//! Table extraction (§4.6 "Tables"), with colspan/rowspan expansion so
//! the resulting matrix is always rectangular (§8 invariant).

use crate::clean::normalize_text;
use crate::document::Table;
use crate::xmltree::{ElementId, Xml};
use std::collections::HashMap;

pub fn extract_tables(tree: &Xml) -> Vec<Table> {
    tree.find_all(tree.root, "table-wrap")
        .into_iter()
        .map(|wrap| extract_one(tree, wrap))
        .collect()
}

fn extract_one(tree: &Xml, wrap: ElementId) -> Table {
    let label = tree
        .child_named(wrap, "label")
        .map(|t| normalize_text(&tree.text_content(t)))
        .filter(|s| !s.is_empty());
    let caption = tree
        .child_named(wrap, "caption")
        .map(|t| normalize_text(&tree.text_content(t)))
        .filter(|s| !s.is_empty());

    let mut rows = Vec::new();
    if let Some(table_el) = tree.find_first(wrap, "table") {
        let mut pending: HashMap<usize, (String, u32)> = HashMap::new();
        if let Some(thead) = tree.child_named(table_el, "thead") {
            for tr in tree.children_named(thead, "tr") {
                rows.push(expand_row(tree, tr, &mut pending));
            }
        }
        if let Some(tbody) = tree.child_named(table_el, "tbody") {
            for tr in tree.children_named(tbody, "tr") {
                rows.push(expand_row(tree, tr, &mut pending));
            }
        } else {
            // Some tables have bare <tr> children with no <tbody> wrapper.
            for tr in tree.children_named(table_el, "tr") {
                rows.push(expand_row(tree, tr, &mut pending));
            }
        }
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }

    Table { label, caption, rows }
}

fn expand_row(tree: &Xml, tr: ElementId, pending: &mut HashMap<usize, (String, u32)>) -> Vec<String> {
    let mut cells: Vec<(String, u32, u32)> = Vec::new();
    for node in &tree.get(tr).children {
        if let crate::xmltree::Node::Element(eid) = node {
            let el = tree.get(*eid);
            if el.name == "td" || el.name == "th" {
                let text = normalize_text(&tree.text_content(*eid));
                let colspan = el.attr("colspan").and_then(|s| s.parse().ok()).unwrap_or(1).max(1);
                let rowspan = el.attr("rowspan").and_then(|s| s.parse().ok()).unwrap_or(1).max(1);
                cells.push((text, colspan, rowspan));
            }
        }
    }

    let mut row = Vec::new();
    let mut col = 0usize;
    let mut cell_iter = cells.into_iter();
    loop {
        if let Some(&(ref val, remaining)) = pending.get(&col) {
            row.push(val.clone());
            if remaining <= 1 {
                pending.remove(&col);
            } else {
                pending.insert(col, (val.clone(), remaining - 1));
            }
            col += 1;
            continue;
        }
        match cell_iter.next() {
            Some((text, colspan, rowspan)) => {
                for c in 0..colspan {
                    row.push(text.clone());
                    if rowspan > 1 {
                        pending.insert(col + c as usize, (text.clone(), rowspan - 1));
                    }
                }
                col += colspan as usize;
            }
            None => break,
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmltree::parse;

    #[test]
    fn simple_table_extracts_header_and_body() {
        let xml = br#"<article><body><table-wrap id="t1">
            <label>Table 1</label>
            <caption><p>Overview</p></caption>
            <table>
                <thead><tr><th>Name</th><th>Score</th></tr></thead>
                <tbody><tr><td>Alice</td><td>9</td></tr></tbody>
            </table>
        </table-wrap></body></article>"#;
        let tree = parse(xml).unwrap();
        let tables = extract_tables(&tree);
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.label.as_deref(), Some("Table 1"));
        assert_eq!(t.rows, vec![vec!["Name", "Score"], vec!["Alice", "9"]]);
    }

    #[test]
    fn colspan_expands_into_repeated_cells() {
        let xml = br#"<article><body><table-wrap><table>
            <tbody><tr><td colspan="2">Merged</td><td>C</td></tr></tbody>
        </table></table-wrap></body></article>"#;
        let tree = parse(xml).unwrap();
        let tables = extract_tables(&tree);
        assert_eq!(tables[0].rows[0], vec!["Merged", "Merged", "C"]);
    }

    #[test]
    fn rowspan_repeats_into_next_row() {
        let xml = br#"<article><body><table-wrap><table>
            <tbody>
              <tr><td rowspan="2">Group</td><td>1</td></tr>
              <tr><td>2</td></tr>
            </tbody>
        </table></table-wrap></body></article>"#;
        let tree = parse(xml).unwrap();
        let tables = extract_tables(&tree);
        assert_eq!(tables[0].rows, vec![vec!["Group", "1"], vec!["Group", "2"]]);
    }

    #[test]
    fn rows_are_padded_rectangular() {
        let xml = br#"<article><body><table-wrap><table>
            <tbody>
              <tr><td>A</td><td>B</td><td>C</td></tr>
              <tr><td>D</td></tr>
            </tbody>
        </table></table-wrap></body></article>"#;
        let tree = parse(xml).unwrap();
        let rows = &extract_tables(&tree)[0].rows;
        let width = rows[0].len();
        assert!(rows.iter().all(|r| r.len() == width));
    }
}
