//! Permissions & license extraction (§4.6 "Permissions & License").

use crate::clean::normalize_text;
use crate::document::Permissions;
use crate::xmltree::Xml;
use regex::Regex;
use std::sync::LazyLock;

static CC_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"creativecommons\.org/licenses/([a-z-]+)").unwrap());

pub fn extract_permissions(tree: &Xml) -> Permissions {
    let Some(perm) = tree.find_first(tree.root, "permissions") else {
        return Permissions::default();
    };

    let copyright_statement = tree
        .child_named(perm, "copyright-statement")
        .map(|t| normalize_text(&tree.text_content(t)))
        .filter(|s| !s.is_empty());
    let copyright_year = tree
        .child_named(perm, "copyright-year")
        .map(|t| tree.text_content(t).trim().to_string())
        .filter(|s| !s.is_empty());

    let license = tree.child_named(perm, "license");
    let license_text = license.map(|l| normalize_text(&tree.text_content(l))).filter(|s| !s.is_empty());

    let license_type = license.and_then(|l| {
        tree.get(l)
            .attr("license-type")
            .map(str::to_string)
            .or_else(|| {
                tree.find_all(l, "ext-link").into_iter().find_map(|link| {
                    let href = tree.get(link).attr("href")?;
                    CC_URL.captures(href).map(|c| format!("CC-{}", c[1].to_uppercase()))
                })
            })
    });

    Permissions {
        copyright_statement,
        copyright_year,
        license_type,
        license_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmltree::parse;

    #[test]
    fn license_type_from_attribute() {
        let xml = br#"<article><front><article-meta><permissions>
            <copyright-statement>(C) 2020 The Authors</copyright-statement>
            <copyright-year>2020</copyright-year>
            <license license-type="open-access"><license-p>Full terms here.</license-p></license>
        </permissions></article-meta></front></article>"#;
        let tree = parse(xml).unwrap();
        let perms = extract_permissions(&tree);
        assert_eq!(perms.copyright_year.as_deref(), Some("2020"));
        assert_eq!(perms.license_type.as_deref(), Some("open-access"));
        assert!(perms.license_text.as_ref().unwrap().contains("Full terms"));
    }

    #[test]
    fn license_type_inferred_from_cc_url_when_attribute_absent() {
        let xml = br#"<article><front><article-meta><permissions>
            <license><license-p>See <ext-link xlink:href="https://creativecommons.org/licenses/by/4.0/">license</ext-link>.</license-p></license>
        </permissions></article-meta></front></article>"#;
        let tree = parse(xml).unwrap();
        let perms = extract_permissions(&tree);
        assert_eq!(perms.license_type.as_deref(), Some("CC-BY"));
    }

    #[test]
    fn missing_permissions_block_is_default() {
        let xml = b"<article><front><article-meta></article-meta></front></article>";
        let tree = parse(xml).unwrap();
        let perms = extract_permissions(&tree);
        assert!(perms.copyright_statement.is_none());
        assert!(perms.license_type.is_none());
    }
}
