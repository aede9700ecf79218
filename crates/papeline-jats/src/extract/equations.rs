//! Equation extraction (§4.6 "Equations"). MathML is retained verbatim
//! via [`Xml::to_xml`]; a TeX annotation is extracted if present.

use crate::document::Equation;
use crate::xmltree::Xml;

pub fn extract_equations(tree: &Xml) -> Vec<Equation> {
    let mut out = Vec::new();
    for name in ["disp-formula", "inline-formula"] {
        for formula in tree.find_all(tree.root, name) {
            let id = tree.get(formula).attr("id").unwrap_or_default().to_string();
            let mathml = tree
                .find_first(formula, "math")
                .map(|m| tree.to_xml(m));
            let tex = tree
                .find_first(formula, "tex-math")
                .map(|t| tree.text_content(t).trim().to_string())
                .filter(|s| !s.is_empty());

            if mathml.is_some() || tex.is_some() {
                out.push(Equation { id, mathml, tex });
            }
        }
    }
    out
}
