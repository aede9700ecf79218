//! Pure identifier normalization shared by the JATS transform pipeline
//! and the batch orchestrator's ID normalizer — kept here, not in either
//! consumer, because both need it and neither should depend on the
//! other for it.

use crate::error::PmcError;

/// Normalize a PMCID-ish input (`"PMC7181753"`, `"pmc7181753"`,
/// `"7181753"`) to its canonical form: digits only, no prefix.
///
/// Idempotent: `normalize_pmcid(normalize_pmcid(s)?) == normalize_pmcid(s)`.
pub fn normalize_pmcid(input: &str) -> Result<String, PmcError> {
    let trimmed = input.trim();
    let without_prefix = if trimmed.len() >= 3 && trimmed[..3].eq_ignore_ascii_case("pmc") {
        &trimmed[3..]
    } else {
        trimmed
    };
    if !without_prefix.is_empty() && without_prefix.chars().all(|c| c.is_ascii_digit()) {
        Ok(without_prefix.to_string())
    } else {
        Err(PmcError::UnsupportedInput(format!(
            "not a valid PMCID: {input:?}"
        )))
    }
}

/// Is `input` syntactically a DOI (`10.<registrant>/<suffix>`)?
pub fn looks_like_doi(input: &str) -> bool {
    let trimmed = input.trim();
    match trimmed.split_once('/') {
        Some((prefix, suffix)) => {
            prefix.starts_with("10.")
                && prefix[3..].chars().all(|c| c.is_ascii_digit())
                && prefix.len() >= 7
                && !suffix.is_empty()
        }
        None => false,
    }
}

/// Is `input` plausibly a bare PMCID or PMID (all-digit, optionally
/// `PMC`-prefixed)? Used for `id-file` auto-detection before falling
/// back to PMID.
pub fn looks_like_pmcid_or_pmid(input: &str) -> bool {
    normalize_pmcid(input).is_ok()
}
