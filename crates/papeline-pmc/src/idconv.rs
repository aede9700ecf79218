//! ID Normalizer (C4): canonicalize PMCIDs and cross-resolve PMIDs/DOIs
//! to PMCIDs via NCBI's ID Converter service.

use papeline_core::{PmcError, http_client, normalize_pmcid};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

const IDCONV_URL: &str = "https://www.ncbi.nlm.nih.gov/pmc/utils/idconv/v1.0/";

/// Seam over the ID Converter HTTP call, mirroring [`crate::fetch::Fetcher`]
/// so conversion retries are unit-testable without live network calls.
pub trait IdConverter: Send + Sync {
    fn convert_remote(
        &self,
        ids: &[String],
        email: &str,
        timeout: Duration,
    ) -> Result<Vec<IdRecord>, PmcError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdRecord {
    #[serde(default)]
    pub pmcid: Option<String>,
    #[serde(default)]
    pub pmid: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct IdConvResponse {
    #[serde(default)]
    records: Vec<IdRecord>,
}

pub struct HttpIdConverter;

impl IdConverter for HttpIdConverter {
    fn convert_remote(
        &self,
        ids: &[String],
        email: &str,
        timeout: Duration,
    ) -> Result<Vec<IdRecord>, PmcError> {
        papeline_core::block_on(async move {
            let joined = ids.join(",");
            let resp = http_client()
                .get(IDCONV_URL)
                .timeout(timeout)
                .query(&[("ids", joined.as_str()), ("format", "json"), ("email", email)])
                .send()
                .await
                .map_err(|e| PmcError::from_reqwest(&e))?;

            let status = resp.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(PmcError::NetworkError(format!(
                    "id converter returned {status}"
                )));
            }
            if !status.is_success() {
                return Err(PmcError::NotFound(format!(
                    "id converter returned {status}"
                )));
            }

            let parsed: IdConvResponse = resp
                .json()
                .await
                .map_err(|e| PmcError::ParseError(format!("id converter response: {e}")))?;
            Ok(parsed.records)
        })
    }
}

/// Resolve any supported identifier (PMCID, PMID, or DOI) to a canonical
/// PMCID. Already-PMCID-shaped inputs bypass the network entirely.
pub fn id_convert(
    converter: &dyn IdConverter,
    any_id: &str,
    email: &str,
    timeout: Duration,
) -> Result<String, PmcError> {
    if let Ok(pmcid) = normalize_pmcid(any_id) {
        return Ok(pmcid);
    }
    let records = converter.convert_remote(&[any_id.to_string()], email, timeout)?;
    records
        .into_iter()
        .find_map(|r| r.pmcid)
        .and_then(|raw| normalize_pmcid(&raw).ok())
        .ok_or_else(|| PmcError::NotFound(format!("no PMCID mapping for {any_id}")))
}

/// Convert a batch of identifiers to PMCIDs, deduplicating the input
/// while preserving the order of first occurrence (§4.4).
pub fn id_convert_batch(
    converter: &dyn IdConverter,
    ids: &[String],
    email: &str,
    timeout: Duration,
) -> Vec<(String, Result<String, PmcError>)> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::new();
    for id in ids {
        if seen.insert(id.clone()) {
            deduped.push(id.clone());
        }
    }
    deduped
        .into_iter()
        .map(|id| {
            let result = id_convert(converter, &id, email, timeout);
            (id, result)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub struct StaticConverter(pub Vec<IdRecord>);

    impl IdConverter for StaticConverter {
        fn convert_remote(
            &self,
            _ids: &[String],
            _email: &str,
            _timeout: Duration,
        ) -> Result<Vec<IdRecord>, PmcError> {
            Ok(self.0.clone())
        }
    }

    pub struct AlwaysEmptyConverter;

    impl IdConverter for AlwaysEmptyConverter {
        fn convert_remote(
            &self,
            _ids: &[String],
            _email: &str,
            _timeout: Duration,
        ) -> Result<Vec<IdRecord>, PmcError> {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn pmcid_input_bypasses_network() {
        let converter = AlwaysEmptyConverter;
        let result = id_convert(&converter, "PMC7181753", "e@x.com", Duration::from_secs(1));
        assert_eq!(result.unwrap(), "7181753");
    }

    #[test]
    fn pmid_resolves_via_converter() {
        let converter = StaticConverter(vec![IdRecord {
            pmcid: Some("PMC123".to_string()),
            pmid: Some("456".to_string()),
            doi: None,
            status: None,
        }]);
        let result = id_convert(&converter, "456", "e@x.com", Duration::from_secs(1));
        assert_eq!(result.unwrap(), "123");
    }

    #[test]
    fn no_mapping_is_not_found() {
        let converter = AlwaysEmptyConverter;
        let result = id_convert(&converter, "456", "e@x.com", Duration::from_secs(1));
        assert!(matches!(result, Err(PmcError::NotFound(_))));
    }

    #[test]
    fn batch_deduplicates_preserving_first_occurrence_order() {
        let converter = StaticConverter(vec![IdRecord {
            pmcid: Some("PMC1".to_string()),
            pmid: None,
            doi: None,
            status: None,
        }]);
        let ids = vec!["456".to_string(), "789".to_string(), "456".to_string()];
        let results = id_convert_batch(&converter, &ids, "e@x.com", Duration::from_secs(1));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "456");
        assert_eq!(results[1].0, "789");
    }

    #[test]
    fn doi_input_resolves_via_converter() {
        let converter = StaticConverter(vec![IdRecord {
            pmcid: Some("PMC999".to_string()),
            pmid: None,
            doi: Some("10.1038/s41586-020-1234-5".to_string()),
            status: None,
        }]);
        let result = id_convert(
            &converter,
            "10.1038/s41586-020-1234-5",
            "e@x.com",
            Duration::from_secs(1),
        );
        assert_eq!(result.unwrap(), "999");
    }
}
