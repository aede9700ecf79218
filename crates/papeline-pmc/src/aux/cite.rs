//! Citation export: MEDLINE, BibTeX, RIS, NBIB, and PubMed plain-text
//! formats, via Entrez efetch's `rettype`/`retmode` contract.

use papeline_core::{PmcError, http_client};
use std::time::Duration;

const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiteFormat {
    Medline,
    BibTex,
    Ris,
    Nbib,
    PubMed,
}

impl CiteFormat {
    fn rettype(self) -> &'static str {
        match self {
            Self::Medline => "medline",
            Self::BibTex => "bibtex",
            Self::Ris => "ris",
            Self::Nbib => "nbib",
            Self::PubMed => "abstract",
        }
    }
}

pub trait CiteClient: Send + Sync {
    fn export(&self, pmcid: &str, format: CiteFormat, email: &str, timeout: Duration) -> Result<String, PmcError>;
}

pub struct HttpCiteClient;

impl CiteClient for HttpCiteClient {
    fn export(&self, pmcid: &str, format: CiteFormat, email: &str, timeout: Duration) -> Result<String, PmcError> {
        papeline_core::block_on(async move {
            let resp = http_client()
                .get(EFETCH_URL)
                .timeout(timeout)
                .query(&[
                    ("db", "pmc"),
                    ("id", pmcid),
                    ("rettype", format.rettype()),
                    ("retmode", "text"),
                    ("email", email),
                ])
                .send()
                .await
                .map_err(|e| PmcError::from_reqwest(&e))?;

            let status = resp.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(PmcError::NetworkError(format!("citation export returned {status} for {pmcid}")));
            }
            if !status.is_success() {
                return Err(PmcError::NotFound(format!("citation export returned {status} for {pmcid}")));
            }

            let text = resp.text().await.map_err(|e| PmcError::from_reqwest(&e))?;
            if text.trim().is_empty() {
                return Err(PmcError::NotFound(format!("empty citation export for {pmcid}")));
            }
            Ok(text)
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub struct StaticCiteClient(pub String);

    impl CiteClient for StaticCiteClient {
        fn export(&self, _pmcid: &str, _format: CiteFormat, _email: &str, _timeout: Duration) -> Result<String, PmcError> {
            Ok(self.0.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn rettype_mapping_is_distinct_per_format() {
        let formats = [CiteFormat::Medline, CiteFormat::BibTex, CiteFormat::Ris, CiteFormat::Nbib, CiteFormat::PubMed];
        let rettypes: std::collections::HashSet<_> = formats.iter().map(|f| f.rettype()).collect();
        assert_eq!(rettypes.len(), formats.len());
    }

    #[test]
    fn static_client_returns_fixture() {
        let client = StaticCiteClient("PMID- 32572199\n".to_string());
        let body = client
            .export("7181753", CiteFormat::Medline, "e@x.com", Duration::from_secs(1))
            .unwrap();
        assert!(body.starts_with("PMID-"));
    }
}
