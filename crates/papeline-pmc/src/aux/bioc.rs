//! BioC fetch: retrieve a PMC article in the BioC XML interchange
//! format, used by downstream NLP/annotation consumers that don't want
//! our JATS-derived schema.

use papeline_core::{PmcError, http_client};
use std::time::Duration;

const BIOC_URL: &str = "https://www.ncbi.nlm.nih.gov/research/bionlp/RESTful/pmcoa.cgi/BioC_xml";

pub trait BiocClient: Send + Sync {
    fn fetch_bioc(&self, pmcid: &str, timeout: Duration) -> Result<String, PmcError>;
}

pub struct HttpBiocClient;

impl BiocClient for HttpBiocClient {
    fn fetch_bioc(&self, pmcid: &str, timeout: Duration) -> Result<String, PmcError> {
        papeline_core::block_on(async move {
            let url = format!("{BIOC_URL}/{pmcid}/unicode");
            let resp = http_client()
                .get(&url)
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| PmcError::from_reqwest(&e))?;

            let status = resp.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(PmcError::NetworkError(format!("BioC returned {status} for {pmcid}")));
            }
            if !status.is_success() {
                return Err(PmcError::NotFound(format!("BioC returned {status} for {pmcid}")));
            }

            resp.text().await.map_err(|e| PmcError::from_reqwest(&e))
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn static_client_returns_fixture_body() {
        let client = StaticBiocClient("<collection/>".to_string());
        let body = client.fetch_bioc("7181753", Duration::from_secs(1)).unwrap();
        assert_eq!(body, "<collection/>");
    }
}
