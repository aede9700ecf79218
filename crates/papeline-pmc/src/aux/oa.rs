//! Open Access (OA) lookup: resolves a PMCID to its OA package download
//! links (tgz/pdf) and the governing license, per the `oa.fcgi` contract.

use papeline_core::{PmcError, http_client};
use papeline_jats::xmltree;
use std::time::Duration;

const OA_URL: &str = "https://www.ncbi.nlm.nih.gov/pmc/utils/oa/oa.fcgi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaLink {
    pub format: String,
    pub href: String,
}

#[derive(Debug, Clone, Default)]
pub struct OaRecord {
    pub pmcid: String,
    pub license: Option<String>,
    pub links: Vec<OaLink>,
}

pub trait OaClient: Send + Sync {
    fn lookup_remote(&self, pmcid: &str, timeout: Duration) -> Result<OaRecord, PmcError>;
}

pub struct HttpOaClient;

impl OaClient for HttpOaClient {
    fn lookup_remote(&self, pmcid: &str, timeout: Duration) -> Result<OaRecord, PmcError> {
        papeline_core::block_on(async move {
            let resp = http_client()
                .get(OA_URL)
                .timeout(timeout)
                .query(&[("id", format!("PMC{pmcid}").as_str())])
                .send()
                .await
                .map_err(|e| PmcError::from_reqwest(&e))?;

            let status = resp.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(PmcError::NetworkError(format!("OA service returned {status} for {pmcid}")));
            }
            if !status.is_success() {
                return Err(PmcError::NotFound(format!("OA service returned {status} for {pmcid}")));
            }

            let bytes = resp.bytes().await.map_err(|e| PmcError::from_reqwest(&e))?;
            parse_oa_response(&bytes, pmcid)
        })
    }
}

fn parse_oa_response(bytes: &[u8], pmcid: &str) -> Result<OaRecord, PmcError> {
    let tree = xmltree::parse(bytes)?;
    let record_el = tree
        .find_first(tree.root, "record")
        .ok_or_else(|| PmcError::NotFound(format!("no OA record for {pmcid}")))?;

    let license = tree.get(record_el).attr("license").map(|s| s.to_string());

    let links = tree
        .find_all(record_el, "link")
        .into_iter()
        .filter_map(|link_id| {
            let el = tree.get(link_id);
            match (el.attr("format"), el.attr("href")) {
                (Some(format), Some(href)) => Some(OaLink {
                    format: format.to_string(),
                    href: href.to_string(),
                }),
                _ => None,
            }
        })
        .collect();

    Ok(OaRecord {
        pmcid: pmcid.to_string(),
        license,
        links,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<OA>
      <records returned-count="1">
        <record id="PMC7181753" license="CC BY">
          <link format="tgz" href="ftp://example.org/7181753.tar.gz"/>
          <link format="pdf" href="ftp://example.org/7181753.pdf"/>
        </record>
      </records>
    </OA>"#;

    #[test]
    fn parses_license_and_links() {
        let record = parse_oa_response(SAMPLE.as_bytes(), "7181753").unwrap();
        assert_eq!(record.license.as_deref(), Some("CC BY"));
        assert_eq!(record.links.len(), 2);
        assert_eq!(record.links[0].format, "tgz");
    }

    #[test]
    fn missing_record_is_not_found() {
        let result = parse_oa_response(b"<OA><records returned-count=\"0\"/></OA>", "1");
        assert!(matches!(result, Err(PmcError::NotFound(_))));
    }
}
