//! OAI-PMH harvesting: `GetRecord`, and resumption-token-following
//! `ListRecords`/`ListIdentifiers` exposed as lazy iterators so a large
//! harvest never buffers more than one page in memory.

use papeline_core::{PmcError, http_client};
use papeline_jats::xmltree::{self, Xml};
use std::collections::VecDeque;
use std::time::Duration;

const OAI_URL: &str = "https://www.ncbi.nlm.nih.gov/pmc/oai/oai.cgi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiRecord {
    pub identifier: String,
    pub datestamp: String,
    pub metadata_xml: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OaiPage {
    pub records: Vec<OaiRecord>,
    pub resumption_token: Option<String>,
}

/// Parameters for a harvest, threaded through every page request.
#[derive(Debug, Clone, Default)]
pub struct OaiQuery {
    pub set: Option<String>,
    pub from: Option<String>,
    pub until: Option<String>,
    pub metadata_prefix: String,
}

pub trait OaiClient: Send + Sync {
    fn list_page(&self, verb: &str, query: &OaiQuery, resumption_token: Option<&str>, timeout: Duration) -> Result<OaiPage, PmcError>;
    fn get_record(&self, identifier: &str, metadata_prefix: &str, timeout: Duration) -> Result<OaiRecord, PmcError>;
}

pub struct HttpOaiClient;

impl OaiClient for HttpOaiClient {
    fn list_page(&self, verb: &str, query: &OaiQuery, resumption_token: Option<&str>, timeout: Duration) -> Result<OaiPage, PmcError> {
        papeline_core::block_on(async move {
            let mut params: Vec<(&str, &str)> = vec![("verb", verb)];
            if let Some(token) = resumption_token {
                params.push(("resumptionToken", token));
            } else {
                params.push(("metadataPrefix", &query.metadata_prefix));
                if let Some(set) = &query.set {
                    params.push(("set", set));
                }
                if let Some(from) = &query.from {
                    params.push(("from", from));
                }
                if let Some(until) = &query.until {
                    params.push(("until", until));
                }
            }

            let resp = http_client()
                .get(OAI_URL)
                .timeout(timeout)
                .query(&params)
                .send()
                .await
                .map_err(|e| PmcError::from_reqwest(&e))?;

            let status = resp.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(PmcError::NetworkError(format!("OAI-PMH returned {status}")));
            }
            if !status.is_success() {
                return Err(PmcError::ValidationError(format!("OAI-PMH returned {status}")));
            }

            let bytes = resp.bytes().await.map_err(|e| PmcError::from_reqwest(&e))?;
            parse_list_page(&bytes, verb)
        })
    }

    fn get_record(&self, identifier: &str, metadata_prefix: &str, timeout: Duration) -> Result<OaiRecord, PmcError> {
        papeline_core::block_on(async move {
            let resp = http_client()
                .get(OAI_URL)
                .timeout(timeout)
                .query(&[
                    ("verb", "GetRecord"),
                    ("identifier", identifier),
                    ("metadataPrefix", metadata_prefix),
                ])
                .send()
                .await
                .map_err(|e| PmcError::from_reqwest(&e))?;

            if !resp.status().is_success() {
                return Err(PmcError::NotFound(format!("OAI-PMH GetRecord: no such record {identifier}")));
            }
            let bytes = resp.bytes().await.map_err(|e| PmcError::from_reqwest(&e))?;
            let tree = xmltree::parse(&bytes)?;
            let record_el = tree
                .find_first(tree.root, "record")
                .ok_or_else(|| PmcError::NotFound(format!("no such record {identifier}")))?;
            parse_one_record(&tree, record_el)
        })
    }
}

fn parse_one_record(tree: &Xml, record_el: xmltree::ElementId) -> Result<OaiRecord, PmcError> {
    let header = tree
        .find_first(record_el, "header")
        .ok_or_else(|| PmcError::ParseError("OAI record missing header".to_string()))?;
    let identifier = tree
        .find_first(header, "identifier")
        .map(|id| tree.text_content(id))
        .unwrap_or_default();
    let datestamp = tree
        .find_first(header, "datestamp")
        .map(|id| tree.text_content(id))
        .unwrap_or_default();
    let metadata_xml = tree.find_first(record_el, "metadata").map(|id| tree.to_xml(id));
    Ok(OaiRecord { identifier, datestamp, metadata_xml })
}

fn parse_list_page(bytes: &[u8], verb: &str) -> Result<OaiPage, PmcError> {
    let tree = xmltree::parse(bytes)?;
    let list_tag = if verb == "ListIdentifiers" { "ListIdentifiers" } else { "ListRecords" };
    let list_el = tree
        .find_first(tree.root, list_tag)
        .ok_or_else(|| PmcError::ParseError(format!("OAI-PMH response missing {list_tag}")))?;

    let records = if verb == "ListIdentifiers" {
        tree.find_all(list_el, "header")
            .into_iter()
            .map(|header_id| {
                let identifier = tree.find_first(header_id, "identifier").map(|i| tree.text_content(i)).unwrap_or_default();
                let datestamp = tree.find_first(header_id, "datestamp").map(|i| tree.text_content(i)).unwrap_or_default();
                OaiRecord { identifier, datestamp, metadata_xml: None }
            })
            .collect()
    } else {
        tree.find_all(list_el, "record")
            .into_iter()
            .filter_map(|el_id| parse_one_record(&tree, el_id).ok())
            .collect()
    };

    let resumption_token = tree
        .find_first(list_el, "resumptionToken")
        .map(|id| tree.text_content(id))
        .filter(|s| !s.is_empty());

    Ok(OaiPage { records, resumption_token })
}

/// Lazily follows resumption tokens, yielding one [`OaiRecord`] at a time
/// without ever buffering more than the current page.
pub struct OaiHarvestIter<'a> {
    client: &'a dyn OaiClient,
    verb: &'static str,
    query: OaiQuery,
    timeout: Duration,
    buffer: VecDeque<OaiRecord>,
    next_token: Option<String>,
    started: bool,
    exhausted: bool,
}

impl<'a> OaiHarvestIter<'a> {
    pub fn list_records(client: &'a dyn OaiClient, query: OaiQuery, timeout: Duration) -> Self {
        Self::new(client, "ListRecords", query, timeout)
    }

    pub fn list_identifiers(client: &'a dyn OaiClient, query: OaiQuery, timeout: Duration) -> Self {
        Self::new(client, "ListIdentifiers", query, timeout)
    }

    fn new(client: &'a dyn OaiClient, verb: &'static str, query: OaiQuery, timeout: Duration) -> Self {
        Self {
            client,
            verb,
            query,
            timeout,
            buffer: VecDeque::new(),
            next_token: None,
            started: false,
            exhausted: false,
        }
    }

    fn fetch_next_page(&mut self) -> Result<(), PmcError> {
        let token = self.next_token.as_deref();
        let page = self.client.list_page(self.verb, &self.query, token, self.timeout)?;
        self.buffer.extend(page.records);
        self.next_token = page.resumption_token;
        self.started = true;
        if self.next_token.is_none() {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl<'a> Iterator for OaiHarvestIter<'a> {
    type Item = Result<OaiRecord, PmcError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            if self.started && self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_next_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
            if self.buffer.is_empty() && self.exhausted {
                return None;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::sync::Mutex;

    /// Serves a fixed sequence of pages in order, one per call.
    pub struct ScriptedOaiClient {
        pub pages: Mutex<VecDeque<OaiPage>>,
    }

    impl ScriptedOaiClient {
        pub fn new(pages: Vec<OaiPage>) -> Self {
            Self { pages: Mutex::new(pages.into_iter().collect()) }
        }
    }

    impl OaiClient for ScriptedOaiClient {
        fn list_page(&self, _verb: &str, _query: &OaiQuery, _token: Option<&str>, _timeout: Duration) -> Result<OaiPage, PmcError> {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| PmcError::ValidationError("no more scripted pages".to_string()))
        }

        fn get_record(&self, identifier: &str, _metadata_prefix: &str, _timeout: Duration) -> Result<OaiRecord, PmcError> {
            Ok(OaiRecord { identifier: identifier.to_string(), datestamp: "2024-01-01".to_string(), metadata_xml: None })
        }
    }
}
