//! XML Access Layer (C1): acquire JATS XML bytes from HTTP, disk, or a
//! directory walk. Performs no parsing — callers get bytes plus enough
//! context to build a useful error message.

use papeline_core::{PmcError, http_client};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENTREZ_EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Default per-request timeout (§5, overridable via `TIMEOUT`).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Seam so retry/rate-limit logic is unit-testable without live network
/// calls. `HttpFetcher` is the production implementation.
pub trait Fetcher: Send + Sync {
    fn fetch_remote(
        &self,
        pmcid: &str,
        email: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Vec<u8>, PmcError>;
}

pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch_remote(
        &self,
        pmcid: &str,
        email: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Vec<u8>, PmcError> {
        papeline_core::block_on(async move {
            let mut req = http_client()
                .get(ENTREZ_EFETCH_URL)
                .timeout(timeout)
                .query(&[
                    ("db", "pmc"),
                    ("id", pmcid),
                    ("rettype", "full"),
                    ("retmode", "xml"),
                    ("email", email),
                ]);
            if let Some(key) = api_key {
                req = req.query(&[("api_key", key)]);
            }

            let resp = req.send().await.map_err(|e| PmcError::from_reqwest(&e))?;
            let status = resp.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(PmcError::NetworkError(format!(
                    "efetch returned {status} for {pmcid}"
                )));
            }
            if !status.is_success() {
                return Err(PmcError::NotFound(format!(
                    "efetch returned {status} for {pmcid}"
                )));
            }

            let bytes = resp.bytes().await.map_err(|e| PmcError::from_reqwest(&e))?;
            if bytes.is_empty() {
                return Err(PmcError::NotFound(format!("empty response for {pmcid}")));
            }
            Ok(bytes.to_vec())
        })
    }
}

/// Read JATS XML bytes from a local file.
pub fn read_local(path: &Path) -> Result<Vec<u8>, PmcError> {
    if !path.exists() {
        return Err(PmcError::NotFound(path.display().to_string()));
    }
    std::fs::read(path).map_err(PmcError::from)
}

/// List `*.xml` files directly inside `dir`, sorted lexicographically for
/// deterministic ledger ordering.
pub fn walk_directory(dir: &Path) -> Result<Vec<PathBuf>, PmcError> {
    let entries = std::fs::read_dir(dir).map_err(PmcError::from)?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("xml"))
        .collect();
    paths.sort();
    Ok(paths)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::time::Duration;

    #[test]
    fn read_local_missing_file_is_not_found() {
        let result = read_local(Path::new("/nonexistent/path.xml"));
        assert!(matches!(result, Err(PmcError::NotFound(_))));
    }

    #[test]
    fn walk_directory_sorts_and_filters_xml() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.xml", "a.xml", "c.txt"] {
            std::fs::write(dir.path().join(name), b"<x/>").unwrap();
        }
        let files = walk_directory(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn static_fetcher_returns_fixture() {
        let fetcher = StaticFetcher(b"<article/>".to_vec());
        let bytes = fetcher
            .fetch_remote("123", "test@example.com", None, Duration::from_secs(1))
            .unwrap();
        assert_eq!(bytes, b"<article/>");
    }

    #[test]
    fn fail_n_times_then_succeeds() {
        let fetcher = FailNTimesFetcher {
            n: std::sync::atomic::AtomicUsize::new(2),
            payload: b"<article/>".to_vec(),
        };
        assert!(fetcher.fetch_remote("1", "e@x.com", None, Duration::from_secs(1)).is_err());
        assert!(fetcher.fetch_remote("1", "e@x.com", None, Duration::from_secs(1)).is_err());
        assert!(fetcher.fetch_remote("1", "e@x.com", None, Duration::from_secs(1)).is_ok());
    }
}
