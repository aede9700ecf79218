//! Batch Orchestrator (C9): fans a set of inputs out across a bounded
//! worker pool, honoring the rate limiter and retry policy per item, and
//! assembles a ledger plus summary once every item has settled.
//!
//! Bounded parallelism is `rayon`'s thread pool, the same mechanism
//! `papeline-pubmed`'s runner used for its manifest-driven file fan-out.
//! `rayon::iter::ParallelIterator::collect` preserves source order
//! regardless of completion order, which is what gives the ledger its
//! input-order guarantee for free.

use crate::fetch::Fetcher;
use crate::rate_limit::{CredentialPool, TokenBucket};
use crate::retry_state::retry_with_backoff;
use indexmap::IndexMap;
use papeline_core::{BackoffPolicy, ErrorKind, PmcError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One unit of work: either a remote PMCID to fetch, or a local JATS
/// file already on disk.
#[derive(Debug, Clone)]
pub enum WorkItem {
    Pmcid(String),
    LocalPath(PathBuf),
}

impl WorkItem {
    fn label(&self) -> String {
        match self {
            Self::Pmcid(id) => id.clone(),
            Self::LocalPath(p) => p.display().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub item: String,
    pub attempts: u32,
    pub result: Result<String, (ErrorKind, String)>,
}

impl LedgerEntry {
    fn from_error(label: &str, err: PmcError) -> Self {
        Self::from_error_with_attempts(label, err, 1)
    }

    fn from_error_with_attempts(label: &str, err: PmcError, attempts: u32) -> Self {
        Self {
            item: label.to_string(),
            attempts,
            result: Err((err.kind(), err.to_string())),
        }
    }

    /// Build a ledger entry for an item that never reached the
    /// orchestrator (e.g. a PMID/DOI that failed ID-conversion up
    /// front). Recorded the same way a fetch failure would be, at one
    /// attempt.
    pub fn unresolved(label: &str, err: PmcError) -> Self {
        Self::from_error_with_attempts(label, err, 1)
    }
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub total_requested: usize,
    pub successful: usize,
    pub failed: usize,
    pub error_counts: IndexMap<String, usize>,
    pub elapsed_seconds: f64,
    pub failed_items: Vec<String>,
}

/// Whether successful documents land as one file per item or as lines in
/// a single newline-delimited JSON stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    PerItem,
    Stream,
}

pub struct OrchestratorConfig {
    pub workers: usize,
    pub timeout: Duration,
    pub max_attempts: u32,
    /// When set, each successfully parsed document is materialized here
    /// (as `PMC<id>.json` files, or a single `stream.jsonl`, depending
    /// on `output_mode`). When `None`, the orchestrator only reports the
    /// ledger (used by `aux` subcommands that don't materialize files).
    pub output_dir: Option<PathBuf>,
    pub output_mode: OutputMode,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            timeout: crate::fetch::DEFAULT_TIMEOUT,
            max_attempts: 3,
            output_dir: None,
            output_mode: OutputMode::default(),
        }
    }
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    rate_limiter: TokenBucket,
    credentials: CredentialPool,
    fetcher: Box<dyn Fetcher>,
    backoff: BackoffPolicy,
    cancel: Arc<AtomicBool>,
    stream_file: std::sync::Mutex<Option<std::fs::File>>,
}

impl Orchestrator {
    pub fn new(fetcher: Box<dyn Fetcher>, credentials: CredentialPool, config: OrchestratorConfig) -> Self {
        let rate_limiter = TokenBucket::for_api_key(credentials.has_api_key());
        Self {
            config,
            rate_limiter,
            credentials,
            fetcher,
            backoff: BackoffPolicy::default(),
            cancel: Arc::new(AtomicBool::new(false)),
            stream_file: std::sync::Mutex::new(None),
        }
    }

    /// A handle the caller can flip to cancel a run programmatically,
    /// independent of the process-wide SIGINT/SIGTERM flag.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed) || papeline_core::is_shutdown_requested()
    }

    pub fn process(&self, items: &[WorkItem]) -> (Vec<LedgerEntry>, BatchSummary) {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .build()
            .expect("failed to build worker thread pool");

        let ledger: Vec<LedgerEntry> = pool.install(|| {
            items.par_iter().map(|item| self.process_one(item)).collect()
        });

        let elapsed_seconds = start.elapsed().as_secs_f64();
        let successful = ledger.iter().filter(|e| e.result.is_ok()).count();
        let mut error_counts: IndexMap<String, usize> = IndexMap::new();
        let mut failed_items = Vec::new();
        for entry in &ledger {
            if let Err((kind, _)) = &entry.result {
                *error_counts.entry(kind.to_string()).or_insert(0) += 1;
                failed_items.push(entry.item.clone());
            }
        }

        let summary = BatchSummary {
            total_requested: items.len(),
            successful,
            failed: ledger.len() - successful,
            error_counts,
            elapsed_seconds,
            failed_items,
        };
        (ledger, summary)
    }

    fn process_one(&self, item: &WorkItem) -> LedgerEntry {
        let label = item.label();
        let cancelled = || self.is_cancelled();

        if cancelled() {
            return LedgerEntry::from_error(&label, PmcError::Cancelled);
        }

        let (bytes, attempts) = match item {
            WorkItem::LocalPath(path) => (crate::fetch::read_local(path), 1),
            WorkItem::Pmcid(pmcid) => {
                let email = self.credentials.next_email();
                let api_key = self.credentials.api_key().map(|s| s.to_string());
                let outcome = retry_with_backoff(
                    self.config.max_attempts,
                    &self.backoff,
                    &cancelled,
                    |_attempt| {
                        self.rate_limiter.acquire(&cancelled)?;
                        self.fetcher
                            .fetch_remote(pmcid, &email, api_key.as_deref(), self.config.timeout)
                    },
                );
                (outcome.result, outcome.attempts)
            }
        };

        let bytes = match bytes {
            Ok(b) => b,
            Err(e) => return LedgerEntry::from_error_with_attempts(&label, e, attempts),
        };

        let doc = match papeline_jats::parse_article(&bytes) {
            Ok(d) => d,
            Err(e) => return LedgerEntry::from_error_with_attempts(&label, e, attempts),
        };

        if let Some(dir) = &self.config.output_dir {
            let write_result = match self.config.output_mode {
                OutputMode::PerItem => write_artifact(dir, &doc),
                OutputMode::Stream => self.append_stream_line(dir, &doc),
            };
            if let Err(e) = write_result {
                return LedgerEntry::from_error_with_attempts(&label, e, attempts);
            }
        }

        LedgerEntry {
            item: label,
            attempts,
            result: Ok(doc.pmc_id.clone()),
        }
    }

    /// Append one compact-JSON line to `<dir>/stream.jsonl`, opening the
    /// file on first use and holding it for the life of the run. Workers
    /// serialize through the mutex rather than each other's `io::Write`
    /// calls, so lines never interleave.
    fn append_stream_line(&self, dir: &Path, doc: &papeline_jats::Document) -> Result<(), PmcError> {
        use std::io::Write;
        let mut guard = self.stream_file.lock().expect("stream file lock poisoned");
        if guard.is_none() {
            std::fs::create_dir_all(dir)?;
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("stream.jsonl"))?;
            *guard = Some(file);
        }
        let file = guard.as_mut().expect("stream file just initialized");
        papeline_jats::write_stream_line(file, doc)?;
        file.flush()?;
        Ok(())
    }
}

fn write_artifact(dir: &Path, doc: &papeline_jats::Document) -> Result<(), PmcError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(papeline_jats::artifact_filename(&doc.pmc_id));
    let json = papeline_jats::to_artifact_string(doc)?;
    std::fs::write(path, json)?;
    Ok(())
}
