//! Batch fetch/orchestration layer for PMC articles: NCBI-facing HTTP
//! access, rate limiting, retry, ID normalization, and the auxiliary
//! BioC/OA/OAI-PMH/citation-export clients. Parsing and extraction live
//! in `papeline-jats`; this crate only acquires bytes and schedules work.

pub mod aux;
pub mod config;
pub mod fetch;
pub mod idconv;
pub mod orchestrator;
pub mod rate_limit;
pub mod retry_state;

pub use config::Config;
pub use fetch::{Fetcher, HttpFetcher, read_local, walk_directory};
pub use idconv::{HttpIdConverter, IdConverter, id_convert, id_convert_batch};
pub use orchestrator::{BatchSummary, LedgerEntry, Orchestrator, OrchestratorConfig, OutputMode, WorkItem};
pub use rate_limit::{CredentialPool, TokenBucket};
pub use retry_state::{FailureClass, RetryState, retry_with_backoff};
