//! Papeline Core - ambient infrastructure shared by the PMC fetch/transform
//! pipeline: error kinds, configuration loading, logging, progress reporting,
//! graceful shutdown, the shared HTTP client/runtime, and retry backoff.

pub mod config;
pub mod error;
pub mod http;
pub mod ids;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;

pub use error::{ErrorKind, PmcError};
pub use http::{SHARED_RUNTIME, block_on, http_client};
pub use ids::{looks_like_doi, looks_like_pmcid_or_pmid, normalize_pmcid};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num, upgrade_to_bar};
pub use retry::BackoffPolicy;
pub use shutdown::{is_shutdown_requested, request_shutdown, shutdown_flag};
