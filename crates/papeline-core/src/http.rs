//! Shared HTTP client and async-to-sync runtime bridge.
//!
//! Worker code in `papeline-pmc` runs on a `rayon` thread pool and is
//! synchronous; the NCBI clients are built on async `reqwest`. A single
//! multi-thread `tokio` runtime is kept alive for the process and `block_on`
//! bridges the two, the same split used elsewhere in this codebase for
//! mixing a rayon-driven worker pool with async HTTP.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout for the shared HTTP client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Get the shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for bridging async HTTP calls into sync worker code.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Run an async future to completion on the shared runtime from sync code.
pub fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    SHARED_RUNTIME.handle().block_on(fut)
}
