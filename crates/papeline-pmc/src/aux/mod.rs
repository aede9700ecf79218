//! Auxiliary Service Clients (C10): thin request-and-parse wrappers over
//! NCBI endpoints outside the main fetch/transform path. Each shares the
//! rate limiter and retry policy the caller already holds rather than
//! managing its own.

pub mod bioc;
pub mod cite;
pub mod oa;
pub mod oai;
