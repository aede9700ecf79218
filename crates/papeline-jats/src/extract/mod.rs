//! Per-entity extraction routines. Each function walks the cleaned tree
//! and returns an empty/default value rather than failing — only
//! well-formedness problems surface as errors, and those are caught
//! earlier by the parser.

pub mod abstract_sec;
pub mod authors;
pub mod body;
pub mod citations;
pub mod dates;
pub mod equations;
pub mod figures;
pub mod misc;
pub mod permissions;
pub mod tables;
