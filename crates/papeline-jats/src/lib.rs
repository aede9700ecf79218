//! JATS XML parsing, cleaning, extraction, and serialization.
//!
//! This crate has no networking dependency: it turns JATS XML bytes
//! (however they were acquired) into a structured [`Document`] and a
//! serialized artifact. Fetching, retrying, and batching live in
//! `papeline-pmc`.

pub mod assemble;
pub mod clean;
pub mod document;
pub mod extract;
pub mod serialize;
pub mod xmltree;

pub use assemble::parse_article;
pub use document::{Author, BodyNode, Citation, Document, Equation, Figure, Paragraph, Table};
pub use serialize::{artifact_filename, to_artifact_string, write_stream_line};
