//! Track ingestion: discovery and deduplication, decoding, admission.

pub mod decode;
pub mod discover;
pub mod loader;
