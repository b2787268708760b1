//! Input/output: CSV conditioning, results export, and model JSON files.

pub mod curve;
pub mod export;
pub mod ingest;
