//! `soh-curves` library crate.
//!
//! The binary (`soh`) is a thin wrapper around this library so that:
//!
//! - core logic (conditioning, fitting, EOL search) is testable without
//!   spawning processes
//! - modules are reusable (e.g., future dashboards, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod eol;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod stress;
