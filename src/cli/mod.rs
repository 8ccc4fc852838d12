//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `resolve` | Resolve a manifest and list resources and dependencies |
//! | `order` | List the resources in build order, optionally for some targets |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Log events go to stderr. `--verbose` (or `-v`) enables debug events;
//! `SMAKE_LOG` accepts a full filter:
//! ```bash
//! SMAKE_LOG=smake=trace smake resolve
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod resolve;

pub use app::{run, Cli, Commands, LOG_ENV};
pub use output::{Output, OutputFormat};
