//! Migrates direct console output in TypeScript sources to a project logger.
//!
//! The [`Rewriter`] decides, one file at a time, whether console calls are present, whether the
//! logger import must be added and where, and substitutes the call sites. The [`Walker`] runs it
//! over a source tree and accumulates a [`Summary`].

pub mod calls;
pub mod config;
pub mod error;
pub mod imports;
pub mod rewrite;
pub mod walk;

pub use config::{ImportStyle, MissingAnchorPolicy, Preset, RewriteConfig, RootPrefix, RunConfig};
pub use error::{ConfigError, RewriteError};
pub use imports::ImportStatement;
pub use rewrite::{Rewrite, RewriteDecision, Rewriter, rewrite};
pub use walk::{FileOutcome, Mode, Summary, Walker, collect_candidates};
