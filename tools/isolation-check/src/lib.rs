//! # KB Isolation Check
//!
//! Build-time gate for module isolation: domain modules may reference the
//! shared kernel and each other's public event surface, never each
//! other's internals.
//!
//! ```text
//! src/modules/            Scanner            DependencyGraph         CheckReport
//! ├── search/   ──────►  use + inline  ───►  nodes, edges,  ───►  violations,
//! ├── quality/           paths               classification        cycles, exit code
//! └── shared/
//! ```
//!
//! The checker never runs module code; sources are scanned as text.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kb_isolation_check::{Checker, CheckerConfig};
//!
//! let mut checker = Checker::new(CheckerConfig::new("crates/app/src/modules"))?;
//! let report = checker.run()?;
//! print!("{}", report.render_text());
//! std::process::exit(i32::from(report.exit_code()));
//! # Ok::<(), kb_isolation_check::CheckError>(())
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod checker;
pub mod config;
pub mod error;
pub mod graph;
pub mod report;
pub mod scanner;

pub use checker::{CheckState, Checker};
pub use config::{CheckerConfig, DEFAULT_MODULE_PREFIX, DEFAULT_ROOT};
pub use error::CheckError;
pub use graph::{Classification, DependencyEdge, DependencyGraph, ModuleNode};
pub use report::{CheckReport, EXIT_ERROR, EXIT_FAILED, EXIT_PASSED};
pub use scanner::{Reference, ScannedModule, Scanner, SourceFile};
