//! # Checker
//!
//! ```text
//! Idle ──run()──► Scanning ──► GraphBuilt ──► Passed
//!                    │                    └─► Failed
//!                    └── error ──► Idle
//! ```
//!
//! Every run rescans the tree and builds a new graph.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CheckerConfig;
use crate::error::CheckError;
use crate::graph::DependencyGraph;
use crate::report::CheckReport;
use crate::scanner::Scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Idle,
    Scanning,
    GraphBuilt,
    Passed,
    Failed,
}

#[derive(Debug)]
pub struct Checker {
    config: CheckerConfig,
    scanner: Scanner,
    state: CheckState,
}

impl Checker {
    /// # Errors
    ///
    /// [`CheckError::InvalidConfig`] or [`CheckError::Pattern`].
    pub fn new(config: CheckerConfig) -> Result<Self, CheckError> {
        config.validate()?;
        let scanner = Scanner::new(&config)?;
        Ok(Self {
            config,
            scanner,
            state: CheckState::Idle,
        })
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Scan, build the graph, and classify.
    ///
    /// # Errors
    ///
    /// Any [`CheckError`] from scanning. The checker returns to `Idle`.
    pub fn run(&mut self) -> Result<CheckReport, CheckError> {
        self.transition(CheckState::Scanning);
        let scanned = match self.scanner.scan(&self.config.root) {
            Ok(scanned) => scanned,
            Err(e) => {
                self.transition(CheckState::Idle);
                return Err(e);
            }
        };

        let graph = DependencyGraph::build(&scanned, &self.config);
        self.transition(CheckState::GraphBuilt);

        let cycles = graph.find_cycles();
        let violations = graph.violations().count();
        let status = if violations == 0 && cycles.is_empty() {
            CheckState::Passed
        } else {
            CheckState::Failed
        };
        self.transition(status);

        if status == CheckState::Passed {
            info!(modules = scanned.len(), edges = graph.edges().len(), "Isolation check passed");
        } else {
            warn!(
                modules = scanned.len(),
                violations,
                cycles = cycles.len(),
                "Isolation check failed"
            );
        }

        Ok(CheckReport::new(&self.config.root, status, &graph, cycles))
    }

    fn transition(&mut self, next: CheckState) {
        debug!(from = ?self.state, to = ?next, "Checker state");
        self.state = next;
    }
}
