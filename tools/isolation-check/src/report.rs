//! Check results and their text and JSON renderings.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::checker::CheckState;
use crate::error::CheckError;
use crate::graph::{DependencyEdge, DependencyGraph, ModuleNode};

pub const EXIT_PASSED: u8 = 0;
pub const EXIT_FAILED: u8 = 1;
pub const EXIT_ERROR: u8 = 2;

/// Outcome of one checker run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub root: PathBuf,
    pub status: CheckState,
    pub modules: Vec<ModuleNode>,
    pub violations: Vec<DependencyEdge>,
    pub cycles: Vec<Vec<String>>,
    pub edges: Vec<DependencyEdge>,
}

impl CheckReport {
    pub fn new(
        root: &Path,
        status: CheckState,
        graph: &DependencyGraph,
        cycles: Vec<Vec<String>>,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            status,
            modules: graph.nodes().cloned().collect(),
            violations: graph.violations().cloned().collect(),
            cycles,
            edges: graph.edges().to_vec(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CheckState::Passed
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            EXIT_PASSED
        } else {
            EXIT_FAILED
        }
    }

    /// `<module> -> <target_module> (via <import path>)` per violation.
    pub fn violation_lines(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// `cycle: a -> b -> a` per cycle.
    pub fn cycle_lines(&self) -> Vec<String> {
        self.cycles
            .iter()
            .map(|cycle| format!("cycle: {}", cycle.join(" -> ")))
            .collect()
    }

    /// Violations, then cycles, then a summary line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for line in self.violation_lines().into_iter().chain(self.cycle_lines()) {
            let _ = writeln!(out, "{line}");
        }
        let verdict = if self.passed() { "passed" } else { "failed" };
        let _ = writeln!(
            out,
            "isolation check {verdict}: {} modules, {} violations, {} cycles",
            self.modules.len(),
            self.violations.len(),
            self.cycles.len()
        );
        out
    }

    /// # Errors
    ///
    /// [`CheckError::Render`] if serialization fails.
    pub fn render_json(&self) -> Result<String, CheckError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
