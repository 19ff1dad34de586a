//! Checker configuration.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::CheckError;

/// Default directory holding one subdirectory (or file) per domain module.
pub const DEFAULT_ROOT: &str = "src/modules";

/// Default absolute prefix under which modules are addressed.
pub const DEFAULT_MODULE_PREFIX: &str = "crate::modules::";

/// What to scan and how to classify references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Directory whose children are the modules
    pub root: PathBuf,

    /// Module names that form the shared kernel; references to them are always allowed
    pub shared_kernel: BTreeSet<String>,

    /// Absolute path prefixes that address a module, e.g. `crate::modules::`.
    /// The segment after the prefix names the target module. An empty
    /// prefix treats the first segment of every path as a module name.
    pub module_prefixes: Vec<String>,

    /// Submodules other modules may reference, e.g. `events`
    pub public_surfaces: BTreeSet<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            shared_kernel: BTreeSet::from(["shared".to_string()]),
            module_prefixes: vec![DEFAULT_MODULE_PREFIX.to_string()],
            public_surfaces: BTreeSet::from(["events".to_string()]),
        }
    }
}

impl CheckerConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_shared_kernel<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared_kernel = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_module_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_public_surfaces<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_surfaces = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// [`CheckError::InvalidConfig`] when no prefix is configured or a prefix
    /// does not end in `::`.
    pub fn validate(&self) -> Result<(), CheckError> {
        if self.module_prefixes.is_empty() {
            return Err(CheckError::InvalidConfig(
                "at least one module prefix is required".to_string(),
            ));
        }
        if let Some(bad) = self
            .module_prefixes
            .iter()
            .find(|p| !p.is_empty() && !p.ends_with("::"))
        {
            return Err(CheckError::InvalidConfig(format!(
                "module prefix must end with '::': {bad}"
            )));
        }
        Ok(())
    }

    pub fn is_shared(&self, module: &str) -> bool {
        self.shared_kernel.contains(module)
    }

    pub fn is_public_surface(&self, submodule: &str) -> bool {
        self.public_surfaces.contains(submodule)
    }
}
