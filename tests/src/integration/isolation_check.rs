//! # Isolation Check Scenarios
//!
//! The checker against module trees shaped like the runtime's, including
//! the runtime's own `modules/` directory.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use kb_isolation_check::{CheckState, Checker, CheckerConfig, EXIT_FAILED, EXIT_PASSED};
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn runtime_modules() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../crates/kb-runtime/src/modules")
    }

    #[test]
    fn test_runtime_modules_are_isolated() {
        let mut checker = Checker::new(CheckerConfig::new(runtime_modules())).unwrap();
        let report = checker.run().unwrap();

        assert!(report.passed(), "{}", report.render_text());
        assert_eq!(report.exit_code(), EXIT_PASSED);
        assert_eq!(report.modules.len(), shared_types::ModuleId::INIT_ORDER.len());
    }

    #[test]
    fn test_direct_service_import_is_reported() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "shared/mod.rs", "pub struct ResourceId(pub String);\n");
        write(
            dir.path(),
            "quality/mod.rs",
            "pub mod service;\npub mod events;\n",
        );
        write(dir.path(), "quality/service.rs", "pub fn score() -> f64 { 0.5 }\n");
        write(dir.path(), "quality/events.rs", "pub const COMPUTED: &str = \"quality.computed\";\n");
        write(
            dir.path(),
            "curation/mod.rs",
            "\
use crate::modules::shared::ResourceId;
use crate::modules::quality::events::COMPUTED;

pub fn review(_id: ResourceId) -> f64 {
    let _ = COMPUTED;
    crate::modules::quality::service::score()
}
",
        );

        let mut checker = Checker::new(CheckerConfig::new(dir.path())).unwrap();
        let report = checker.run().unwrap();

        assert_eq!(checker.state(), CheckState::Failed);
        assert_eq!(report.exit_code(), EXIT_FAILED);
        assert_eq!(
            report.violation_lines(),
            vec!["curation -> quality (via crate::modules::quality::service::score)"]
        );
        assert_eq!(report.violations[0].line, 6);

        let json: serde_json::Value = serde_json::from_str(&report.render_json().unwrap()).unwrap();
        assert_eq!(json["violations"].as_array().unwrap().len(), 1);
        assert_eq!(json["status"], "failed");
    }
}
