pub mod gradle_execution;
pub mod project_analyzer;
pub mod project_metadata;
pub mod project_scanner;
pub mod upgrade_executor;
pub mod upgrade_policy;
pub mod version_control;

pub use gradle_execution::{SystemWrapperLauncher, WrapperBackend};
pub use project_analyzer::ProjectAnalyzer;
pub use project_metadata::ProjectMetadata;
pub use project_scanner::{ProjectScannerAgent, ScanSummary};
pub use upgrade_executor::{UpgradeExecutor, UpgradeOutcome};
pub use upgrade_policy::UpgradeDecisionPolicy;
pub use version_control::GitCli;
