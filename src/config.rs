/// What to do with every discovered project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    List,
    Upgrade,
}

/// Settings consumed by the upgrade policy and executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeConfig {
    pub dry_run: bool,
    pub major_upgrades: bool,
    pub check_tasks: Vec<String>,
    pub commit: bool,
    pub push: bool,
}

pub const DEFAULT_CHECK_TASKS: &[&str] = &["clean", "build", "assemble"];

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            major_upgrades: false,
            check_tasks: DEFAULT_CHECK_TASKS.iter().map(|t| t.to_string()).collect(),
            commit: true,
            push: true,
        }
    }
}

/// Options for analyzing a single project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Fetch from the remote before reading ahead/behind counts.
    pub fetch_remote: bool,
}

impl AnalyzeOptions {
    pub fn for_run(mode: RunMode, config: &UpgradeConfig) -> Self {
        Self {
            fetch_remote: mode == RunMode::Upgrade && !config.dry_run,
        }
    }
}
