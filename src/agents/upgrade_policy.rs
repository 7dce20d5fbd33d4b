use crate::agents::project_metadata::{ProjectMetadata, RemoteSync, VcsStatus};
use crate::config::UpgradeConfig;

/// Whether a project may be upgraded, and what stands in the way if not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeDecision {
    pub eligible: bool,
    pub reasons: Vec<String>,
}

impl UpgradeDecision {
    fn up_to_date() -> Self {
        Self {
            eligible: false,
            reasons: Vec::new(),
        }
    }

    /// Not eligible because of at least one blocker, as opposed to having
    /// nothing to do.
    pub fn is_blocked(&self) -> bool {
        !self.reasons.is_empty()
    }
}

pub struct UpgradeDecisionPolicy;

impl UpgradeDecisionPolicy {
    /// Evaluate every blocking rule so all blockers are reported together.
    pub fn evaluate(project: &ProjectMetadata, config: &UpgradeConfig) -> UpgradeDecision {
        if project.up_to_date {
            return UpgradeDecision::up_to_date();
        }

        let mut reasons = Vec::new();

        if let VcsStatus::Tracked { branch, clean, remote } = &project.vcs {
            if !clean {
                reasons.push("working directory not clean".to_string());
            }
            match remote {
                RemoteSync::Tracking { ahead, behind } if !project.is_in_sync_with_remote() => {
                    reasons.push(format!(
                        "branch {branch} not in sync with remote: {ahead} ahead, {behind} behind"
                    ));
                }
                _ => {}
            }
        }

        if !project.same_major_as_latest && !config.major_upgrades {
            reasons.push("not the same major version and major upgrades disabled".to_string());
        }

        UpgradeDecision {
            eligible: reasons.is_empty(),
            reasons,
        }
    }
}
