use std::path::PathBuf;

/// Everything collected about one discovered Gradle project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    /// Canonical root of the build; identifies the project.
    pub project_dir: PathBuf,
    pub gradle_version: String,
    /// Latest release the project was compared against.
    pub latest_version: String,
    pub up_to_date: bool,
    pub same_major_as_latest: bool,
    pub vcs: VcsStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsStatus {
    NotTracked,
    Tracked {
        branch: String,
        clean: bool,
        remote: RemoteSync,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSync {
    NoUpstream,
    Tracking { ahead: u32, behind: u32 },
}

impl RemoteSync {
    pub fn is_in_sync(&self) -> bool {
        match self {
            RemoteSync::NoUpstream => true,
            RemoteSync::Tracking { ahead, behind } => *ahead == 0 && *behind == 0,
        }
    }
}

impl ProjectMetadata {
    pub fn is_under_version_control(&self) -> bool {
        matches!(self.vcs, VcsStatus::Tracked { .. })
    }

    pub fn branch(&self) -> Option<&str> {
        match &self.vcs {
            VcsStatus::Tracked { branch, .. } => Some(branch),
            VcsStatus::NotTracked => None,
        }
    }

    /// `true` when in sync with the upstream or when there is nothing to sync with.
    pub fn is_in_sync_with_remote(&self) -> bool {
        match &self.vcs {
            VcsStatus::NotTracked => true,
            VcsStatus::Tracked { remote, .. } => remote.is_in_sync(),
        }
    }
}
