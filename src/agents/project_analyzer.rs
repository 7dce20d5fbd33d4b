use crate::agents::project_metadata::{ProjectMetadata, RemoteSync, VcsStatus};
use crate::agents::version_control::{FetchOutcome, VcsBackend};
use crate::config::AnalyzeOptions;
use crate::error::{Result, SweepError};
use crate::gradle::backend::{BuildBackend, has_wrapper};
use crate::gradle::releases::VersionProvider;
use crate::gradle::version::VersionComparator;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Inspects a single project directory.
pub struct ProjectAnalyzer<'a> {
    build: &'a dyn BuildBackend,
    vcs: &'a dyn VcsBackend,
    versions: &'a dyn VersionProvider,
    options: AnalyzeOptions,
}

impl<'a> ProjectAnalyzer<'a> {
    pub fn new(
        build: &'a dyn BuildBackend,
        vcs: &'a dyn VcsBackend,
        versions: &'a dyn VersionProvider,
        options: AnalyzeOptions,
    ) -> Self {
        Self {
            build,
            vcs,
            versions,
            options,
        }
    }

    /// Collect metadata for `project_dir`, or `None` when it has no wrapper.
    pub fn analyze(&self, project_dir: &Path) -> Result<Option<ProjectMetadata>> {
        // Only projects that use the wrapper are managed.
        if !has_wrapper(project_dir) {
            debug!("no wrapper in {}, skipping", project_dir.display());
            return Ok(None);
        }

        let failed = |e: SweepError| match e {
            SweepError::FetchFailed(_) => e,
            other => SweepError::AnalysisFailed {
                project: project_dir.display().to_string(),
                message: other.to_string(),
            },
        };

        let (gradle_version, root) = self.analyze_gradle(project_dir).map_err(failed)?;
        let latest_version = self.versions.latest()?;

        let up_to_date =
            VersionComparator::compare(&gradle_version, &latest_version).map_err(failed)?
                != Ordering::Less;
        let same_major_as_latest =
            VersionComparator::is_same_major(&gradle_version, &latest_version).map_err(failed)?;

        let vcs = self.analyze_git(&root).map_err(failed)?;

        Ok(Some(ProjectMetadata {
            project_dir: root,
            gradle_version,
            latest_version,
            up_to_date,
            same_major_as_latest,
            vcs,
        }))
    }

    fn analyze_gradle(&self, project_dir: &Path) -> Result<(String, PathBuf)> {
        let connection = self.build.connect(project_dir)?;
        let version = connection.gradle_version()?;
        let root = connection.canonical_root()?;
        Ok((version, root))
    }

    fn analyze_git(&self, project_dir: &Path) -> Result<VcsStatus> {
        let Some(repository) = self.vcs.locate(project_dir)? else {
            return Ok(VcsStatus::NotTracked);
        };

        let branch = repository.branch()?;

        let mut remote_configured = true;
        if self.options.fetch_remote && repository.fetch()? == FetchOutcome::NoRemote {
            debug!("no remote configured for {}", repository.root().display());
            remote_configured = false;
        }

        let clean = repository.is_clean()?;

        let remote = match repository.tracking_status()? {
            Some(status) if remote_configured => RemoteSync::Tracking {
                ahead: status.ahead,
                behind: status.behind,
            },
            _ => RemoteSync::NoUpstream,
        };

        Ok(VcsStatus::Tracked {
            branch,
            clean,
            remote,
        })
    }
}
