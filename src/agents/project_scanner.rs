use crate::agents::project_analyzer::ProjectAnalyzer;
use crate::agents::project_metadata::ProjectMetadata;
use crate::console::{Console, ProgressSink};
use crate::error::SweepError;
use crate::gradle::backend::{has_build_marker, has_wrapper};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Totals for one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Directories recognised as project roots, including failed analyses.
    pub projects_found: usize,
    pub analysis_failures: usize,
}

/// ProjectScannerAgent walks a directory tree looking for Gradle projects
pub struct ProjectScannerAgent<'a> {
    analyzer: &'a ProjectAnalyzer<'a>,
    console: &'a Console,
}

impl<'a> ProjectScannerAgent<'a> {
    pub fn new(analyzer: &'a ProjectAnalyzer<'a>, console: &'a Console) -> Self {
        Self { analyzer, console }
    }

    /// Walk `root` depth first, handing every project to `on_project`
    /// before the walk continues.
    pub fn scan(&self, root: &Path, on_project: &mut dyn FnMut(ProjectMetadata)) -> ScanSummary {
        let mut summary = ScanSummary::default();
        self.scan_dir(root, on_project, &mut summary);
        summary
    }

    fn scan_dir(
        &self,
        dir: &Path,
        on_project: &mut dyn FnMut(ProjectMetadata),
        summary: &mut ScanSummary,
    ) {
        self.console.progress(&format!("Scanning: {}", dir.display()));

        if has_build_marker(dir) {
            // A build descriptor ends the branch whether or not it is managed.
            if has_wrapper(dir) {
                summary.projects_found += 1;
                self.analyze(dir, on_project, summary);
            } else {
                debug!("{} has a build file but no wrapper, skipping", dir.display());
            }
            return;
        }

        for child in self.subdirectories(dir) {
            self.scan_dir(&child, on_project, summary);
        }
    }

    fn analyze(
        &self,
        dir: &Path,
        on_project: &mut dyn FnMut(ProjectMetadata),
        summary: &mut ScanSummary,
    ) {
        match self.analyzer.analyze(dir) {
            Ok(Some(project)) => on_project(project),
            Ok(None) => {}
            Err(e) => {
                summary.analysis_failures += 1;
                warn!("analysis of {} failed: {e}", dir.display());
                self.report_failure(dir, &e);
            }
        }
    }

    fn report_failure(&self, dir: &Path, error: &SweepError) {
        self.console.println(format!(">> Project: {}", dir.display()));
        self.console
            .println(format!("   {}", format!("Analysis failed: {error}").bright_red()));
        self.console.println("");
    }

    /// Immediate subdirectories sorted by name. Symlinks and unreadable
    /// entries are skipped.
    fn subdirectories(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read {}: {e}", dir.display());
                return Vec::new();
            }
        };

        let mut children: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("cannot read entry in {}: {e}", dir.display());
                    None
                }
            })
            .filter(|entry| {
                // file_type does not follow symlinks
                entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
            })
            .map(|entry| entry.path())
            .collect();

        children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::project_analyzer::testing::{FakeBuild, FakeVcs, FixedVersion};
    use crate::config::AnalyzeOptions;
    use crate::gradle::backend::wrapper_script_name;
    use tempfile::tempdir;

    fn make_project(dir: &Path, with_wrapper: bool) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("build.gradle"), "").unwrap();
        if with_wrapper {
            fs::write(dir.join(wrapper_script_name()), "").unwrap();
        }
    }

    fn scan(root: &Path) -> (Vec<PathBuf>, ScanSummary) {
        let build = FakeBuild::reporting("8.5");
        let vcs = FakeVcs(None);
        let versions = FixedVersion("8.9");
        let analyzer = ProjectAnalyzer::new(&build, &vcs, &versions, AnalyzeOptions::default());
        let console = Console::hidden();
        let scanner = ProjectScannerAgent::new(&analyzer, &console);

        let mut found = Vec::new();
        let summary = scanner.scan(root, &mut |project| found.push(project.project_dir));
        (found, summary)
    }

    #[test]
    fn finds_projects_in_name_order() {
        let dir = tempdir().unwrap();
        make_project(&dir.path().join("b/service"), true);
        make_project(&dir.path().join("a"), true);
        make_project(&dir.path().join("c/deep/nested/lib"), true);

        let (found, summary) = scan(dir.path());
        assert_eq!(
            found,
            vec![
                dir.path().join("a"),
                dir.path().join("b/service"),
                dir.path().join("c/deep/nested/lib"),
            ]
        );
        assert_eq!(summary.projects_found, 3);
        assert_eq!(summary.analysis_failures, 0);
    }

    #[test]
    fn does_not_descend_into_found_project() {
        let dir = tempdir().unwrap();
        let outer = dir.path().join("A/proj1");
        make_project(&outer, true);
        make_project(&outer.join("sub/proj2"), true);

        let (found, summary) = scan(dir.path());
        assert_eq!(found, vec![outer]);
        assert_eq!(summary.projects_found, 1);
    }

    #[test]
    fn build_file_without_wrapper_prunes_branch() {
        let dir = tempdir().unwrap();
        let unmanaged = dir.path().join("legacy");
        make_project(&unmanaged, false);
        make_project(&unmanaged.join("x/nested"), true);

        let (found, summary) = scan(dir.path());
        assert!(found.is_empty());
        assert_eq!(summary.projects_found, 0);
    }

    #[test]
    fn root_itself_can_be_a_project() {
        let dir = tempdir().unwrap();
        make_project(dir.path(), true);
        make_project(&dir.path().join("module"), true);

        let (found, _) = scan(dir.path());
        assert_eq!(found, vec![dir.path().to_path_buf()]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real");
        make_project(&real, true);
        std::os::unix::fs::symlink(&real, dir.path().join("zlink")).unwrap();

        let (found, _) = scan(dir.path());
        assert_eq!(found, vec![real]);
    }

    #[test]
    fn analysis_errors_are_counted_and_scan_continues() {
        let dir = tempdir().unwrap();
        make_project(&dir.path().join("a"), true);
        make_project(&dir.path().join("b"), true);

        let build = FakeBuild::reporting("not-a-version");
        let vcs = FakeVcs(None);
        let versions = FixedVersion("8.9");
        let analyzer = ProjectAnalyzer::new(&build, &vcs, &versions, AnalyzeOptions::default());
        let console = Console::hidden();
        let scanner = ProjectScannerAgent::new(&analyzer, &console);

        let mut delivered = 0;
        let summary = scanner.scan(dir.path(), &mut |_| delivered += 1);
        assert_eq!(delivered, 0);
        assert_eq!(summary.projects_found, 2);
        assert_eq!(summary.analysis_failures, 2);
    }
}
