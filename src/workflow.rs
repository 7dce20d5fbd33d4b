use crate::agents::{
    GitCli, ProjectAnalyzer, ProjectMetadata, ProjectScannerAgent, ScanSummary,
    SystemWrapperLauncher, UpgradeDecisionPolicy, UpgradeExecutor, UpgradeOutcome,
    WrapperBackend,
};
use crate::config::{AnalyzeOptions, RunMode, UpgradeConfig};
use crate::console::{Console, ProgressSink};
use crate::error::Result;
use crate::gradle::{CachedVersionProvider, GradleReleasesClient, VersionProvider};
use crate::utils::path_validator::PathValidator;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Counters for the upgrade run, printed after the scan.
#[derive(Debug, Default)]
struct UpgradeTally {
    upgraded: usize,
    blocked: usize,
    failed: usize,
}

/// Execute the list workflow
pub fn execute_list<P: AsRef<Path>>(
    project_path: P,
    releases_url: &str,
    console: &Console,
) -> Result<()> {
    run(
        project_path.as_ref(),
        releases_url,
        RunMode::List,
        &UpgradeConfig::default(),
        console,
    )
}

/// Execute the upgrade workflow
pub fn execute_upgrade<P: AsRef<Path>>(
    project_path: P,
    releases_url: &str,
    config: &UpgradeConfig,
    console: &Console,
) -> Result<()> {
    run(project_path.as_ref(), releases_url, RunMode::Upgrade, config, console)
}

fn run(
    project_path: &Path,
    releases_url: &str,
    mode: RunMode,
    config: &UpgradeConfig,
    console: &Console,
) -> Result<()> {
    let root = PathValidator::validate_directory(project_path)?;

    let client = GradleReleasesClient::new(releases_url)?;
    let versions = CachedVersionProvider::new(Arc::new(client));
    console.progress(">> Looking up the latest Gradle release...");
    // Nothing can be judged without the latest version, so fail the run here.
    let latest = versions.latest()?;
    console.println(format!("Latest Gradle version: {}", latest.bold()));
    if mode == RunMode::Upgrade && config.dry_run {
        console.println("Dry run: no project will be modified".yellow());
    }

    let build = WrapperBackend;
    let vcs = GitCli;
    let launcher = SystemWrapperLauncher;
    let options = AnalyzeOptions::for_run(mode, config);
    let analyzer = ProjectAnalyzer::new(&build, &vcs, &versions, options);
    let scanner = ProjectScannerAgent::new(&analyzer, console);
    let executor = UpgradeExecutor::new(&build, &vcs, &launcher, console);

    console.println(format!(
        "Scanning for Gradle projects in {} ...\n",
        root.display()
    ));

    let mut tally = UpgradeTally::default();
    let summary = match mode {
        RunMode::List => scanner.scan(&root, &mut |project| list_project(console, &project)),
        RunMode::Upgrade => scanner.scan(&root, &mut |project| {
            upgrade_project(console, &executor, config, &project, &mut tally)
        }),
    };

    print_summary(console, mode, &summary, &tally);
    info!(
        projects = summary.projects_found,
        failures = summary.analysis_failures,
        "scan finished"
    );
    Ok(())
}

fn print_project_header(console: &Console, project: &ProjectMetadata) {
    console.println(format!(">> Project: {}", project.project_dir.display()));
    console.println(format!(
        "    Gradle: {} {}",
        format!("{:<10}", project.gradle_version).bold(),
        format_version_status(project)
    ));
    if let Some(branch) = project.branch() {
        console.println(format!("    Branch: {branch}"));
    }
}

fn format_version_status(project: &ProjectMetadata) -> String {
    if project.up_to_date {
        "up to date".green().to_string()
    } else if project.same_major_as_latest {
        format!("outdated (latest: {})", project.latest_version)
            .yellow()
            .to_string()
    } else {
        format!("outdated, new major version available ({})", project.latest_version)
            .bright_red()
            .to_string()
    }
}

fn list_project(console: &Console, project: &ProjectMetadata) {
    print_project_header(console, project);
    console.println("");
}

fn upgrade_project(
    console: &Console,
    executor: &UpgradeExecutor<'_>,
    config: &UpgradeConfig,
    project: &ProjectMetadata,
    tally: &mut UpgradeTally,
) {
    print_project_header(console, project);

    let decision = UpgradeDecisionPolicy::evaluate(project, config);
    if decision.is_blocked() {
        tally.blocked += 1;
        console.println(
            format!("   Not upgrading to Gradle {}:", project.latest_version).bright_red(),
        );
        for reason in &decision.reasons {
            console.println(format!("    - {reason}"));
        }
    } else if decision.eligible {
        console.println(
            format!("   Upgrading project to Gradle {}", project.latest_version).bright_green(),
        );
        if config.dry_run {
            console.println("    Dry run, skipping upgrade".dimmed());
        } else {
            let outcome = executor.execute(project, config);
            print_outcome(console, &outcome);
            if outcome.is_success() {
                tally.upgraded += 1;
            } else {
                tally.failed += 1;
            }
        }
    }

    console.println("");
}

fn print_outcome(console: &Console, outcome: &UpgradeOutcome) {
    match outcome {
        UpgradeOutcome::Success { notes } => {
            for note in notes {
                console.println(format!("    {note}"));
            }
        }
        UpgradeOutcome::CommitPushFailed { output, .. } => {
            console.println(format!("     {}", outcome.to_string().bright_red()));
            if !output.trim().is_empty() {
                console.println(output.trim_end().dimmed());
            }
        }
        other => console.println(format!("     {}", other.to_string().bright_red())),
    }
}

fn print_summary(console: &Console, mode: RunMode, summary: &ScanSummary, tally: &UpgradeTally) {
    let found = summary.projects_found;
    console.println(format!(
        "{} Gradle project{} found",
        found,
        if found == 1 { "" } else { "s" }
    ));

    if summary.analysis_failures > 0 {
        console.println(
            format!("{} could not be analyzed", summary.analysis_failures).bright_red(),
        );
    }

    if mode == RunMode::Upgrade {
        console.println(format!(
            "{} upgraded, {} blocked, {} failed",
            tally.upgraded.to_string().green(),
            tally.blocked.to_string().yellow(),
            tally.failed.to_string().red()
        ));
    }
}
