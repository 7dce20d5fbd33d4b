use crate::config::{DEFAULT_CHECK_TASKS, UpgradeConfig};
use crate::gradle::GRADLE_RELEASES_URL;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "gradle-sweep",
    about = "Find Gradle projects in a directory tree and keep their wrappers up to date",
    version,
    author
)]
pub struct Cli {
    /// Directory to scan for Gradle projects (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    pub path: String,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// URL of the Gradle released-versions index
    #[arg(
        long,
        env = "GRADLE_SWEEP_RELEASES_URL",
        default_value = GRADLE_RELEASES_URL,
        global = true
    )]
    pub releases_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every project with its Gradle version and branch
    List,

    /// Upgrade outdated projects to the latest Gradle version
    Upgrade(UpgradeArgs),
}

#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Report what would be upgraded without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Allow upgrades across a major Gradle version
    #[arg(long)]
    pub major_upgrades: bool,

    /// Tasks that must succeed before and after the upgrade
    #[arg(
        long,
        value_name = "TASKS",
        value_delimiter = ',',
        default_values_t = DEFAULT_CHECK_TASKS.iter().map(|t| t.to_string()).collect::<Vec<_>>()
    )]
    pub check_tasks: Vec<String>,

    /// Do not commit the upgrade (implies --no-push)
    #[arg(long)]
    pub no_commit: bool,

    /// Commit but do not push
    #[arg(long)]
    pub no_push: bool,
}

impl From<UpgradeArgs> for UpgradeConfig {
    fn from(args: UpgradeArgs) -> Self {
        let commit = !args.no_commit;
        Self {
            dry_run: args.dry_run,
            major_upgrades: args.major_upgrades,
            check_tasks: args.check_tasks,
            commit,
            push: commit && !args.no_push,
        }
    }
}
