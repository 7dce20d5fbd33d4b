use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Malformed version '{version}': {reason}")]
    MalformedVersion { version: String, reason: String },

    #[error("Unable to determine the latest Gradle version: {0}")]
    VersionLookupFailed(String),

    #[error("Analysis of {project} failed: {message}")]
    AnalysisFailed { project: String, message: String },

    #[error("Unable to run 'git fetch': {0}")]
    FetchFailed(String),

    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("Gradle execution failed: {0}")]
    GradleExecution(String),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("git push failed: {message}")]
    PushFailed { message: String, output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SweepError {
    pub fn malformed(version: &str, reason: impl Into<String>) -> Self {
        SweepError::MalformedVersion {
            version: version.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
