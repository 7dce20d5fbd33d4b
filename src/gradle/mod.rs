pub mod backend;
pub mod releases;
pub mod version;

pub use releases::{
    CachedVersionProvider, GRADLE_RELEASES_URL, GradleReleasesClient, VersionProvider,
};
