use crate::error::{Result, SweepError};
use std::cmp::Ordering;

/// Dotted numeric version such as `8.4` or `7.6.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub original: String,
    pub components: Vec<u64>,
}

impl Version {
    pub fn parse(version: &str) -> Result<Self> {
        if version.is_empty() {
            return Err(SweepError::malformed(version, "empty version string"));
        }

        let mut components = Vec::new();
        for part in version.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SweepError::malformed(
                    version,
                    format!("component '{part}' is not a non-negative integer"),
                ));
            }
            let number = part.parse::<u64>().map_err(|e| {
                SweepError::malformed(version, format!("component '{part}': {e}"))
            })?;
            components.push(number);
        }

        Ok(Version {
            original: version.to_string(),
            components,
        })
    }

    /// Leading component exactly as written.
    pub fn major_text(&self) -> &str {
        self.original.split('.').next().unwrap_or_default()
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.components.iter().zip(other.components.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        // Shared components equal: a missing component sorts below a present one.
        self.components.len().cmp(&other.components.len())
    }
}

pub struct VersionComparator;

impl VersionComparator {
    /// Compare two version strings component by component.
    pub fn compare(a: &str, b: &str) -> Result<Ordering> {
        Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
    }

    /// Check whether both versions share the same major component.
    ///
    /// Major components are compared as written, so `08` and `8` differ.
    pub fn is_same_major(a: &str, b: &str) -> Result<bool> {
        let va = Version::parse(a)?;
        let vb = Version::parse(b)?;
        Ok(va.major_text() == vb.major_text())
    }

    /// Get the highest well-formed version from a list, skipping anything
    /// that does not parse.
    pub fn latest<I, S>(versions: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        versions
            .into_iter()
            .filter_map(|v| Version::parse(v.as_ref()).ok())
            .max()
            .map(|v| v.original)
    }
}
