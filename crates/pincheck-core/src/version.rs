// Rust guideline compliant 2026-02-06

//! PEP 440 version parsing and ordering.
//!
//! Versions are parsed with the normalisation rules of PEP 440 (alternate
//! spellings, optional separators, implicit numbers) and ordered the same way
//! Python packaging tools order them.

use crate::{Error, Result};
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?P<pre>
            [-_.]?
            (?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)
            [-_.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?P<post>
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)
        )?
        (?P<dev>[-_.]?dev[-_.]?(?P<dev_n>[0-9]+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        \s*$",
    )
    .expect("version pattern compiles")
});

/// Pre-release phase, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    /// Alpha release (`a`).
    Alpha,
    /// Beta release (`b`).
    Beta,
    /// Release candidate (`rc`).
    Rc,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => PreRelease::Alpha,
            "b" | "beta" => PreRelease::Beta,
            _ => PreRelease::Rc,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PreRelease::Alpha => "a",
            PreRelease::Beta => "b",
            PreRelease::Rc => "rc",
        }
    }
}

/// One dot-separated segment of a local version label.
///
/// Alphanumeric segments sort before numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalSegment {
    /// Segment containing letters, compared lexicographically.
    Alpha(String),
    /// Purely numeric segment, compared numerically.
    Numeric(u64),
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalSegment::Alpha(s) => f.write_str(s),
            LocalSegment::Numeric(n) => write!(f, "{}", n),
        }
    }
}

/// A parsed PEP 440 version.
///
/// Equality and ordering follow PEP 440, so `1.0` and `1.0.0` compare equal.
///
/// Numeric components are stored as `u64`. Versions with a number above
/// `u64::MAX` (more than 20 digits) are rejected as invalid, including
/// numeric segments of the local label.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreRelease, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<Vec<LocalSegment>>,
}

/// Position of a version relative to its final release.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PhaseKey {
    DevOnly,
    Pre(PreRelease, u64),
    Final,
}

impl Version {
    /// Parses a version string.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidVersion` if the string is not a PEP 440 version.
    pub fn parse(input: &str) -> Result<Self> {
        let caps = VERSION_RE
            .captures(input)
            .ok_or_else(|| Error::InvalidVersion(input.to_string()))?;
        let number = |name: &str| -> Result<Option<u64>> {
            caps.name(name)
                .map(|m| {
                    m.as_str()
                        .parse::<u64>()
                        .map_err(|_| Error::InvalidVersion(input.to_string()))
                })
                .transpose()
        };

        let epoch = number("epoch")?.unwrap_or(0);
        let release = caps["release"]
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| Error::InvalidVersion(input.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => Some((
                PreRelease::from_label(label.as_str()),
                number("pre_n")?.unwrap_or(0),
            )),
            None => None,
        };

        let post = if caps.name("post").is_some() {
            Some(number("post_n1")?.or(number("post_n2")?).unwrap_or(0))
        } else {
            None
        };

        let dev = if caps.name("dev").is_some() {
            Some(number("dev_n")?.unwrap_or(0))
        } else {
            None
        };

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local: parse_local(&caps, input)?,
        })
    }

    /// Builds a final release from its release segments.
    pub fn from_release(release: Vec<u64>) -> Self {
        Self {
            epoch: 0,
            release,
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// Returns the epoch (0 when absent).
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns the release segments as written.
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Returns the pre-release phase and number, if any.
    pub fn pre(&self) -> Option<(PreRelease, u64)> {
        self.pre
    }

    /// Returns the post-release number, if any.
    pub fn post(&self) -> Option<u64> {
        self.post
    }

    /// Returns the dev-release number, if any.
    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    /// Returns the local version label segments, if any.
    pub fn local(&self) -> Option<&[LocalSegment]> {
        self.local.as_deref()
    }

    /// True for pre-releases and dev-releases.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// True for post-releases.
    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    /// Returns the version without its local label.
    pub fn public(&self) -> Version {
        Version {
            local: None,
            ..self.clone()
        }
    }

    /// Returns `epoch!release` with every qualifier dropped.
    pub fn base_version(&self) -> Version {
        Version {
            epoch: self.epoch,
            ..Version::from_release(self.release.clone())
        }
    }

    fn phase_key(&self) -> PhaseKey {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PhaseKey::DevOnly,
            (Some((phase, n)), _, _) => PhaseKey::Pre(phase, n),
            _ => PhaseKey::Final,
        }
    }
}

fn parse_local(caps: &Captures<'_>, input: &str) -> Result<Option<Vec<LocalSegment>>> {
    caps.name("local")
        .map(|m| {
            m.as_str()
                .split(['-', '_', '.'])
                .map(|segment| {
                    if !segment.bytes().all(|b| b.is_ascii_digit()) {
                        return Ok(LocalSegment::Alpha(segment.to_ascii_lowercase()));
                    }
                    segment
                        .parse::<u64>()
                        .map(LocalSegment::Numeric)
                        .map_err(|_| Error::InvalidVersion(input.to_string()))
                })
                .collect()
        })
        .transpose()
}

/// Compares release segments, ignoring trailing zeros.
fn cmp_release(a: &[u64], b: &[u64]) -> Ordering {
    let trim = |r: &[u64]| r.len() - r.iter().rev().take_while(|&&n| n == 0).count();
    a[..trim(a)].cmp(&b[..trim(b)])
}

/// Dev-releases sort before the same version without a dev segment.
fn dev_key(dev: Option<u64>) -> (bool, u64) {
    match dev {
        Some(n) => (false, n),
        None => (true, 0),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| cmp_release(&self.release, &other.release))
            .then_with(|| self.phase_key().cmp(&other.phase_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| dev_key(self.dev).cmp(&dev_key(other.dev)))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        f.write_str(&release.join("."))?;
        if let Some((phase, n)) = self.pre {
            write!(f, "{}{}", phase.as_str(), n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{}", n)?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{}", n)?;
        }
        if let Some(local) = &self.local {
            let segments: Vec<String> = local.iter().map(ToString::to_string).collect();
            write!(f, "+{}", segments.join("."))?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_normalizes_alternate_spellings() {
        assert_eq!(v("1.0-alpha.1").to_string(), "1.0a1");
        assert_eq!(v("1.0.BETA2").to_string(), "1.0b2");
        assert_eq!(v("1.0c3").to_string(), "1.0rc3");
        assert_eq!(v("1.0preview").to_string(), "1.0rc0");
        assert_eq!(v("1.0-1").to_string(), "1.0.post1");
        assert_eq!(v("1.0rev").to_string(), "1.0.post0");
        assert_eq!(v("v2.1.dev").to_string(), "2.1.dev0");
        assert_eq!(v(" 1!2.0+Ubuntu-1 ").to_string(), "1!2.0+ubuntu.1");
    }

    #[test]
    fn test_rejects_invalid_versions() {
        for bad in ["", "abc", "1.0.", "1..0", "1.0+", "1.0 beta"] {
            assert!(Version::parse(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_numbers_beyond_u64_are_rejected() {
        let huge = "123456789012345678901";
        assert!(Version::parse(&format!("1.{}", huge)).is_err());
        assert!(Version::parse(&format!("1.0+{}", huge)).is_err());
        assert!(Version::parse(&format!("1.0+abc{}", huge)).is_ok());
        assert_eq!(v("18446744073709551615").release(), &[u64::MAX]);
    }

    #[test]
    fn test_trailing_zeros_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn test_release_phase_ordering() {
        let ordered = [
            "1.0.dev0",
            "1.0a1.dev1",
            "1.0a1",
            "1.0a2",
            "1.0b1",
            "1.0rc1",
            "1.0",
            "1.0+local",
            "1.0.post1.dev1",
            "1.0.post1",
            "1.1.dev1",
            "1!0.1",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_local_segment_ordering() {
        assert!(v("1.0+abc") < v("1.0+1"));
        assert!(v("1.0+1") < v("1.0+1.0"));
        assert!(v("1.0+2") < v("1.0+10"));
    }

    #[test]
    fn test_public_and_base_version() {
        let version = v("2!1.4rc1.post2.dev3+cpu");
        assert_eq!(version.public().to_string(), "2!1.4rc1.post2.dev3");
        assert_eq!(version.base_version().to_string(), "2!1.4");
        assert!(version.is_prerelease());
        assert!(version.is_postrelease());
    }
}
