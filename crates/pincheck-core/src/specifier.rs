// Rust guideline compliant 2026-02-06

//! Version specifiers (`>=1.0`, `~=2.2`, `==1.4.*`) and specifier sets.

use crate::version::Version;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a version specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `~=` compatible release.
    Compatible,
    /// `==` version matching.
    Equal,
    /// `!=` version exclusion.
    NotEqual,
    /// `<=` inclusive upper bound.
    LessEqual,
    /// `>=` inclusive lower bound.
    GreaterEqual,
    /// `<` exclusive upper bound.
    Less,
    /// `>` exclusive lower bound.
    Greater,
    /// `===` arbitrary string equality.
    Arbitrary,
}

impl Operator {
    /// Operators ordered so that longer tokens are tried first.
    const TOKENS: [(&'static str, Operator); 8] = [
        ("===", Operator::Arbitrary),
        ("~=", Operator::Compatible),
        ("==", Operator::Equal),
        ("!=", Operator::NotEqual),
        ("<=", Operator::LessEqual),
        (">=", Operator::GreaterEqual),
        ("<", Operator::Less),
        (">", Operator::Greater),
    ];

    /// Splits a leading operator token off `input`.
    pub fn split_prefix(input: &str) -> Option<(Operator, &str)> {
        Self::TOKENS
            .iter()
            .find(|(token, _)| input.starts_with(token))
            .map(|(token, op)| (*op, &input[token.len()..]))
    }

    /// Returns the operator token.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Compatible => "~=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Arbitrary => "===",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single version specifier such as `>=2.0`.
#[derive(Debug, Clone)]
pub struct Specifier {
    operator: Operator,
    /// Version text as written, used for `===` and display.
    raw: String,
    /// Parsed version; absent only for `===` with a non-PEP 440 operand.
    version: Option<Version>,
    /// `==1.4.*` / `!=1.4.*` prefix match.
    wildcard: bool,
}

impl Specifier {
    /// Parses a specifier such as `>= 1.0` or `==1.4.*`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSpecifier` when the operator is missing, the
    /// version is invalid, or the operator does not allow the given form
    /// (wildcards and local labels are only valid with `==`/`!=`, `~=` needs
    /// at least two release segments).
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidSpecifier(input.trim().to_string());
        let (operator, rest) = Operator::split_prefix(input.trim()).ok_or_else(invalid)?;
        let raw = rest.trim().to_string();
        if raw.is_empty() || raw.contains(char::is_whitespace) {
            return Err(invalid());
        }

        if operator == Operator::Arbitrary {
            let version = Version::parse(&raw).ok();
            return Ok(Self {
                operator,
                raw,
                version,
                wildcard: false,
            });
        }

        let (text, wildcard) = match raw.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (raw.as_str(), false),
        };
        if wildcard && !matches!(operator, Operator::Equal | Operator::NotEqual) {
            return Err(invalid());
        }

        let version = Version::parse(text).map_err(|_| invalid())?;
        if wildcard
            && (version.pre().is_some()
                || version.post().is_some()
                || version.dev().is_some()
                || version.local().is_some())
        {
            return Err(invalid());
        }
        if version.local().is_some() && !matches!(operator, Operator::Equal | Operator::NotEqual) {
            return Err(invalid());
        }
        if operator == Operator::Compatible && version.release().len() < 2 {
            return Err(invalid());
        }

        Ok(Self {
            operator,
            raw,
            version: Some(version),
            wildcard,
        })
    }

    /// Returns the operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the parsed operand, if it is a PEP 440 version.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// True for `==X.*` and `!=X.*`.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// True when the operand itself names a pre-release.
    pub fn is_prerelease(&self) -> bool {
        match (&self.version, self.operator) {
            (_, Operator::NotEqual) => false,
            (Some(version), _) => version.is_prerelease(),
            (None, _) => false,
        }
    }

    /// Returns whether `candidate` satisfies this specifier.
    pub fn contains(&self, candidate: &Version) -> bool {
        let Some(spec) = &self.version else {
            return self.operator == Operator::Arbitrary
                && candidate.to_string().eq_ignore_ascii_case(&self.raw);
        };

        match self.operator {
            Operator::Compatible => {
                let prefix = &spec.release()[..spec.release().len() - 1];
                candidate.public() >= *spec && prefix_matches(candidate, spec.epoch(), prefix)
            }
            Operator::Equal => self.matches_equal(candidate, spec),
            Operator::NotEqual => !self.matches_equal(candidate, spec),
            Operator::LessEqual => candidate.public() <= *spec,
            Operator::GreaterEqual => candidate.public() >= *spec,
            Operator::Less => {
                if candidate >= spec {
                    return false;
                }
                // `<1.0` must not admit `1.0rc1`.
                !(!spec.is_prerelease()
                    && candidate.is_prerelease()
                    && candidate.base_version() == spec.base_version())
            }
            Operator::Greater => {
                if candidate <= spec {
                    return false;
                }
                // `>1.0` must not admit `1.0.post1` or `1.0+local`.
                let same_base = candidate.base_version() == spec.base_version();
                !(same_base
                    && ((!spec.is_postrelease() && candidate.is_postrelease())
                        || candidate.local().is_some()))
            }
            Operator::Arbitrary => candidate.to_string().eq_ignore_ascii_case(&self.raw),
        }
    }

    fn matches_equal(&self, candidate: &Version, spec: &Version) -> bool {
        if self.wildcard {
            return prefix_matches(candidate, spec.epoch(), spec.release());
        }
        if spec.local().is_some() {
            candidate == spec
        } else {
            candidate.public() == *spec
        }
    }
}

/// Matches the candidate's public version against `epoch!prefix.*`.
fn prefix_matches(candidate: &Version, epoch: u64, prefix: &[u64]) -> bool {
    if candidate.epoch() != epoch {
        return false;
    }
    let release = candidate.release();
    if release.len() < prefix.len() {
        // Missing segments count as zero, and a qualifier on a shorter
        // release still sits inside the padded prefix.
        return prefix
            .iter()
            .enumerate()
            .all(|(i, n)| release.get(i).copied().unwrap_or(0) == *n);
    }
    &release[..prefix.len()] == prefix
}

impl FromStr for Specifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Specifier::parse(s)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.raw)
    }
}

/// A conjunction of specifiers. The empty set places no constraint.
#[derive(Debug, Clone, Default)]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
}

impl SpecifierSet {
    /// Parses a comma-separated list of specifiers. Blank input yields the
    /// empty set.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSpecifier` for the first invalid item.
    pub fn parse(input: &str) -> Result<Self> {
        let specifiers = input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Specifier::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { specifiers })
    }

    /// True when no specifier is present.
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// Iterates the specifiers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }

    /// Returns whether `version` satisfies every specifier.
    ///
    /// With `allow_prereleases` false, a pre-release only matches when one of
    /// the specifiers names a pre-release itself. The empty set matches every
    /// version.
    pub fn contains(&self, version: &Version, allow_prereleases: bool) -> bool {
        if self.specifiers.is_empty() {
            return true;
        }
        if !allow_prereleases
            && version.is_prerelease()
            && !self.specifiers.iter().any(Specifier::is_prerelease)
        {
            return false;
        }
        self.specifiers.iter().all(|spec| spec.contains(version))
    }
}

impl FromStr for SpecifierSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SpecifierSet::parse(s)
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.specifiers.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn set(s: &str) -> SpecifierSet {
        SpecifierSet::parse(s).unwrap()
    }

    #[test]
    fn test_minimum_version() {
        assert!(!set(">=2.0").contains(&v("1.5"), true));
        assert!(set(">=2.0").contains(&v("2.0"), true));
        assert!(set(">=2.0").contains(&v("2.0.0"), true));
    }

    #[test]
    fn test_range_with_exclusion() {
        let range = set(">=1.0, !=1.3, <2");
        assert!(range.contains(&v("1.2"), true));
        assert!(!range.contains(&v("1.3"), true));
        assert!(!range.contains(&v("1.3.0"), true));
        assert!(range.contains(&v("1.3.1"), true));
        assert!(!range.contains(&v("2.0"), true));
    }

    #[test]
    fn test_compatible_release() {
        let spec = set("~=2.2");
        assert!(spec.contains(&v("2.2"), true));
        assert!(spec.contains(&v("2.9.1"), true));
        assert!(!spec.contains(&v("3.0"), true));
        let patch = set("~=1.4.5");
        assert!(patch.contains(&v("1.4.9"), true));
        assert!(!patch.contains(&v("1.5.0"), true));
        assert!(Specifier::parse("~=1").is_err());
    }

    #[test]
    fn test_wildcard_equality() {
        let spec = set("==1.4.*");
        assert!(spec.contains(&v("1.4"), true));
        assert!(spec.contains(&v("1.4.7"), true));
        assert!(spec.contains(&v("1.4.0rc1"), true));
        assert!(!spec.contains(&v("1.5"), true));
        assert!(set("!=1.4.*").contains(&v("1.5"), true));
        assert!(Specifier::parse(">=1.4.*").is_err());
    }

    #[test]
    fn test_equality_ignores_candidate_local_label() {
        assert!(set("==1.0").contains(&v("1.0+cpu"), true));
        assert!(!set("==1.0+gpu").contains(&v("1.0+cpu"), true));
        assert!(Specifier::parse(">=1.0+cpu").is_err());
    }

    #[test]
    fn test_exclusive_bounds_skip_same_release_qualifiers() {
        assert!(!set("<1.0").contains(&v("1.0rc1"), true));
        assert!(set("<1.0rc2").contains(&v("1.0rc1"), true));
        assert!(!set(">1.0").contains(&v("1.0.post1"), true));
        assert!(!set(">1.0").contains(&v("1.0+local"), true));
        assert!(set(">1.0").contains(&v("1.0.1"), true));
    }

    #[test]
    fn test_prerelease_policy() {
        let spec = set(">=1.0");
        assert!(spec.contains(&v("2.0a1"), true));
        assert!(!spec.contains(&v("2.0a1"), false));
        assert!(set(">=2.0a1").contains(&v("2.0a2"), false));
        assert!(set("").contains(&v("2.0a1"), false));
    }

    #[test]
    fn test_arbitrary_equality() {
        assert!(set("===1.0").contains(&v("1.0"), true));
        assert!(!set("===1.0").contains(&v("1.0.0"), true));
        assert!(Specifier::parse("===foobar").is_ok());
    }

    #[test]
    fn test_display_round_trips_text() {
        assert_eq!(set(">=1.0, <2").to_string(), ">=1.0,<2");
        assert!(set("   ").is_empty());
    }
}
