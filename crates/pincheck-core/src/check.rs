// Rust guideline compliant 2026-02-06

//! Checks declared requirements against the pins of a lock file.

use crate::lockfile::{LockFile, Pinned};
use crate::marker::MarkerEnvironment;
use crate::requirement::Requirements;
use crate::Result;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Settings shared by every comparison of one run.
#[derive(Debug, Clone)]
pub struct CheckOptions<'a> {
    /// Environment markers are evaluated against.
    pub environment: &'a MarkerEnvironment,
    /// Canonical names that are never pinned and therefore skipped.
    pub unsafe_packages: &'a [String],
    /// Whether a pre-release pin may satisfy a constraint that does not
    /// mention pre-releases.
    pub allow_prereleases: bool,
}

/// A declared dependency the lock file does not satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Canonical dependency name.
    pub name: String,
    /// The declaration as written in the project definition.
    pub requirement: String,
    /// The version constraint, empty when unconstrained.
    pub required: String,
    /// The pinned version or direct reference, `None` when the pin is missing.
    pub pinned: Option<Pinned>,
    /// Lock file that was consulted.
    pub lock_file: PathBuf,
}

impl Mismatch {
    /// True when the lock file has no entry at all.
    pub fn is_missing(&self) -> bool {
        self.pinned.is_none()
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pinned {
            None => write!(
                f,
                "{} is missing from lock file {}",
                self.requirement,
                self.lock_file.display()
            ),
            Some(pinned) => write!(
                f,
                "{} requires {}, found {} in {}",
                self.name,
                self.required,
                pinned,
                self.lock_file.display()
            ),
        }
    }
}

/// Compares every declared requirement with its pin.
///
/// Requirements on unsafe packages and requirements whose marker does not
/// match the environment are skipped. Unconstrained and direct-URL
/// requirements only need a pin to exist. A version constraint is never
/// satisfied by a direct-reference pin.
///
/// # Arguments
///
/// * `lock` - The parsed lock file
/// * `declared` - Requirements keyed by canonical name
/// * `options` - Environment and pre-release policy
///
/// # Returns
///
/// Every mismatch found, in name order. An empty vector means the lock file
/// satisfies all requirements.
///
/// # Errors
///
/// Returns an error if a marker cannot be evaluated.
pub fn validate_requirements(
    lock: &LockFile,
    declared: &Requirements,
    options: &CheckOptions<'_>,
) -> Result<Vec<Mismatch>> {
    let mut mismatches = Vec::new();

    for (name, requirement) in declared {
        if options.unsafe_packages.contains(name) {
            tracing::debug!(%name, "skipping unsafe package");
            continue;
        }
        if let Some(marker) = &requirement.marker {
            if !marker.evaluate(options.environment)? {
                tracing::debug!(%name, %marker, "marker does not match environment");
                continue;
            }
        }

        let mismatch = |pinned: Option<Pinned>| Mismatch {
            name: name.clone(),
            requirement: requirement.to_string(),
            required: requirement.specifier.to_string(),
            pinned,
            lock_file: lock.path().to_path_buf(),
        };

        let Some(pin) = lock.get(name) else {
            mismatches.push(mismatch(None));
            continue;
        };
        if requirement.url.is_some() || requirement.specifier.is_empty() {
            continue;
        }
        let satisfied = pin.pinned.version().is_some_and(|version| {
            requirement
                .specifier
                .contains(version, options.allow_prereleases)
        });
        if !satisfied {
            mismatches.push(mismatch(Some(pin.pinned.clone())));
        }
    }

    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::parse_requirements;
    use crate::version::Version;
    use std::path::Path;

    fn env() -> MarkerEnvironment {
        let mut env = MarkerEnvironment::host(&Version::parse("3.11").unwrap());
        env.set("sys_platform", "linux").unwrap();
        env
    }

    fn check(declared: &str, pins: &str) -> Vec<Mismatch> {
        let env = env();
        let unsafe_packages = vec!["pip".to_string(), "setuptools".to_string()];
        let options = CheckOptions {
            environment: &env,
            unsafe_packages: &unsafe_packages,
            allow_prereleases: true,
        };
        let lock = LockFile::parse(Path::new("requirements-test.txt"), pins).unwrap();
        let declared = parse_requirements(declared.lines(), &["#"]).unwrap();
        validate_requirements(&lock, &declared, &options).unwrap()
    }

    #[test]
    fn test_pin_below_minimum() {
        let mismatches = check("foo>=2.0", "foo==1.5");
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].name, "foo");
        assert_eq!(mismatches[0].required, ">=2.0");
        assert_eq!(mismatches[0].pinned.as_ref().unwrap().to_string(), "1.5");
        assert_eq!(
            mismatches[0].to_string(),
            "foo requires >=2.0, found 1.5 in requirements-test.txt"
        );
    }

    #[test]
    fn test_pin_at_minimum() {
        assert!(check("foo>=2.0", "foo==2.0").is_empty());
    }

    #[test]
    fn test_missing_pin() {
        let mismatches = check("bar", "foo==1.0");
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].is_missing());
        assert_eq!(
            mismatches[0].to_string(),
            "bar is missing from lock file requirements-test.txt"
        );
    }

    #[test]
    fn test_reports_every_mismatch() {
        let mismatches = check("a>=2\nb<1\nc\nd", "a==1\nb==1\nd==0.1");
        let names: Vec<&str> = mismatches.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_skips_unsafe_and_foreign_markers() {
        let declared = "pip>=23\nSetupTools\npywin32>=300; sys_platform == \"win32\"\n";
        assert!(check(declared, "").is_empty());
    }

    #[test]
    fn test_matching_marker_is_checked() {
        let mismatches = check("uvloop>=0.17; sys_platform == \"linux\"", "uvloop==0.16");
        assert_eq!(mismatches.len(), 1);
    }

    #[test]
    fn test_names_are_canonicalized() {
        assert!(check("Zope.Interface>=6", "zope_interface==6.1").is_empty());
    }

    #[test]
    fn test_prerelease_pins_accepted() {
        assert!(check("aws-cdk-lib>=2.0", "aws-cdk-lib==2.100.0a0").is_empty());
    }

    #[test]
    fn test_direct_reference_only_needs_a_pin() {
        assert!(check("pkg @ https://example.com/pkg.whl", "pkg==0.1").is_empty());
        assert!(check(
            "pkg @ https://example.com/pkg.whl",
            "pkg @ https://example.com/pkg.whl"
        )
        .is_empty());
        assert!(check("pkg", "pkg @ git+https://example.com/pkg").is_empty());
        assert_eq!(check("pkg @ https://example.com/pkg.whl", "").len(), 1);
    }

    #[test]
    fn test_versioned_requirement_against_url_pin() {
        let mismatches = check("pkg>=1.0", "pkg @ git+https://example.com/pkg@main");
        assert_eq!(mismatches.len(), 1);
        assert!(!mismatches[0].is_missing());
        assert_eq!(
            mismatches[0].to_string(),
            "pkg requires >=1.0, found @ git+https://example.com/pkg@main in requirements-test.txt"
        );
    }
}
