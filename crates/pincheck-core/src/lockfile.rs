// Rust guideline compliant 2026-02-06

//! Lock file (pinned requirements) parsing.
//!
//! Lock files are pip requirement files as written by `pip-compile` or
//! `pip freeze`: one `name==version` pin per line, optionally followed by
//! pip options such as `--hash` on continuation lines. Direct references
//! (`name @ url`, written for VCS and URL dependencies) are pins too.

use crate::requirement::Requirement;
use crate::specifier::Operator;
use crate::version::Version;
use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a lock file entry pins a distribution to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pinned {
    /// An exact version (`==` or `===`).
    Version(Version),
    /// A direct reference (`name @ url`) without a known version.
    Url(String),
}

impl Pinned {
    /// The pinned version, `None` for direct references.
    pub fn version(&self) -> Option<&Version> {
        match self {
            Pinned::Version(version) => Some(version),
            Pinned::Url(_) => None,
        }
    }
}

impl fmt::Display for Pinned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pinned::Version(version) => write!(f, "{}", version),
            Pinned::Url(url) => write!(f, "@ {}", url),
        }
    }
}

impl Serialize for Pinned {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One exact pin from a lock file.
#[derive(Debug, Clone)]
pub struct Pin {
    /// Canonical distribution name.
    pub name: String,
    /// The pinned version or direct reference.
    pub pinned: Pinned,
    /// 1-based line the pin was read from.
    pub line: usize,
}

/// All pins of one lock file.
#[derive(Debug, Clone)]
pub struct LockFile {
    path: PathBuf,
    pins: BTreeMap<String, Pin>,
}

impl LockFile {
    /// Reads and parses the lock file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::LockFileMissing` if the file does not exist,
    /// `Error::Io` if it cannot be read and `Error::LockFile` if a line is
    /// not an exact pin.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::LockFileMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parses lock file `content`; `path` is recorded for reporting.
    ///
    /// Comments, blank lines and pip option lines (starting with `-`) are
    /// skipped. Every other line must be an exact `==`/`===` pin or a direct
    /// reference. When a name is pinned twice, the last pin wins.
    ///
    /// # Errors
    ///
    /// Returns `Error::LockFile` naming the first offending line.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut pins = BTreeMap::new();

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let error = |message: String| Error::LockFile {
                path: path.to_path_buf(),
                line: line_no,
                message,
            };

            let line = raw.split('#').next().unwrap_or_default().trim();
            let line = line.strip_suffix('\\').unwrap_or(line).trim();
            if line.is_empty() || line.starts_with('-') {
                continue;
            }

            let requirement = Requirement::parse(line).map_err(|err| error(err.to_string()))?;
            let pinned = pinned(&requirement).ok_or_else(|| {
                error(format!("'{}' is not pinned to an exact version", line))
            })?;
            if let Some(previous) = pins.get(&requirement.name).map(|pin: &Pin| pin.line) {
                tracing::debug!(
                    path = %path.display(),
                    name = %requirement.name,
                    previous,
                    line = line_no,
                    "duplicate pin, keeping the later one"
                );
            }
            pins.insert(
                requirement.name.clone(),
                Pin {
                    name: requirement.name,
                    pinned,
                    line: line_no,
                },
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            pins,
        })
    }

    /// Returns the lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up the pin for a canonical name.
    pub fn get(&self, name: &str) -> Option<&Pin> {
        self.pins.get(name)
    }

    /// Number of pins.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// True when the file pins nothing.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// The direct reference, or the version of the first `==` or `===`
/// specifier if it is exact.
fn pinned(requirement: &Requirement) -> Option<Pinned> {
    if let Some(url) = &requirement.url {
        return Some(Pinned::Url(url.clone()));
    }
    let first = requirement.specifier.iter().next()?;
    let version = match first.operator() {
        Operator::Equal if !first.is_wildcard() => first.version().cloned(),
        Operator::Arbitrary => first.version().cloned(),
        _ => None,
    }?;
    Some(Pinned::Version(version))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<LockFile> {
        LockFile::parse(Path::new("requirements-test.txt"), content)
    }

    #[test]
    fn test_pip_compile_output() {
        let content = "\
#
# This file is autogenerated by pip-compile
#
--index-url https://pypi.org/simple
Requests==2.31.0 \\
    --hash=sha256:58cd2187c01e70e6e26505bca751777aa9f2ee0b7f4300988b709f44e013003f
urllib3==2.0.7
    # via requests
zope.interface==6.1 ; python_version >= \"3.8\"
";
        let lock = parse(content).unwrap();
        assert_eq!(lock.len(), 3);
        assert_eq!(lock.get("requests").unwrap().pinned.to_string(), "2.31.0");
        assert_eq!(lock.get("requests").unwrap().line, 5);
        assert_eq!(lock.get("zope-interface").unwrap().pinned.to_string(), "6.1");
    }

    #[test]
    fn test_last_duplicate_wins() {
        let lock = parse("foo==1.0\nfoo==1.1\n").unwrap();
        assert_eq!(lock.get("foo").unwrap().pinned.to_string(), "1.1");
    }

    #[test]
    fn test_unpinned_line_is_a_parse_error() {
        let err = parse("foo==1.0\nbar>=2.0\n").unwrap_err();
        assert!(matches!(err, Error::LockFile { line: 2, .. }));
        assert!(parse("foo==1.*").is_err());
        assert!(parse("foo").is_err());
    }

    #[test]
    fn test_direct_reference_pins() {
        let lock = parse(
            "foo==1.0\nmylib @ git+https://github.com/org/mylib@v1.2 ; python_version >= \"3.8\"\n",
        )
        .unwrap();
        let pin = lock.get("mylib").unwrap();
        assert_eq!(
            pin.pinned,
            Pinned::Url("git+https://github.com/org/mylib@v1.2".to_string())
        );
        assert!(pin.pinned.version().is_none());
        assert_eq!(pin.pinned.to_string(), "@ git+https://github.com/org/mylib@v1.2");
        assert_eq!(lock.get("foo").unwrap().pinned.version().unwrap().to_string(), "1.0");
    }

    #[test]
    fn test_comment_only_file_is_empty() {
        let lock = parse("# nothing pinned\n--index-url https://pypi.org/simple\n").unwrap();
        assert!(lock.is_empty());
        assert!(lock.get("foo").is_none());
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let err = parse("this is not a requirement\n").unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("requirements-test.txt"));
    }

    #[test]
    fn test_missing_file() {
        let err = LockFile::load(Path::new("/nonexistent/requirements-x.txt")).unwrap_err();
        assert!(matches!(err, Error::LockFileMissing(_)));
    }
}
