// Rust guideline compliant 2026-02-06

//! Pinned-dependency hook implementation.
//!
//! Fails a commit when a change to `pyproject.toml` or `setup.cfg` declares
//! dependencies that the pinned `requirements-<extra>.txt` files no longer
//! satisfy.

use crate::report::{Report, Scope, Violation};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use pincheck_core::project::PYPROJECT_FILE;
use pincheck_core::{
    validate_requirements, CheckOptions, Config, LockFile, ProjectDefinition, ProjectFile,
    Requirements,
};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Patterns of files that declare dependencies.
const DEFINITION_PATTERNS: [&str; 2] = ["**/pyproject.toml", "**/setup.cfg"];

/// The set of files changed by the commit.
#[derive(Debug)]
pub struct ChangedFiles {
    paths: BTreeSet<PathBuf>,
    definitions: GlobSet,
}

impl ChangedFiles {
    /// Builds the set from the file names passed by the hook runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition patterns cannot be compiled.
    pub fn new<S: AsRef<str>>(filenames: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFINITION_PATTERNS {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            paths: filenames
                .iter()
                .map(|name| normalize(Path::new(name.as_ref())))
                .collect(),
            definitions: builder.build()?,
        })
    }

    /// True when any changed file can declare dependencies.
    pub fn touches_definitions(&self) -> bool {
        self.paths.iter().any(|path| self.definitions.is_match(path))
    }

    /// True when `path`, relative to the repository root, changed.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&normalize(path))
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

/// Runs the pinned-dependency hook.
///
/// # Arguments
///
/// * `root` - Repository root; changed file names are relative to it
/// * `filenames` - Files changed by the commit
/// * `config` - Check configuration
///
/// # Returns
///
/// The report of all mismatches. A report that passed means the commit may
/// proceed, including when no dependency definition changed.
///
/// # Errors
///
/// Returns an error if:
/// - A changed project definition cannot be parsed
/// - A lock file is missing or cannot be parsed
/// - A marker cannot be evaluated
pub fn check_pinned_deps<S: AsRef<str>>(
    root: &Path,
    filenames: &[S],
    config: &Config,
) -> Result<Report> {
    let mut report = Report::new(config.upgrade_command.clone());
    let changed = ChangedFiles::new(filenames)?;
    if !changed.touches_definitions() {
        tracing::debug!("no dependency definitions changed");
        return Ok(report);
    }

    let environment = config.marker_environment()?;
    for pyproject in discover_projects(root)? {
        let project = ProjectFile::load(&root.join(&pyproject))
            .with_context(|| format!("Failed to load {}", pyproject.display()))?;
        let dir = pyproject.parent().map(Path::to_path_buf).unwrap_or_default();
        let format = project.format();
        let definition_path = dir.join(format.file_name());

        if !changed.contains(&definition_path) {
            tracing::debug!(path = %definition_path.display(), "definition unchanged, skipping");
            continue;
        }
        let Some(definition) = project.open_definition()? else {
            tracing::debug!(path = %definition_path.display(), "no setup.cfg, nothing to check");
            continue;
        };

        tracing::info!(project = %dir.display(), ?format, "checking pinned dependencies");
        report.checked_projects.push(dir.clone());

        let unsafe_packages = project.unsafe_packages()?;
        let options = CheckOptions {
            environment: &environment,
            unsafe_packages: &unsafe_packages,
            allow_prereleases: config.allow_prereleases,
        };
        let checker = ProjectChecker {
            root,
            dir: &dir,
            config,
            options: &options,
        };
        checker.run(definition.as_ref(), &mut report)?;

        if config.fail_fast && !report.passed() {
            break;
        }
    }

    Ok(report)
}

/// Finds every `pyproject.toml` below `root`, skipping hidden and ignored
/// directories. Paths are relative to `root` and sorted.
fn discover_projects(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkBuilder::new(root).build() {
        let entry = entry?;
        let is_file = entry.file_type().is_some_and(|kind| kind.is_file());
        if is_file && entry.file_name() == PYPROJECT_FILE {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            found.push(relative.to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

struct ProjectChecker<'a> {
    root: &'a Path,
    dir: &'a Path,
    config: &'a Config,
    options: &'a CheckOptions<'a>,
}

impl ProjectChecker<'_> {
    fn run(&self, definition: &dyn ProjectDefinition, report: &mut Report) -> Result<()> {
        let base = definition
            .base_requirements()
            .with_context(|| format!("Failed to read {}", definition.path().display()))?;
        let extras = definition.defined_extras();

        if extras.is_empty() {
            match &self.config.base_lock_file {
                Some(lock_name) => {
                    let lock = self.load_lock(lock_name)?;
                    self.compare(&lock, &base, Scope::Base, report)?;
                }
                None => tracing::debug!(project = %self.dir.display(), "no extras defined"),
            }
            return Ok(());
        }

        for extra in extras {
            let extra_requirements = definition
                .extra_requirements(&extra)
                .with_context(|| format!("Failed to read {}", definition.path().display()))?;
            let lock = self.load_lock(&self.config.lock_file_name(&extra))?;

            let before = report.violations.len();
            self.compare(&lock, &base, Scope::Base, report)?;
            self.compare(&lock, &extra_requirements, Scope::Extra(extra), report)?;
            if self.config.fail_fast && report.violations.len() > before {
                break;
            }
        }
        Ok(())
    }

    fn load_lock(&self, name: &str) -> Result<LockFile> {
        let relative = self.dir.join(name);
        tracing::debug!(lock_file = %relative.display(), "reading lock file");
        let lock = LockFile::load(&self.root.join(&relative))?;
        Ok(lock)
    }

    fn compare(
        &self,
        lock: &LockFile,
        declared: &Requirements,
        scope: Scope,
        report: &mut Report,
    ) -> Result<()> {
        for mut mismatch in validate_requirements(lock, declared, self.options)? {
            if let Ok(relative) = mismatch.lock_file.strip_prefix(self.root) {
                mismatch.lock_file = relative.to_path_buf();
            }
            tracing::debug!(name = %mismatch.name, %scope, "pinned dependency out of date");
            report.violations.push(Violation {
                project: self.dir.to_path_buf(),
                scope: scope.clone(),
                mismatch,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_files_match_definitions() {
        assert!(ChangedFiles::new(&["pyproject.toml"]).unwrap().touches_definitions());
        assert!(ChangedFiles::new(&["./setup.cfg"]).unwrap().touches_definitions());
        assert!(ChangedFiles::new(&["sub/dir/pyproject.toml"])
            .unwrap()
            .touches_definitions());
        assert!(!ChangedFiles::new(&["README.md", "requirements-test.txt"])
            .unwrap()
            .touches_definitions());
        assert!(!ChangedFiles::new::<&str>(&[]).unwrap().touches_definitions());
    }

    #[test]
    fn test_changed_files_ignore_leading_dot() {
        let changed = ChangedFiles::new(&["./sub/setup.cfg"]).unwrap();
        assert!(changed.contains(Path::new("sub/setup.cfg")));
        assert!(!changed.contains(Path::new("setup.cfg")));
    }
}
