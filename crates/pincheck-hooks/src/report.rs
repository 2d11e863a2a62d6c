// Rust guideline compliant 2026-02-06

//! Check report and its plain-text and JSON renderings.

use pincheck_core::Mismatch;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Group of requirements a mismatch belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Requirements every installation needs.
    Base,
    /// Requirements of one optional extra.
    Extra(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Base => f.write_str("base requirements"),
            Scope::Extra(name) => write!(f, "extra '{}'", name),
        }
    }
}

/// A mismatch together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Project directory relative to the repository root.
    pub project: PathBuf,
    /// Requirement group that was checked.
    pub scope: Scope,
    /// The failed comparison.
    #[serde(flatten)]
    pub mismatch: Mismatch,
}

/// Outcome of one hook run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Projects whose definitions changed and were checked.
    pub checked_projects: Vec<PathBuf>,
    /// Every mismatch found.
    pub violations: Vec<Violation>,
    /// Command suggested to fix the violations.
    #[serde(skip)]
    pub upgrade_command: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    passed: bool,
    checked_projects: &'a [PathBuf],
    mismatches: &'a [Violation],
}

impl Report {
    /// Creates an empty report.
    pub fn new(upgrade_command: impl Into<String>) -> Self {
        Self {
            upgrade_command: upgrade_command.into(),
            ..Self::default()
        }
    }

    /// True when nothing was violated.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Renders the report for humans.
    ///
    /// A passing report renders as an empty string. Otherwise violations are
    /// grouped by project and scope, each group headed by the fix hint.
    pub fn render_plain(&self) -> String {
        if self.passed() {
            return String::new();
        }

        let mut out = String::new();
        let mut current: Option<(&PathBuf, &Scope)> = None;
        for violation in &self.violations {
            let group = (&violation.project, &violation.scope);
            if current != Some(group) {
                let location = if violation.project.as_os_str().is_empty() {
                    String::new()
                } else {
                    format!(" of {}", violation.project.display())
                };
                out.push_str(&format!(
                    "Due to changes in the {}{} you need to run `{}`\n",
                    violation.scope, location, self.upgrade_command
                ));
                current = Some(group);
            }
            out.push_str(&format!("Violation: {}\n", violation.mismatch));
        }

        let missing = self
            .violations
            .iter()
            .filter(|v| v.mismatch.is_missing())
            .count();
        out.push_str(&format!(
            "{} unsatisfied, {} missing\n",
            self.violations.len() - missing,
            missing
        ));
        out
    }

    /// Renders the report as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&JsonReport {
            passed: self.passed(),
            checked_projects: &self.checked_projects,
            mismatches: &self.violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pincheck_core::{Pinned, Version};

    fn violation(project: &str, scope: Scope, name: &str, pinned: Option<&str>) -> Violation {
        Violation {
            project: PathBuf::from(project),
            scope,
            mismatch: Mismatch {
                name: name.to_string(),
                requirement: format!("{}>=2.0", name),
                required: ">=2.0".to_string(),
                pinned: pinned.map(|v| Pinned::Version(Version::parse(v).unwrap())),
                lock_file: PathBuf::from("requirements-test.txt"),
            },
        }
    }

    #[test]
    fn test_passing_report_renders_nothing() {
        let report = Report::new("make lock");
        assert!(report.passed());
        assert_eq!(report.render_plain(), "");
    }

    #[test]
    fn test_plain_rendering_groups_by_scope() {
        let mut report = Report::new("make upgrade-pinned-dependencies");
        report.violations.push(violation("", Scope::Base, "foo", Some("1.5")));
        report.violations.push(violation("", Scope::Base, "bar", None));
        report
            .violations
            .push(violation("", Scope::Extra("test".to_string()), "baz", Some("1.0")));

        let expected = "\
Due to changes in the base requirements you need to run `make upgrade-pinned-dependencies`
Violation: foo requires >=2.0, found 1.5 in requirements-test.txt
Violation: bar>=2.0 is missing from lock file requirements-test.txt
Due to changes in the extra 'test' you need to run `make upgrade-pinned-dependencies`
Violation: baz requires >=2.0, found 1.0 in requirements-test.txt
2 unsatisfied, 1 missing
";
        assert_eq!(report.render_plain(), expected);
    }

    #[test]
    fn test_plain_rendering_names_nested_projects() {
        let mut report = Report::new("make lock");
        report
            .violations
            .push(violation("services/api", Scope::Base, "foo", Some("1.5")));
        assert!(report
            .render_plain()
            .starts_with("Due to changes in the base requirements of services/api"));
    }

    #[test]
    fn test_json_rendering() {
        let mut report = Report::new("make lock");
        report.checked_projects.push(PathBuf::from(""));
        report
            .violations
            .push(violation("", Scope::Extra("dev".to_string()), "foo", Some("1.5")));

        let json: serde_json::Value = serde_json::from_str(&report.render_json().unwrap()).unwrap();
        assert_eq!(json["passed"], false);
        let mismatch = &json["mismatches"][0];
        assert_eq!(mismatch["name"], "foo");
        assert_eq!(mismatch["required"], ">=2.0");
        assert_eq!(mismatch["pinned"], "1.5");
        assert_eq!(mismatch["scope"]["extra"], "dev");
        assert_eq!(mismatch["lock_file"], "requirements-test.txt");
    }
}
