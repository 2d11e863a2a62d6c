// Rust guideline compliant 2026-02-06

//! Project definitions: where a project declares its dependencies.
//!
//! A project is rooted at a `pyproject.toml`. Its dependencies are declared
//! either in the `[project]` table of that file or, for projects that have
//! not migrated, in the sibling `setup.cfg`. Which one applies is decided by
//! [`ProjectFile::format`]; the rest of the crate only sees the
//! [`ProjectDefinition`] trait.

use crate::requirement::{canonicalize_name, parse_requirements, Requirements};
use crate::setup_cfg::SetupCfg;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// File name of the project descriptor.
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// File name of the legacy setuptools configuration.
pub const SETUP_CFG_FILE: &str = "setup.cfg";

/// Packages pip-tools leaves out of lock files unless told otherwise.
pub const DEFAULT_UNSAFE_PACKAGES: [&str; 3] = ["pip", "setuptools", "distribute"];

/// Where a project declares its dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    /// `[project]` table in `pyproject.toml`.
    PyProject,
    /// `[options]` section in `setup.cfg`.
    SetupCfg,
}

impl ProjectFormat {
    /// File name holding the declarations.
    pub fn file_name(self) -> &'static str {
        match self {
            ProjectFormat::PyProject => PYPROJECT_FILE,
            ProjectFormat::SetupCfg => SETUP_CFG_FILE,
        }
    }
}

/// Source of declared dependencies.
pub trait ProjectDefinition {
    /// Path of the file the declarations are read from.
    fn path(&self) -> &Path;

    /// Names of the optional dependency groups.
    fn defined_extras(&self) -> Vec<String>;

    /// Dependencies every installation needs.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration is malformed.
    fn base_requirements(&self) -> Result<Requirements>;

    /// Dependencies added by `extra`.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration is malformed.
    fn extra_requirements(&self, extra: &str) -> Result<Requirements>;
}

/// A loaded `pyproject.toml`, used to detect the project format.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    path: PathBuf,
    document: Table,
}

impl ProjectFile {
    /// Reads and parses the `pyproject.toml` at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Toml` if
    /// it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let document = toml::from_str::<Table>(&content).map_err(|e| Error::Toml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    /// Path of the `pyproject.toml`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the project.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Detects where dependencies are declared.
    ///
    /// A `[project]` table means PEP 621 metadata; anything else falls back
    /// to `setup.cfg`. This mirrors how setuptools picks its metadata source
    /// and is a heuristic: a project may carry a `[project]` table and still
    /// keep its dependencies elsewhere.
    pub fn format(&self) -> ProjectFormat {
        if self.document.contains_key("project") {
            ProjectFormat::PyProject
        } else {
            ProjectFormat::SetupCfg
        }
    }

    /// Path of the file that declares dependencies for this project.
    pub fn definition_path(&self) -> PathBuf {
        match self.format() {
            ProjectFormat::PyProject => self.path.clone(),
            ProjectFormat::SetupCfg => self.dir().join(SETUP_CFG_FILE),
        }
    }

    /// Canonical names of packages that are never pinned.
    ///
    /// Read from `[tool.pip-tools] unsafe-package`, falling back to the
    /// pip-tools defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Toml` if the key is present but not a list of strings.
    pub fn unsafe_packages(&self) -> Result<Vec<String>> {
        let configured = self
            .document
            .get("tool")
            .and_then(|tool| tool.get("pip-tools"))
            .and_then(|pip_tools| pip_tools.get("unsafe-package"));
        match configured {
            None => Ok(DEFAULT_UNSAFE_PACKAGES
                .iter()
                .map(|name| canonicalize_name(name))
                .collect()),
            Some(value) => string_list(value, &self.path, "tool.pip-tools.unsafe-package")
                .map(|names| names.iter().map(|name| canonicalize_name(name)).collect()),
        }
    }

    /// Opens the definition for the detected format.
    ///
    /// Returns `Ok(None)` when the format is `setup.cfg` and no such file
    /// exists; there is nothing to check then.
    ///
    /// # Errors
    ///
    /// Returns an error if `setup.cfg` exists but cannot be read or parsed.
    pub fn open_definition(&self) -> Result<Option<Box<dyn ProjectDefinition>>> {
        match self.format() {
            ProjectFormat::PyProject => Ok(Some(Box::new(PyProjectDefinition {
                path: self.path.clone(),
                document: self.document.clone(),
            }))),
            ProjectFormat::SetupCfg => {
                let path = self.dir().join(SETUP_CFG_FILE);
                if !path.exists() {
                    return Ok(None);
                }
                let cfg = SetupCfg::load(&path)?;
                Ok(Some(Box::new(SetupCfgDefinition { path, cfg })))
            }
        }
    }
}

fn string_list(value: &Value, path: &Path, key: &str) -> Result<Vec<String>> {
    let invalid = || Error::Toml {
        path: path.to_path_buf(),
        message: format!("{} must be a list of strings", key),
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// Dependencies declared in the `[project]` table of `pyproject.toml`.
#[derive(Debug, Clone)]
pub struct PyProjectDefinition {
    path: PathBuf,
    document: Table,
}

impl PyProjectDefinition {
    fn project(&self) -> Option<&Table> {
        self.document.get("project").and_then(Value::as_table)
    }

    fn optional_dependencies(&self) -> Option<&Table> {
        self.project()?
            .get("optional-dependencies")
            .and_then(Value::as_table)
    }
}

impl ProjectDefinition for PyProjectDefinition {
    fn path(&self) -> &Path {
        &self.path
    }

    fn defined_extras(&self) -> Vec<String> {
        self.optional_dependencies()
            .map(|extras| extras.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn base_requirements(&self) -> Result<Requirements> {
        let Some(deps) = self.project().and_then(|p| p.get("dependencies")) else {
            return Ok(Requirements::new());
        };
        let lines = string_list(deps, &self.path, "project.dependencies")?;
        parse_requirements(lines.iter().map(String::as_str), &["#"])
    }

    fn extra_requirements(&self, extra: &str) -> Result<Requirements> {
        let Some(deps) = self.optional_dependencies().and_then(|o| o.get(extra)) else {
            return Ok(Requirements::new());
        };
        let key = format!("project.optional-dependencies.{}", extra);
        let lines = string_list(deps, &self.path, &key)?;
        let mut requirements = parse_requirements(lines.iter().map(String::as_str), &["#"])?;

        // `pkg[other-extra]` pulls in a sibling extra; its pins live elsewhere.
        if let Some(own_name) = self
            .project()
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
        {
            requirements.remove(&canonicalize_name(own_name));
        }
        Ok(requirements)
    }
}

/// Dependencies declared in the `[options]` sections of `setup.cfg`.
#[derive(Debug, Clone)]
pub struct SetupCfgDefinition {
    path: PathBuf,
    cfg: SetupCfg,
}

impl SetupCfgDefinition {
    const OPTIONS: &'static str = "options";
    const EXTRAS: &'static str = "options.extras_require";
}

impl ProjectDefinition for SetupCfgDefinition {
    fn path(&self) -> &Path {
        &self.path
    }

    fn defined_extras(&self) -> Vec<String> {
        self.cfg.keys(Self::EXTRAS)
    }

    fn base_requirements(&self) -> Result<Requirements> {
        let value = self
            .cfg
            .get(Self::OPTIONS, "install_requires")?
            .unwrap_or_default();
        parse_requirements(value.lines(), &["#"])
    }

    fn extra_requirements(&self, extra: &str) -> Result<Requirements> {
        // `%(name)s` pulls in another extra's lines, checked against this lock file.
        let value = self.cfg.get(Self::EXTRAS, extra)?.unwrap_or_default();
        parse_requirements(value.lines(), &["#"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_detects_pyproject_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(
            temp_dir.path(),
            PYPROJECT_FILE,
            r#"
[project]
name = "Sample_Pkg"
dependencies = ["requests>=2.28", "click"]

[project.optional-dependencies]
test = ["pytest>=7", "sample-pkg[dev]"]
dev = ["black"]
"#,
        );
        let project = ProjectFile::load(&path).unwrap();
        assert_eq!(project.format(), ProjectFormat::PyProject);
        assert_eq!(project.definition_path(), path);

        let definition = project.open_definition().unwrap().unwrap();
        assert_eq!(definition.defined_extras(), vec!["dev", "test"]);
        let base = definition.base_requirements().unwrap();
        assert_eq!(base.len(), 2);
        let test = definition.extra_requirements("test").unwrap();
        assert!(test.contains_key("pytest"));
        assert!(!test.contains_key("sample-pkg"));
    }

    #[test]
    fn test_falls_back_to_setup_cfg() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(
            temp_dir.path(),
            PYPROJECT_FILE,
            "[build-system]\nrequires = [\"setuptools\"]\n",
        );
        write(
            temp_dir.path(),
            SETUP_CFG_FILE,
            "[options]\ninstall_requires =\n    requests>=2.28\n\n[options.extras_require]\ndev =\n    black\ntest =\n    %(dev)s\n    pytest\n",
        );
        let project = ProjectFile::load(&path).unwrap();
        assert_eq!(project.format(), ProjectFormat::SetupCfg);
        assert_eq!(
            project.definition_path(),
            temp_dir.path().join(SETUP_CFG_FILE)
        );

        let definition = project.open_definition().unwrap().unwrap();
        assert_eq!(definition.defined_extras(), vec!["dev", "test"]);
        assert!(definition.base_requirements().unwrap().contains_key("requests"));
        let test = definition.extra_requirements("test").unwrap();
        assert_eq!(test.keys().collect::<Vec<_>>(), vec!["black", "pytest"]);
    }

    #[test]
    fn test_setup_cfg_unknown_reference_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), PYPROJECT_FILE, "[tool.black]\n");
        write(
            temp_dir.path(),
            SETUP_CFG_FILE,
            "[options.extras_require]\ntest =\n    %(docs)s\n",
        );
        let definition = ProjectFile::load(&path)
            .unwrap()
            .open_definition()
            .unwrap()
            .unwrap();
        let err = definition.extra_requirements("test").unwrap_err();
        assert!(matches!(err, Error::SetupCfg { line: 2, .. }));
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_missing_setup_cfg_has_no_definition() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), PYPROJECT_FILE, "[tool.black]\n");
        let project = ProjectFile::load(&path).unwrap();
        assert!(project.open_definition().unwrap().is_none());
    }

    #[test]
    fn test_unsafe_packages() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), PYPROJECT_FILE, "[project]\nname = \"x\"\n");
        let defaults = ProjectFile::load(&path).unwrap().unsafe_packages().unwrap();
        assert_eq!(defaults, vec!["pip", "setuptools", "distribute"]);

        write(
            temp_dir.path(),
            PYPROJECT_FILE,
            "[tool.pip-tools]\nunsafe-package = [\"Pip\", \"wheel\"]\n",
        );
        let configured = ProjectFile::load(&path).unwrap().unsafe_packages().unwrap();
        assert_eq!(configured, vec!["pip", "wheel"]);

        write(
            temp_dir.path(),
            PYPROJECT_FILE,
            "[tool.pip-tools]\nunsafe-package = \"pip\"\n",
        );
        assert!(ProjectFile::load(&path).unwrap().unsafe_packages().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), PYPROJECT_FILE, "[project\n");
        let err = ProjectFile::load(&path).unwrap_err();
        assert!(matches!(err, Error::Toml { .. }));
    }
}
