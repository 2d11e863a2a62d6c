// Rust guideline compliant 2026-02-06

//! Minimal reader for `setup.cfg` files.
//!
//! Follows the INI dialect setuptools reads through Python's `configparser`:
//! `[section]` headers, `key = value` or `key: value` options with
//! case-insensitive keys, full-line `#` / `;` comments and indented
//! continuation lines. Blank lines inside a multi-line value are kept; only a
//! non-indented line ends the value. Values support `%(name)s` references to
//! other options of the same section and `%%` for a literal `%`. Duplicate
//! sections or options are rejected.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Nesting limit for `%(name)s` references; deeper chains are cycles.
const MAX_INTERPOLATION_DEPTH: usize = 10;

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: String,
    line: usize,
}

/// A parsed `setup.cfg`.
#[derive(Debug, Clone, Default)]
pub struct SetupCfg {
    path: PathBuf,
    /// Options per section, in file order.
    sections: BTreeMap<String, Vec<Entry>>,
}

impl SetupCfg {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::SetupCfg`
    /// if it is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parses `content`; `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `Error::SetupCfg` with the offending line number.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let error = |line: usize, message: String| Error::SetupCfg {
            path: PathBuf::from(path),
            line,
            message,
        };

        let mut cfg = SetupCfg {
            path: path.to_path_buf(),
            sections: BTreeMap::new(),
        };
        let mut section: Option<String> = None;
        let mut has_open_option = false;

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw.trim();

            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indented = raw.starts_with(char::is_whitespace);
            if has_open_option && (indented || trimmed.is_empty()) {
                if let Some(entry) = section
                    .as_ref()
                    .and_then(|name| cfg.sections.get_mut(name))
                    .and_then(|entries| entries.last_mut())
                {
                    entry.value.push('\n');
                    entry.value.push_str(trimmed);
                }
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| error(line_no, format!("malformed section header '{}'", trimmed)))?
                    .trim()
                    .to_string();
                if cfg.sections.contains_key(&name) {
                    return Err(error(line_no, format!("duplicate section '{}'", name)));
                }
                cfg.sections.insert(name.clone(), Vec::new());
                section = Some(name);
                has_open_option = false;
                continue;
            }

            let Some(current) = section.as_ref() else {
                return Err(error(line_no, "option outside of any section".to_string()));
            };
            let split_at = trimmed
                .find(['=', ':'])
                .ok_or_else(|| error(line_no, format!("expected 'key = value', got '{}'", trimmed)))?;
            let key = trimmed[..split_at].trim().to_lowercase();
            let value = trimmed[split_at + 1..].trim().to_string();
            if key.is_empty() {
                return Err(error(line_no, "empty option name".to_string()));
            }

            let entries = cfg.sections.entry(current.clone()).or_default();
            if entries.iter().any(|entry| entry.key == key) {
                return Err(error(line_no, format!("duplicate option '{}' in [{}]", key, current)));
            }
            entries.push(Entry {
                key,
                value,
                line: line_no,
            });
            has_open_option = true;
        }

        for entries in cfg.sections.values_mut() {
            for entry in entries.iter_mut() {
                let trimmed_len = entry.value.trim_end().len();
                entry.value.truncate(trimmed_len);
            }
        }

        Ok(cfg)
    }

    /// Returns an option value with references expanded. Keys are matched
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `Error::SetupCfg` if the value references an unknown option,
    /// references nest too deeply (a cycle), or a `%` is not followed by
    /// `%` or `(name)s`.
    pub fn get(&self, section: &str, key: &str) -> Result<Option<String>> {
        match self.entry(section, key) {
            Some(entry) => self.interpolate(section, entry, 1).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the option names of `section` in file order.
    pub fn keys(&self, section: &str) -> Vec<String> {
        self.sections
            .get(section)
            .map(|entries| entries.iter().map(|entry| entry.key.clone()).collect())
            .unwrap_or_default()
    }

    fn entry(&self, section: &str, key: &str) -> Option<&Entry> {
        let key = key.to_lowercase();
        self.sections.get(section)?.iter().find(|entry| entry.key == key)
    }

    fn interpolate(&self, section: &str, entry: &Entry, depth: usize) -> Result<String> {
        let error = |message: String| Error::SetupCfg {
            path: self.path.clone(),
            line: entry.line,
            message,
        };
        if depth > MAX_INTERPOLATION_DEPTH {
            return Err(error(format!(
                "references in '{}' nest deeper than {} levels",
                entry.key, MAX_INTERPOLATION_DEPTH
            )));
        }

        let mut out = String::with_capacity(entry.value.len());
        let mut rest = entry.value.as_str();
        while let Some(percent) = rest.find('%') {
            out.push_str(&rest[..percent]);
            rest = &rest[percent + 1..];

            if let Some(after) = rest.strip_prefix('%') {
                out.push('%');
                rest = after;
                continue;
            }
            let reference = rest
                .strip_prefix('(')
                .and_then(|inner| inner.split_once(")s"))
                .filter(|(name, _)| !name.is_empty() && !name.contains(['(', ')', '%']));
            let Some((name, after)) = reference else {
                return Err(error(format!(
                    "'%' in '{}' must be followed by '%' or '(name)s'",
                    entry.key
                )));
            };

            let target = self.entry(section, name).ok_or_else(|| {
                error(format!(
                    "'{}' references unknown option '{}' in [{}]",
                    entry.key, name, section
                ))
            })?;
            out.push_str(&self.interpolate(section, target, depth + 1)?);
            rest = after;
        }
        out.push_str(rest);
        Ok(out)
    }
}
