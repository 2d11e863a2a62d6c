// Rust guideline compliant 2026-02-06

//! PEP 508 requirement parsing.

use crate::marker::Marker;
use crate::specifier::SpecifierSet;
use crate::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?").expect("name pattern compiles")
});

/// Requirements keyed by canonical name.
pub type Requirements = BTreeMap<String, Requirement>;

/// Normalises a distribution name: lower-case, runs of `-`, `_` and `.`
/// collapsed into a single `-`.
pub fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            pending_separator = true;
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push('-');
        }
        pending_separator = false;
        out.push(c.to_ascii_lowercase());
    }
    if pending_separator {
        out.push('-');
    }
    out
}

/// A dependency declaration: name, extras, version constraint and marker.
#[derive(Debug, Clone)]
pub struct Requirement {
    /// Canonical distribution name.
    pub name: String,
    /// Requested extras, canonicalised.
    pub extras: Vec<String>,
    /// Version constraint; empty when unconstrained.
    pub specifier: SpecifierSet,
    /// Direct reference (`name @ url`), if any.
    pub url: Option<String>,
    /// Environment marker, if any.
    pub marker: Option<Marker>,
}

impl Requirement {
    /// Parses one PEP 508 requirement.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequirement` when the name, extras, specifier
    /// or marker are malformed.
    pub fn parse(line: &str) -> Result<Self> {
        let text = line.trim();
        let invalid = |reason: String| Error::InvalidRequirement {
            line: text.to_string(),
            reason,
        };

        let name_match = NAME_RE
            .find(text)
            .ok_or_else(|| invalid("expected a package name".to_string()))?;
        let name = canonicalize_name(name_match.as_str());
        let mut rest = text[name_match.end()..].trim_start();

        let mut extras = Vec::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let close = after_bracket
                .find(']')
                .ok_or_else(|| invalid("unclosed '[' in extras".to_string()))?;
            for extra in after_bracket[..close].split(',').map(str::trim) {
                if extra.is_empty() {
                    continue;
                }
                if NAME_RE.find(extra).map(|m| m.as_str()) != Some(extra) {
                    return Err(invalid(format!("invalid extra '{}'", extra)));
                }
                extras.push(canonicalize_name(extra));
            }
            rest = after_bracket[close + 1..].trim_start();
        }

        let (specifier, url, marker_text) = if let Some(after_at) = rest.strip_prefix('@') {
            let after_at = after_at.trim_start();
            let url_end = after_at
                .find(char::is_whitespace)
                .unwrap_or(after_at.len());
            let url = &after_at[..url_end];
            if url.is_empty() {
                return Err(invalid("expected a URL after '@'".to_string()));
            }
            let tail = after_at[url_end..].trim();
            let marker_text = match tail.strip_prefix(';') {
                Some(marker) => Some(marker),
                None if tail.is_empty() => None,
                None => return Err(invalid(format!("unexpected text '{}' after URL", tail))),
            };
            (SpecifierSet::default(), Some(url.to_string()), marker_text)
        } else {
            let (spec_text, marker_text) = match rest.split_once(';') {
                Some((spec, marker)) => (spec, Some(marker)),
                None => (rest, None),
            };
            let mut spec_text = spec_text.trim();
            if let Some(inner) = spec_text.strip_prefix('(') {
                spec_text = inner
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("unclosed '(' in version specifier".to_string()))?;
            }
            let specifier =
                SpecifierSet::parse(spec_text).map_err(|err| invalid(err.to_string()))?;
            (specifier, None, marker_text)
        };

        let marker = match marker_text.map(str::trim) {
            Some("") => return Err(invalid("empty marker after ';'".to_string())),
            Some(text) => Some(Marker::parse(text).map_err(|err| invalid(err.to_string()))?),
            None => None,
        };

        Ok(Self {
            name,
            extras,
            specifier,
            url,
            marker,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        match &self.url {
            Some(url) => write!(f, " @ {}", url)?,
            None => write!(f, "{}", self.specifier)?,
        }
        if let Some(marker) = &self.marker {
            if self.url.is_some() {
                f.write_str(" ")?;
            }
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}

/// Parses one line of a requirement list.
///
/// Text after `#` is dropped. Returns `Ok(None)` for blank lines and for
/// lines starting with one of `ignore_prefixes`.
///
/// # Errors
///
/// Returns `Error::InvalidRequirement` if the remaining text is not a valid
/// requirement.
pub fn parse_requirement_line(line: &str, ignore_prefixes: &[&str]) -> Result<Option<Requirement>> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() || ignore_prefixes.iter().any(|prefix| line.starts_with(prefix)) {
        return Ok(None);
    }
    Requirement::parse(line).map(Some)
}

/// Parses a list of requirement lines into a map keyed by canonical name.
///
/// A later declaration of the same name replaces an earlier one.
///
/// # Errors
///
/// Returns the first parse error.
pub fn parse_requirements<'a, I>(lines: I, ignore_prefixes: &[&str]) -> Result<Requirements>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut requirements = Requirements::new();
    for line in lines {
        if let Some(req) = parse_requirement_line(line, ignore_prefixes)? {
            requirements.insert(req.name.clone(), req);
        }
    }
    Ok(requirements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_name() {
        assert_eq!(canonicalize_name("Foo.Bar__baz"), "foo-bar-baz");
        assert_eq!(canonicalize_name("requests"), "requests");
        assert_eq!(canonicalize_name("zope.interface"), "zope-interface");
    }

    #[test]
    fn test_parse_full_requirement() {
        let req =
            Requirement::parse(r#"Flask[Async, dotenv] >=2.0,!=2.1.0 ; python_version >= "3.8""#)
                .unwrap();
        assert_eq!(req.name, "flask");
        assert_eq!(req.extras, vec!["async", "dotenv"]);
        assert_eq!(req.specifier.to_string(), ">=2.0,!=2.1.0");
        assert!(req.marker.is_some());
        assert_eq!(
            req.to_string(),
            r#"flask[async,dotenv]>=2.0,!=2.1.0; python_version >= "3.8""#
        );
    }

    #[test]
    fn test_parse_parenthesized_specifier() {
        let req = Requirement::parse("foo (>=1.0, <2)").unwrap();
        assert_eq!(req.specifier.to_string(), ">=1.0,<2");
    }

    #[test]
    fn test_parse_bare_name() {
        let req = Requirement::parse("bar").unwrap();
        assert!(req.specifier.is_empty());
        assert!(req.url.is_none());
    }

    #[test]
    fn test_parse_direct_reference() {
        let req = Requirement::parse(
            r#"pkg @ https://example.com/pkg-1.0.tar.gz ; sys_platform == "linux""#,
        )
        .unwrap();
        assert_eq!(req.url.as_deref(), Some("https://example.com/pkg-1.0.tar.gz"));
        assert!(req.specifier.is_empty());
        assert!(req.marker.is_some());
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", ">=1.0", "foo >=", "foo[bar", "foo ; ", "foo @", "foo (>=1.0"] {
            assert!(Requirement::parse(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_requirement_lines_skip_comments_and_ignored_prefixes() {
        let lines = "# header\nfoo>=1.0  # trailing\n\n%(extra)s\nFoo>=2.0\nbar\n";
        let reqs = parse_requirements(lines.lines(), &["%"]).unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs["foo"].specifier.to_string(), ">=2.0");
        assert!(reqs.contains_key("bar"));
    }
}
