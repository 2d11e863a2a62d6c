// Rust guideline compliant 2026-02-06

//! PEP 508 environment markers.
//!
//! A marker such as `python_version < "3.11" and sys_platform == "linux"`
//! restricts a requirement to some environments. Requirements whose marker
//! evaluates to false are not checked against the lock file.

use crate::specifier::{Operator, Specifier};
use crate::version::Version;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Environment variables a marker may reference.
pub const MARKER_VARIABLES: [&str; 12] = [
    "implementation_name",
    "implementation_version",
    "os_name",
    "platform_machine",
    "platform_python_implementation",
    "platform_release",
    "platform_system",
    "platform_version",
    "python_full_version",
    "python_version",
    "sys_platform",
    "extra",
];

/// Legacy dotted spellings still accepted by Python packaging tools.
fn canonical_variable(name: &str) -> Option<&'static str> {
    let name = match name {
        "os.name" => "os_name",
        "sys.platform" => "sys_platform",
        "platform.version" => "platform_version",
        "platform.machine" => "platform_machine",
        "platform.python_implementation" | "python_implementation" => {
            "platform_python_implementation"
        }
        other => other,
    };
    MARKER_VARIABLES.iter().copied().find(|v| *v == name)
}

/// Values of the marker variables for one target environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerEnvironment {
    values: BTreeMap<String, String>,
}

impl MarkerEnvironment {
    /// Describes the host platform running a CPython of `python_version`.
    pub fn host(python_version: &Version) -> Self {
        let release = python_version.release();
        let short = format!(
            "{}.{}",
            release.first().copied().unwrap_or(0),
            release.get(1).copied().unwrap_or(0)
        );
        let full = if release.len() >= 3 {
            python_version.to_string()
        } else {
            format!("{}.0", short)
        };

        let os = std::env::consts::OS;
        let arch = std::env::consts::ARCH;
        let sys_platform = match os {
            "macos" => "darwin",
            "windows" => "win32",
            other => other,
        };
        let platform_system = match os {
            "linux" => "Linux",
            "macos" => "Darwin",
            "windows" => "Windows",
            "freebsd" => "FreeBSD",
            other => other,
        };
        let platform_machine = match (os, arch) {
            ("macos", "aarch64") => "arm64",
            ("windows", "x86_64") => "AMD64",
            (_, arch) => arch,
        };
        let os_name = if cfg!(windows) { "nt" } else { "posix" };

        let mut values = BTreeMap::new();
        let mut set = |key: &str, value: &str| {
            values.insert(key.to_string(), value.to_string());
        };
        set("implementation_name", "cpython");
        set("implementation_version", &full);
        set("os_name", os_name);
        set("platform_machine", platform_machine);
        set("platform_python_implementation", "CPython");
        set("platform_release", "");
        set("platform_system", platform_system);
        set("platform_version", "");
        set("python_full_version", &full);
        set("python_version", &short);
        set("sys_platform", sys_platform);
        set("extra", "");
        Self { values }
    }

    /// Overrides one variable.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `name` is not a marker variable.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let key = canonical_variable(name)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown marker variable '{}'", name)))?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Returns the value of a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Str(String),
    Word(String),
    Op(Operator),
}

/// Operand of a marker comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Variable(&'static str),
    Literal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Version(Operator),
    In,
    NotIn,
}

/// A parsed environment marker expression.
#[derive(Debug, Clone)]
pub struct Marker {
    source: String,
    expr: Expr,
}

#[derive(Debug, Clone)]
enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Compare { lhs: Value, op: CompareOp, rhs: Value },
}

impl Marker {
    /// Parses a marker expression.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMarker` on unknown variables, unbalanced
    /// parentheses, unterminated strings or missing operators.
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        let mut parser = MarkerParser {
            tokens,
            pos: 0,
            source: input,
        };
        let expr = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(Self {
            source: input.trim().to_string(),
            expr,
        })
    }

    /// Evaluates the marker against `env`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMarker` when a comparison is undefined for the
    /// operands, e.g. `~=` between two non-version strings.
    pub fn evaluate(&self, env: &MarkerEnvironment) -> Result<bool> {
        eval(&self.expr, env, &self.source)
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval(expr: &Expr, env: &MarkerEnvironment, source: &str) -> Result<bool> {
    match expr {
        Expr::And(items) => {
            for item in items {
                if !eval(item, env, source)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Expr::Or(items) => {
            for item in items {
                if eval(item, env, source)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::Compare { lhs, op, rhs } => {
            let is_extra = matches!(lhs, Value::Variable("extra")) || matches!(rhs, Value::Variable("extra"));
            let mut left = resolve(lhs, env);
            let mut right = resolve(rhs, env);
            if is_extra {
                left = crate::requirement::canonicalize_name(&left);
                right = crate::requirement::canonicalize_name(&right);
            }
            compare(&left, *op, &right).ok_or_else(|| Error::InvalidMarker {
                marker: source.to_string(),
                reason: format!("undefined comparison '{}' {:?} '{}'", left, op, right),
            })
        }
    }
}

fn resolve(value: &Value, env: &MarkerEnvironment) -> String {
    match value {
        Value::Variable(name) => env.get(name).unwrap_or_default().to_string(),
        Value::Literal(s) => s.clone(),
    }
}

/// Compares as versions when both sides allow it, otherwise as strings.
fn compare(left: &str, op: CompareOp, right: &str) -> Option<bool> {
    let op = match op {
        CompareOp::In => return Some(right.contains(left)),
        CompareOp::NotIn => return Some(!right.contains(left)),
        CompareOp::Version(op) => op,
    };

    if let (Ok(spec), Ok(version)) = (
        Specifier::parse(&format!("{}{}", op, right)),
        Version::parse(left),
    ) {
        return Some(spec.contains(&version));
    }

    match op {
        Operator::Equal => Some(left == right),
        Operator::NotEqual => Some(left != right),
        Operator::Less => Some(left < right),
        Operator::LessEqual => Some(left <= right),
        Operator::Greater => Some(left > right),
        Operator::GreaterEqual => Some(left >= right),
        Operator::Arbitrary => Some(left.eq_ignore_ascii_case(right)),
        Operator::Compatible => None,
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let invalid = |reason: &str| Error::InvalidMarker {
        marker: input.to_string(),
        reason: reason.to_string(),
    };
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(c) = input[pos..].chars().next() {
        match c {
            c if c.is_whitespace() => pos += c.len_utf8(),
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '\'' | '"' => {
                let rest = &input[pos + 1..];
                let end = rest
                    .find(c)
                    .ok_or_else(|| invalid("unterminated string"))?;
                tokens.push(Token::Str(rest[..end].to_string()));
                pos += end + 2;
            }
            '<' | '>' | '=' | '!' | '~' => {
                let rest = &input[pos..];
                let (op, after) =
                    Operator::split_prefix(rest).ok_or_else(|| invalid("unknown operator"))?;
                tokens.push(Token::Op(op));
                pos += rest.len() - after.len();
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                let rest = &input[pos..];
                let len = rest
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'))
                    .unwrap_or(rest.len());
                tokens.push(Token::Word(rest[..len].to_string()));
                pos += len;
            }
            other => return Err(invalid(&format!("unexpected character '{}'", other))),
        }
    }

    Ok(tokens)
}

struct MarkerParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl MarkerParser<'_> {
    fn error(&self, reason: &str) -> Error {
        Error::InvalidMarker {
            marker: self.source.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Word(w)) if w == word)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_and()?];
        while self.peek_word("or") {
            self.pos += 1;
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Or(items)
        })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_atom()?];
        while self.peek_word("and") {
            self.pos += 1;
            items.push(self.parse_atom()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::And(items)
        })
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        if self.tokens.get(self.pos) == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.parse_or()?;
            if self.tokens.get(self.pos) != Some(&Token::RParen) {
                return Err(self.error("expected ')'"));
            }
            self.pos += 1;
            return Ok(inner);
        }

        let lhs = self.parse_value()?;
        let op = self.parse_op()?;
        let rhs = self.parse_value()?;
        Ok(Expr::Compare { lhs, op, rhs })
    }

    fn parse_value(&mut self) -> Result<Value> {
        let value = match self.tokens.get(self.pos) {
            Some(Token::Str(s)) => Value::Literal(s.clone()),
            Some(Token::Word(w)) => Value::Variable(
                canonical_variable(w)
                    .ok_or_else(|| self.error(&format!("unknown variable '{}'", w)))?,
            ),
            _ => return Err(self.error("expected a variable or quoted string")),
        };
        self.pos += 1;
        Ok(value)
    }

    fn parse_op(&mut self) -> Result<CompareOp> {
        let op = match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => CompareOp::Version(*op),
            Some(Token::Word(w)) if w == "in" => CompareOp::In,
            Some(Token::Word(w)) if w == "not" => {
                if !matches!(self.tokens.get(self.pos + 1), Some(Token::Word(w)) if w == "in") {
                    return Err(self.error("expected 'in' after 'not'"));
                }
                self.pos += 1;
                CompareOp::NotIn
            }
            _ => return Err(self.error("expected a comparison operator")),
        };
        self.pos += 1;
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(python: &str) -> MarkerEnvironment {
        let mut env = MarkerEnvironment::host(&Version::parse(python).unwrap());
        env.set("sys_platform", "linux").unwrap();
        env.set("platform_system", "Linux").unwrap();
        env
    }

    fn eval_marker(marker: &str, python: &str) -> bool {
        Marker::parse(marker).unwrap().evaluate(&env(python)).unwrap()
    }

    #[test]
    fn test_python_version_comparisons() {
        assert!(eval_marker(r#"python_version < "3.12""#, "3.11"));
        assert!(!eval_marker(r#"python_version < "3.11""#, "3.11"));
        assert!(eval_marker(r#"python_version >= "3.9""#, "3.11"));
        assert!(eval_marker(r#"python_full_version == "3.11.0""#, "3.11"));
        assert!(eval_marker(r#"python_version == "3.11.*""#, "3.11"));
    }

    #[test]
    fn test_string_comparisons_and_membership() {
        assert!(eval_marker(r#"sys_platform == 'linux'"#, "3.11"));
        assert!(!eval_marker(r#"sys_platform != "linux""#, "3.11"));
        assert!(eval_marker(r#"'linux' in sys_platform"#, "3.11"));
        assert!(eval_marker(r#"sys_platform not in "win32 cygwin""#, "3.11"));
        assert!(eval_marker(r#"os.name == os_name"#, "3.11"));
    }

    #[test]
    fn test_boolean_combinations() {
        let marker = r#"(sys_platform == "win32" or python_version < "3.10") and platform_system != "Java""#;
        assert!(!eval_marker(marker, "3.11"));
        assert!(eval_marker(marker, "3.9"));
        assert!(eval_marker(
            r#"sys_platform == "darwin" or sys_platform == "linux""#,
            "3.11"
        ));
    }

    #[test]
    fn test_extra_defaults_to_empty() {
        assert!(!eval_marker(r#"extra == "test""#, "3.11"));
        let mut with_extra = env("3.11");
        with_extra.set("extra", "Dev_Tools").unwrap();
        let marker = Marker::parse(r#"extra == "dev-tools""#).unwrap();
        assert!(marker.evaluate(&with_extra).unwrap());
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            r#"python_version"#,
            r#"python_version <"#,
            r#"unknown_var == "1""#,
            r#"(python_version < "3.11""#,
            r#"python_version < "3.11" and"#,
            r#"sys_platform == "linux"#,
            r#"sys_platform not "linux""#,
        ] {
            assert!(Marker::parse(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_undefined_comparison_is_an_error() {
        let marker = Marker::parse(r#"sys_platform ~= "linux""#).unwrap();
        assert!(marker.evaluate(&env("3.11")).is_err());
    }

    #[test]
    fn test_unknown_override_rejected() {
        let mut env = env("3.11");
        assert!(env.set("python_flavour", "x").is_err());
    }
}
