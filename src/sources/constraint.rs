//! Build constraints: which files of a package directory belong to the
//! package for the current target.
//!
//! A file is excluded when its name ends in a GOOS and/or GOARCH suffix
//! (`x_windows.go`, `x_arm64.s`, `x_linux_amd64.go`, before any `_test`)
//! that does not match the target, or when a `//go:build` line (or, if
//! there is none, the legacy `// +build` lines) in the file header
//! evaluates to false. The tag `ignore` is never satisfied, so
//! `//go:build ignore` always excludes a file.

use std::collections::BTreeSet;
use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// A malformed `//go:build` expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("unexpected `{0}` in build constraint")]
    Unexpected(String),

    #[error("unexpected end of build constraint")]
    UnexpectedEnd,
}

/// The target a package is loaded for: an OS, an architecture and the
/// extra tags that are considered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTags {
    goos: String,
    goarch: String,
    tags: BTreeSet<String>,
}

impl BuildTags {
    /// Tags for a GOOS/GOARCH pair, with the implied `unix`, `gc` and `cgo`.
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        let goos = goos.into();
        let goarch = goarch.into();

        let mut tags = BTreeSet::new();
        tags.insert(goos.clone());
        tags.insert(goarch.clone());
        tags.insert("gc".to_string());
        tags.insert("cgo".to_string());
        if UNIX_OS.contains(&goos.as_str()) {
            tags.insert("unix".to_string());
        }
        // These report themselves as a more general OS as well.
        match goos.as_str() {
            "android" => tags.insert("linux".to_string()),
            "ios" => tags.insert("darwin".to_string()),
            "illumos" => tags.insert("solaris".to_string()),
            _ => false,
        };

        BuildTags { goos, goarch, tags }
    }

    /// Tags describing the machine zb runs on.
    pub fn host() -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "loongarch64" => "loong64",
            "wasm32" => "wasm",
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
            "powerpc64" => "ppc64",
            other => other,
        };
        BuildTags::new(goos, goarch)
    }

    /// Add custom tags, as with `-tags`.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn goos(&self) -> &str {
        &self.goos
    }

    pub fn goarch(&self) -> &str {
        &self.goarch
    }

    /// Check if a single tag is set. Release tags (`go1.N`) always are.
    pub fn is_set(&self, tag: &str) -> bool {
        if let Some(minor) = tag.strip_prefix("go1.") {
            return !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit());
        }
        self.tags.contains(tag)
    }

    /// Check a file name's GOOS/GOARCH suffix against the target.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.split('.').next().unwrap_or(name);
        let Some(at) = stem.find('_') else {
            return true;
        };
        let stem = &stem[at..];
        let stem = stem.strip_suffix("_test").unwrap_or(stem);

        let parts: Vec<&str> = stem.split('_').collect();
        let n = parts.len();

        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.is_set(parts[n - 2]) && self.is_set(parts[n - 1]);
        }
        if n >= 1 && (KNOWN_OS.contains(&parts[n - 1]) || KNOWN_ARCH.contains(&parts[n - 1])) {
            return self.is_set(parts[n - 1]);
        }
        true
    }

    /// Evaluate the build constraints in a Go source file's header.
    pub fn matches_source(&self, src: &str) -> Result<bool, ConstraintError> {
        let mut plus_build = Vec::new();

        for line in header_comments(src) {
            if let Some(expr) = line.strip_prefix("//go:build") {
                if expr.is_empty() || expr.starts_with(char::is_whitespace) {
                    return self.eval(expr);
                }
            }
            if let Some(rest) = line.strip_prefix("//") {
                if let Some(options) = rest.trim_start().strip_prefix("+build") {
                    plus_build.push(options);
                }
            }
        }

        Ok(plus_build.into_iter().all(|line| self.eval_plus_build(line)))
    }

    /// Evaluate a `//go:build` expression.
    pub fn eval(&self, expr: &str) -> Result<bool, ConstraintError> {
        let mut parser = Parser {
            tags: self,
            chars: expr.char_indices().peekable(),
            src: expr,
        };
        let value = parser.or()?;
        match parser.token()? {
            None => Ok(value),
            Some(token) => Err(ConstraintError::Unexpected(token.to_string())),
        }
    }

    /// A `// +build` line: space-separated options are ORed, the
    /// comma-separated terms of an option are ANDed.
    fn eval_plus_build(&self, line: &str) -> bool {
        let mut options = line.split_whitespace().peekable();
        if options.peek().is_none() {
            return true;
        }
        options.any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !tag.starts_with('!') && !self.is_set(tag),
                None => self.is_set(term),
            })
        })
    }
}

impl Default for BuildTags {
    fn default() -> Self {
        Self::host()
    }
}

/// The `//` comment lines before the package clause, trimmed.
fn header_comments(src: &str) -> impl Iterator<Item = &str> {
    let mut in_block = false;

    src.lines()
        .map(str::trim)
        .take_while(move |line| {
            if in_block {
                in_block = !line.contains("*/");
                return true;
            }
            if let Some(rest) = line.strip_prefix("/*") {
                in_block = !rest.contains("*/");
                return true;
            }
            line.is_empty() || line.starts_with("//")
        })
        .filter(|line| line.starts_with("//"))
}

struct Parser<'a> {
    tags: &'a BuildTags,
    chars: Peekable<CharIndices<'a>>,
    src: &'a str,
}

impl<'a> Parser<'a> {
    fn or(&mut self) -> Result<bool, ConstraintError> {
        let mut value = self.and()?;
        while self.eat("||")? {
            // Evaluate both sides so a malformed right operand is still an error.
            let rhs = self.and()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and(&mut self) -> Result<bool, ConstraintError> {
        let mut value = self.not()?;
        while self.eat("&&")? {
            let rhs = self.not()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn not(&mut self) -> Result<bool, ConstraintError> {
        if self.eat("!")? {
            return Ok(!self.not()?);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<bool, ConstraintError> {
        match self.token()? {
            Some("(") => {
                let value = self.or()?;
                match self.token()? {
                    Some(")") => Ok(value),
                    Some(token) => Err(ConstraintError::Unexpected(token.to_string())),
                    None => Err(ConstraintError::UnexpectedEnd),
                }
            }
            Some(token) if is_tag(token) => Ok(self.tags.is_set(token)),
            Some(token) => Err(ConstraintError::Unexpected(token.to_string())),
            None => Err(ConstraintError::UnexpectedEnd),
        }
    }

    /// Consume the next token if it is `expected`.
    fn eat(&mut self, expected: &str) -> Result<bool, ConstraintError> {
        let saved = self.chars.clone();
        match self.token()? {
            Some(token) if token == expected => Ok(true),
            _ => {
                self.chars = saved;
                Ok(false)
            }
        }
    }

    fn token(&mut self) -> Result<Option<&'a str>, ConstraintError> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let Some((start, c)) = self.chars.next() else {
            return Ok(None);
        };

        let end = match c {
            '(' | ')' | '!' => start + 1,
            '&' | '|' => match self.chars.next() {
                Some((_, next)) if next == c => start + 2,
                _ => return Err(ConstraintError::Unexpected(c.to_string())),
            },
            c if is_tag_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some((at, next)) = self.chars.next_if(|(_, c)| is_tag_char(*c)) {
                    end = at + next.len_utf8();
                }
                end
            }
            c => return Err(ConstraintError::Unexpected(c.to_string())),
        };

        Ok(Some(&self.src[start..end]))
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn is_tag(token: &str) -> bool {
    token.chars().all(is_tag_char)
}
