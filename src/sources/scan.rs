//! Source scanning: package clauses, import declarations and generate
//! directives.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static PACKAGE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());

static SINGLE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?"([^"]+)""#).unwrap()
});

static IMPORT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^\s*import\s*\((.*?)\)").unwrap());

static IMPORT_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?"([^"]+)""#).unwrap()
});

static GENERATE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^//go:generate[ \t]+(.+?)[ \t]*\r?$").unwrap());

/// The package clause name of a source file.
pub fn package_clause(src: &str) -> Option<&str> {
    PACKAGE_CLAUSE
        .captures(src)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Blank out `//` and `/* */` comments, keeping line breaks so that
/// line-anchored patterns still see the same lines. String, raw string and
/// rune literals are left intact.
fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
                out.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            '"' | '\'' | '`' => {
                out.push(c);
                while let Some(next) = chars.next() {
                    out.push(next);
                    if next == '\\' && c != '`' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if next == c || (next == '\n' && c != '`') {
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Import paths declared in a source file, deduplicated and sorted.
///
/// Comments are ignored, so neither a commented-out import nor a `)` inside
/// a comment in an import block changes the result.
pub fn scan_imports(src: &str) -> BTreeSet<String> {
    let src = strip_comments(src);
    let src = src.as_str();

    let single = SINGLE_IMPORT
        .captures_iter(src)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let grouped = IMPORT_BLOCK
        .captures_iter(src)
        .filter_map(|c| c.get(1))
        .flat_map(|block| {
            IMPORT_SPEC
                .captures_iter(block.as_str())
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
        });

    single.chain(grouped).collect()
}

/// Generate directive commands in a source text, in file order.
pub fn generate_directives(src: &str) -> Vec<String> {
    GENERATE_DIRECTIVE
        .captures_iter(src)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Generate directive commands in a source file.
pub fn generate_directives_in_file(path: &Path) -> io::Result<Vec<String>> {
    let src = std::fs::read_to_string(path)?;
    Ok(generate_directives(&src))
}
