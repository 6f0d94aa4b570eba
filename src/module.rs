//! Module Resolver: loads a Python source file for static analysis.
//!
//! Loading distinguishes three failure kinds, surfaced as [`ReprError`]
//! variants rather than panics:
//!
//! - the path does not resolve to a file (`ModuleNotFound`)
//! - the file cannot be read as UTF-8 text (`ModuleLoadFailure`)
//! - the text is not structurally valid (`ModuleSyntaxInvalid`)
//!
//! "Structurally valid" means the things the generator itself depends on:
//! balanced brackets outside string literals and terminated strings. Full
//! grammar validation is out of scope; downstream stages report header-level
//! problems (e.g. a `def` with no `:`) as syntax errors too.
//!
//! Lines are 1-indexed in all user-facing positions, matching editor
//! conventions.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ReprError;

/// A loaded Python module, split into lines.
///
/// The module name is the file stem; it backs the ownership predicate in
/// the class enumerator and appears in diagnostics.
#[derive(Debug, Clone)]
pub struct PyModule {
    pub name: String,
    pub path: PathBuf,
    pub lines: Vec<String>,
    /// Whether the file ended with a newline; apply mode preserves it.
    pub trailing_newline: bool,
    /// Per-line flag: the line begins inside a (multi-line) string literal.
    /// Such lines are string content, not statements, whatever they look
    /// like.
    starts_in_string: Vec<bool>,
}

impl PyModule {
    /// Load and validate a module from a file path.
    pub fn load(path: &Path) -> Result<PyModule, ReprError> {
        if !path.is_file() {
            return Err(ReprError::ModuleNotFound {
                path: path.to_path_buf(),
            });
        }
        let source = fs::read_to_string(path).map_err(|e| ReprError::ModuleLoadFailure {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let module = Self::from_source(name, path, &source)?;
        debug!(module = %module.name, lines = module.lines.len(), "loaded module");
        Ok(module)
    }

    /// Build and validate a module from source text already in memory.
    pub fn from_source(
        name: impl Into<String>,
        path: &Path,
        source: &str,
    ) -> Result<PyModule, ReprError> {
        let lines: Vec<String> = source.lines().map(str::to_string).collect();
        let starts_in_string = validate_structure(path, &lines)?;
        Ok(PyModule {
            name: name.into(),
            path: path.to_path_buf(),
            lines,
            trailing_newline: source.ends_with('\n'),
            starts_in_string,
        })
    }

    /// Whether the line at `idx` begins inside a multi-line string literal.
    pub fn line_in_string(&self, idx: usize) -> bool {
        self.starts_in_string.get(idx).copied().unwrap_or(false)
    }

    /// Number of leading spaces on a line (tabs count as one column).
    pub fn indent_of(line: &str) -> usize {
        line.len() - line.trim_start().len()
    }

    /// Last line index of the indentation-delimited block starting at
    /// `header` (0-based), i.e. the statement header plus every following
    /// line indented deeper than it. Trailing blank lines are not part of
    /// the block.
    pub fn block_end(&self, header: usize) -> usize {
        let indent = Self::indent_of(&self.lines[header]);
        let mut end = header;
        let mut i = header + 1;
        // A multi-line header (open brackets) belongs to the block even if
        // its continuation lines are dedented.
        let mut depth = bracket_depth_delta(&self.lines[header]);
        while i < self.lines.len() {
            let line = &self.lines[i];
            // Interior of a multi-line string belongs to the block whatever
            // its indentation looks like.
            if self.line_in_string(i) {
                end = i;
                i += 1;
                continue;
            }
            if line.trim().is_empty() {
                i += 1;
                continue;
            }
            if depth == 0 && Self::indent_of(line) <= indent {
                break;
            }
            depth = (depth + bracket_depth_delta(line)).max(0);
            end = i;
            i += 1;
        }
        end
    }
}

/// Net bracket depth change of one line, ignoring strings and comments.
pub(crate) fn bracket_depth_delta(line: &str) -> i32 {
    let mut depth = 0i32;
    let mut chars = line.chars();
    let mut in_string: Option<char> = None;
    while let Some(c) = chars.next() {
        match in_string {
            Some(q) => match c {
                '\\' => {
                    chars.next();
                }
                c if c == q => in_string = None,
                _ => {}
            },
            None => match c {
                '#' => break,
                '\'' | '"' => in_string = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            },
        }
    }
    depth
}

// ============================================================================
// Structural validation
// ============================================================================

/// Tracks string state across lines (triple-quoted strings span lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrState {
    None,
    Single(char),
    Triple(char),
}

/// Validate bracket balance and string termination over the whole module.
///
/// Returns, per line, whether the line begins inside a string literal
/// carried over from a previous line. Those lines are string content and
/// must never be read as statements.
fn validate_structure(path: &Path, lines: &[String]) -> Result<Vec<bool>, ReprError> {
    let mut stack: Vec<(char, u32)> = Vec::new();
    let mut state = StrState::None;
    let mut starts_in_string = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let lineno = idx as u32 + 1;
        starts_in_string.push(state != StrState::None);
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match state {
                StrState::Single(_) | StrState::Triple(_) if c == '\\' => {
                    i += 2;
                    continue;
                }
                StrState::Single(q) => {
                    if c == q {
                        state = StrState::None;
                    }
                }
                StrState::Triple(q) => {
                    if c == q && chars.get(i + 1) == Some(&q) && chars.get(i + 2) == Some(&q) {
                        state = StrState::None;
                        i += 3;
                        continue;
                    }
                }
                StrState::None => match c {
                    '#' => break,
                    '\'' | '"' => {
                        if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                            state = StrState::Triple(c);
                            i += 3;
                            continue;
                        }
                        state = StrState::Single(c);
                    }
                    '(' | '[' | '{' => stack.push((c, lineno)),
                    ')' | ']' | '}' => {
                        let expected = match c {
                            ')' => '(',
                            ']' => '[',
                            _ => '{',
                        };
                        match stack.pop() {
                            Some((open, _)) if open == expected => {}
                            _ => {
                                return Err(ReprError::ModuleSyntaxInvalid {
                                    path: path.to_path_buf(),
                                    line: lineno,
                                    message: format!("unmatched '{c}'"),
                                });
                            }
                        }
                    }
                    _ => {}
                },
            }
            i += 1;
        }
        // Single-quoted strings may not span lines, except via an explicit
        // trailing-backslash continuation.
        if line.ends_with('\\') {
            continue;
        }
        if let StrState::Single(q) = state {
            return Err(ReprError::ModuleSyntaxInvalid {
                path: path.to_path_buf(),
                line: lineno,
                message: format!("unterminated string literal ({q})"),
            });
        }
    }

    if let Some((open, lineno)) = stack.pop() {
        return Err(ReprError::ModuleSyntaxInvalid {
            path: path.to_path_buf(),
            line: lineno,
            message: format!("'{open}' was never closed"),
        });
    }
    if let StrState::Triple(q) = state {
        return Err(ReprError::ModuleSyntaxInvalid {
            path: path.to_path_buf(),
            line: lines.len() as u32,
            message: format!("unterminated triple-quoted string ({q})"),
        });
    }
    Ok(starts_in_string)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn module_from(src: &str) -> PyModule {
        PyModule::from_source("m", Path::new("m.py"), src).expect("valid source")
    }

    mod loading {
        use super::*;

        #[test]
        fn missing_file_is_module_not_found() {
            let err = PyModule::load(Path::new("/nonexistent/definitely_missing.py"))
                .expect_err("should fail");
            assert!(matches!(err, ReprError::ModuleNotFound { .. }));
        }
    }

    mod validation {
        use super::*;

        fn check(src: &str) -> Result<(), ReprError> {
            let lines: Vec<String> = src.lines().map(str::to_string).collect();
            validate_structure(Path::new("m.py"), &lines).map(|_| ())
        }

        #[test]
        fn balanced_module_passes() {
            check("class A:\n    def __init__(self, x=(1, 2)):\n        self.x = x\n")
                .expect("valid");
        }

        #[test]
        fn unmatched_close_fails() {
            let err = check("def f()):\n    pass\n").expect_err("should fail");
            match err {
                ReprError::ModuleSyntaxInvalid { line, message, .. } => {
                    assert_eq!(line, 1);
                    assert!(message.contains("unmatched"));
                }
                other => panic!("expected ModuleSyntaxInvalid, got {other:?}"),
            }
        }

        #[test]
        fn unclosed_open_reports_opener_line() {
            let err = check("def f(\n    pass\n").expect_err("should fail");
            match err {
                ReprError::ModuleSyntaxInvalid { line, .. } => assert_eq!(line, 1),
                other => panic!("expected ModuleSyntaxInvalid, got {other:?}"),
            }
        }

        #[test]
        fn brackets_inside_strings_are_ignored() {
            check("x = ')))'\ny = \"(((\"\n").expect("strings hide brackets");
        }

        #[test]
        fn brackets_after_comment_are_ignored() {
            check("x = 1  # not a real (\n").expect("comments hide brackets");
        }

        #[test]
        fn triple_quoted_string_spans_lines() {
            check("s = \"\"\"\n) ] }\n\"\"\"\n").expect("triple strings hide brackets");
        }

        #[test]
        fn unterminated_single_string_fails() {
            let err = check("x = 'oops\n").expect_err("should fail");
            assert!(matches!(err, ReprError::ModuleSyntaxInvalid { line: 1, .. }));
        }
    }

    mod blocks {
        use super::*;

        #[test]
        fn block_end_simple() {
            let m = module_from("def f():\n    a = 1\n    b = 2\nx = 3\n");
            assert_eq!(m.block_end(0), 2);
        }

        #[test]
        fn block_end_skips_trailing_blanks() {
            let m = module_from("def f():\n    a = 1\n\n\nx = 3\n");
            assert_eq!(m.block_end(0), 1);
        }

        #[test]
        fn block_end_with_multiline_header() {
            let m = module_from("def f(\n    x,\n    y,\n):\n    return x\nz = 1\n");
            assert_eq!(m.block_end(0), 4);
        }

        #[test]
        fn block_end_interior_blank_lines_kept() {
            let m = module_from("def f():\n    a = 1\n\n    b = 2\nx = 3\n");
            assert_eq!(m.block_end(0), 3);
        }

        #[test]
        fn indent_of_counts_spaces() {
            assert_eq!(PyModule::indent_of("    pass"), 4);
            assert_eq!(PyModule::indent_of("pass"), 0);
        }

        #[test]
        fn block_end_keeps_dedented_string_interior() {
            // The raw column-0 text lives inside a triple-quoted string and
            // must not terminate the enclosing block.
            let m = module_from(
                "def f():\n    s = \"\"\"\nraw column zero text\n\"\"\"\n    return s\nx = 1\n",
            );
            assert_eq!(m.block_end(0), 4);
        }

        #[test]
        fn string_interior_lines_are_flagged() {
            let m = module_from("s = \"\"\"\ninside\n\"\"\"\nx = 1\n");
            assert!(!m.line_in_string(0));
            assert!(m.line_in_string(1));
            assert!(m.line_in_string(2));
            assert!(!m.line_in_string(3));
        }
    }
}
