//! Class Enumerator: finds classes defined by a module.
//!
//! Only `class` statements at module top level count. A class merely
//! imported into the module is a bound name, not a `class` statement, so it
//! never appears here; ownership is still confirmed by an explicit
//! declaring-module check ([`ClassRecord::is_defined_in`]) before a record
//! is yielded.
//!
//! Enumeration is lazy and restartable: each [`enumerate_classes`] call
//! re-derives the sequence from the module lines.

use tracing::trace;

use crate::module::{bracket_depth_delta, PyModule};

/// A class located in a module.
///
/// Line fields are 0-based indices into `PyModule::lines`; user-facing
/// positions add 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    /// The class name as written after `class`.
    pub name: String,
    /// Index of the `class` header line.
    pub header: usize,
    /// Index of the line holding the header's closing `:` (equals `header`
    /// unless the base list spans lines).
    pub header_end: usize,
    /// Index of the last line of the class body.
    pub body_end: usize,
    /// Name of the declaring module.
    pub module_name: String,
}

impl ClassRecord {
    /// Ownership predicate: is this class declared by `module`?
    pub fn is_defined_in(&self, module: &PyModule) -> bool {
        self.module_name == module.name
    }

    /// Indentation of the class members, or `None` for an empty body.
    pub fn member_indent(&self, module: &PyModule) -> Option<usize> {
        module.lines[self.header_end + 1..=self.body_end.max(self.header_end)]
            .iter()
            .find(|l| !l.trim().is_empty())
            .map(|l| PyModule::indent_of(l))
    }

    /// Line index of a `def <name>` declared directly on this class, if any.
    pub fn method_def_line(&self, module: &PyModule, method: &str) -> Option<usize> {
        let indent = self.member_indent(module)?;
        let needle = format!("def {method}");
        (self.header_end + 1..=self.body_end).find(|&i| {
            let line = &module.lines[i];
            !module.line_in_string(i)
                && PyModule::indent_of(line) == indent
                && line.trim_start().starts_with(&needle)
                && line.trim_start()[4 + method.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c == '(' || c.is_whitespace())
        })
    }

    /// Whether the class already declares its own `__repr__`.
    pub fn has_repr(&self, module: &PyModule) -> bool {
        self.method_def_line(module, "__repr__").is_some()
    }
}

/// Iterate over the classes defined at the top level of `module`, in source
/// order.
pub fn enumerate_classes<'a>(module: &'a PyModule) -> impl Iterator<Item = ClassRecord> + 'a {
    ClassIter { module, next: 0 }.filter(|record| record.is_defined_in(module))
}

struct ClassIter<'a> {
    module: &'a PyModule,
    next: usize,
}

impl<'a> Iterator for ClassIter<'a> {
    type Item = ClassRecord;

    fn next(&mut self) -> Option<ClassRecord> {
        while self.next < self.module.lines.len() {
            let idx = self.next;
            self.next += 1;
            let line = &self.module.lines[idx];
            // Lines that open inside a string literal (docstrings quoting
            // example code, say) are text, not definitions.
            if self.module.line_in_string(idx) || PyModule::indent_of(line) != 0 {
                continue;
            }
            let Some(name) = class_name(line) else {
                continue;
            };
            let header_end = header_end(self.module, idx);
            let body_end = self.module.block_end(idx);
            // Resume scanning after this class body.
            self.next = body_end + 1;
            trace!(class = %name, line = idx + 1, "found class definition");
            return Some(ClassRecord {
                name,
                header: idx,
                header_end,
                body_end,
                module_name: self.module.name.clone(),
            });
        }
        None
    }
}

/// Extract the class name from a `class ...` header line, if it is one.
fn class_name(line: &str) -> Option<String> {
    let rest = line.strip_prefix("class")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let name: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() || name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(name)
}

/// Line index where the header's bracket nesting returns to zero.
fn header_end(module: &PyModule, header: usize) -> usize {
    let mut depth = 0i32;
    for (i, line) in module.lines.iter().enumerate().skip(header) {
        depth += bracket_depth_delta(line);
        if depth <= 0 {
            return i;
        }
    }
    module.lines.len() - 1
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn module_from(src: &str) -> PyModule {
        PyModule::from_source("m", Path::new("m.py"), src).expect("valid source")
    }

    mod enumeration {
        use super::*;

        #[test]
        fn finds_top_level_classes() {
            let m = module_from(
                "import os\n\nclass A:\n    pass\n\nclass B(A):\n    def __init__(self):\n        pass\n",
            );
            let names: Vec<String> = enumerate_classes(&m).map(|c| c.name).collect();
            assert_eq!(names, vec!["A", "B"]);
        }

        #[test]
        fn no_classes_yields_empty() {
            let m = module_from("x = 1\n\ndef f():\n    pass\n");
            assert_eq!(enumerate_classes(&m).count(), 0);
        }

        #[test]
        fn nested_classes_are_not_top_level() {
            let m = module_from("class Outer:\n    class Inner:\n        pass\n");
            let names: Vec<String> = enumerate_classes(&m).map(|c| c.name).collect();
            assert_eq!(names, vec!["Outer"]);
        }

        #[test]
        fn imported_names_are_not_classes() {
            let m = module_from("from collections import OrderedDict\n\nclass Mine:\n    pass\n");
            let names: Vec<String> = enumerate_classes(&m).map(|c| c.name).collect();
            assert_eq!(names, vec!["Mine"]);
        }

        #[test]
        fn restartable() {
            let m = module_from("class A:\n    pass\n");
            assert_eq!(enumerate_classes(&m).count(), 1);
            assert_eq!(enumerate_classes(&m).count(), 1);
        }

        #[test]
        fn multiline_base_list() {
            let m = module_from(
                "class A(\n    Base1,\n    Base2,\n):\n    def __init__(self):\n        pass\nx = 1\n",
            );
            let record = enumerate_classes(&m).next().expect("class A");
            assert_eq!(record.header_end, 3);
            assert_eq!(record.body_end, 5);
        }

        #[test]
        fn class_in_docstring_is_not_enumerated() {
            let m = module_from(
                "\"\"\"Example:\n\nclass Demo:\n    def __init__(self, x):\n        self.x = x\n\"\"\"\n\nclass Real:\n    def __init__(self, y):\n        self.y = y\n",
            );
            let names: Vec<String> = enumerate_classes(&m).map(|c| c.name).collect();
            assert_eq!(names, vec!["Real"]);
        }

        #[test]
        fn class_word_prefix_is_not_a_class() {
            let m = module_from("classify = 1\nclass_ = 2\nclass Real:\n    pass\n");
            let names: Vec<String> = enumerate_classes(&m).map(|c| c.name).collect();
            assert_eq!(names, vec!["Real"]);
        }
    }

    mod records {
        use super::*;

        #[test]
        fn ownership_predicate_matches_module_name() {
            let m = module_from("class A:\n    pass\n");
            let record = enumerate_classes(&m).next().expect("class A");
            assert!(record.is_defined_in(&m));

            let other = PyModule::from_source("other", Path::new("other.py"), "class A:\n    pass\n")
                .expect("valid source");
            assert!(!record.is_defined_in(&other));
        }

        #[test]
        fn detects_existing_repr() {
            let m = module_from(
                "class A:\n    def __init__(self):\n        pass\n\n    def __repr__(self):\n        return 'A'\n",
            );
            let record = enumerate_classes(&m).next().expect("class A");
            assert!(record.has_repr(&m));
            assert_eq!(record.method_def_line(&m, "__init__"), Some(1));
        }

        #[test]
        fn repr_quoted_in_docstring_does_not_count() {
            let m = module_from(
                "class A:\n    \"\"\"Usage:\n\n    def __repr__(self):\n        ...\n    \"\"\"\n\n    def __init__(self):\n        pass\n",
            );
            let record = enumerate_classes(&m).next().expect("class A");
            assert!(!record.has_repr(&m));
            assert_eq!(record.method_def_line(&m, "__init__"), Some(7));
        }

        #[test]
        fn repr_on_nested_class_does_not_count() {
            let m = module_from(
                "class A:\n    class Inner:\n        def __repr__(self):\n            return 'i'\n",
            );
            let record = enumerate_classes(&m).next().expect("class A");
            assert!(!record.has_repr(&m));
        }

        #[test]
        fn member_indent_of_simple_body() {
            let m = module_from("class A:\n    pass\nclass B:\n    pass\n");
            let record = enumerate_classes(&m).next().expect("class A");
            assert_eq!(record.member_indent(&m), Some(4));
        }
    }
}
