//! Diff/Write Driver: composes the pipeline over one module.
//!
//! The stages run in order: load, enumerate, then per class extract,
//! filter, synthesize, and finally aggregate. Per-class conditions (no
//! constructor, var-positional parameters, an existing `__repr__` under
//! `--skip-existing`) skip that class only; module-level load failures
//! abort the run; producing zero changes is itself a failure, detected
//! after all classes have been attempted.
//!
//! Apply mode never writes a partial file: the rewritten lines are fully
//! assembled in memory before the single write.
//!
//! The removal pipeline is the inverse: it deletes the `__repr__` of every
//! class that could have one generated, leaving hand-written methods on
//! non-candidate classes alone.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::classes::enumerate_classes;
use crate::error::ReprError;
use crate::module::PyModule;
use crate::output::ReportEntry;
use crate::signature::{extract_constructor, is_eligible};
use crate::synth::repr_lines;

/// What to do with the rewritten module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Emit the resulting module lines.
    Show,
    /// Emit a unified diff between original and resulting lines.
    Diff,
    /// Persist the resulting lines back to the module file.
    Write,
}

/// Generation options consumed from the CLI shell.
#[derive(Debug, Clone)]
pub struct Options {
    /// Literal placeholder rendered for a `**kwargs` capture.
    pub kwarg_splat: String,
    /// Skip classes that already declare a `__repr__`.
    pub skip_existing: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            kwarg_splat: "{}".to_string(),
            skip_existing: false,
        }
    }
}

/// One generated method block, keyed by its insertion point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub class_name: String,
    /// 0-based line index the block is inserted before (immediately after
    /// the constructor body).
    pub insert_at: usize,
    pub lines: Vec<String>,
}

/// Run the pipeline over the module at `path`.
///
/// Returns the lines to print (`Show` and `Diff`); `Write` persists the
/// rewrite and returns nothing to print.
pub fn run(path: &Path, mode: Mode, options: &Options) -> Result<Vec<String>, ReprError> {
    let module = PyModule::load(path)?;
    let changes = collect_changes(&module, options)?;
    if changes.is_empty() {
        return Err(ReprError::NoRepresentations {
            path: path.to_path_buf(),
        });
    }
    debug!(changes = changes.len(), ?mode, "aggregated changes");

    match mode {
        Mode::Show => Ok(apply_changes(&module.lines, &changes)),
        Mode::Diff => {
            let insertions: Vec<(usize, Vec<String>)> = changes
                .into_iter()
                .map(|c| (c.insert_at, c.lines))
                .collect();
            let diff = crate::diff::unified_diff_insertions(
                &module.path.display().to_string(),
                &module.lines,
                &insertions,
            );
            Ok(diff.lines().map(str::to_string).collect())
        }
        Mode::Write => {
            let result = apply_changes(&module.lines, &changes);
            let mut text = result.join("\n");
            if module.trailing_newline {
                text.push('\n');
            }
            fs::write(path, text).map_err(|e| ReprError::WriteFailure {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Vec::new())
        }
    }
}

/// Extract, filter, and synthesize for every class of the module.
///
/// Changes come back sorted by insertion point (source order).
pub fn collect_changes(module: &PyModule, options: &Options) -> Result<Vec<Change>, ReprError> {
    let mut changes = Vec::new();
    for record in enumerate_classes(module) {
        if options.skip_existing && record.has_repr(module) {
            debug!(class = %record.name, "skipped: __repr__ already defined");
            continue;
        }
        let model = extract_constructor(&record, module)?;
        let Some(params) = &model.params else {
            debug!(class = %record.name, "skipped: no explicit __init__");
            continue;
        };
        if !is_eligible(params) {
            debug!(class = %record.name, "skipped: var-positional parameter");
            continue;
        }
        let lines = repr_lines(&model, &options.kwarg_splat);
        let body_lines = model
            .source_text
            .as_deref()
            .map_or(0, |t| t.lines().count());
        let insert_at = (model.source_line - 1) as usize + body_lines;
        changes.push(Change {
            class_name: record.name.clone(),
            insert_at,
            lines,
        });
    }
    Ok(changes)
}

/// Insert all change blocks into the original lines.
///
/// Applied bottom-up so earlier insertions do not shift later positions.
pub fn apply_changes(original: &[String], changes: &[Change]) -> Vec<String> {
    let mut result: Vec<String> = original.to_vec();
    let mut ordered: Vec<&Change> = changes.iter().collect();
    ordered.sort_by_key(|c| std::cmp::Reverse(c.insert_at));
    for change in ordered {
        let at = change.insert_at.min(result.len());
        result.splice(at..at, change.lines.iter().cloned());
    }
    result
}

// ============================================================================
// Removal
// ============================================================================

/// One `__repr__` method scheduled for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub class_name: String,
    /// 0-based index of the `def __repr__` line.
    pub start: usize,
    /// 0-based index of the last body line, inclusive.
    pub end: usize,
}

/// Run the removal pipeline over the module at `path`, deleting the
/// `__repr__` of every class that could have one generated.
///
/// A module with nothing to remove is not an error: `Show` prints the
/// module unchanged and `Write` leaves the file untouched.
pub fn run_remove(path: &Path, mode: Mode) -> Result<Vec<String>, ReprError> {
    let module = PyModule::load(path)?;
    let removals = collect_removals(&module)?;
    debug!(removals = removals.len(), ?mode, "aggregated removals");

    match mode {
        Mode::Show => Ok(apply_removals(&module.lines, &removals)),
        Mode::Diff => {
            let ranges: Vec<(usize, usize)> =
                removals.iter().map(|r| (r.start, r.end)).collect();
            let diff = crate::diff::unified_diff_deletions(
                &module.path.display().to_string(),
                &module.lines,
                &ranges,
            );
            Ok(diff.lines().map(str::to_string).collect())
        }
        Mode::Write => {
            if removals.is_empty() {
                return Ok(Vec::new());
            }
            let result = apply_removals(&module.lines, &removals);
            let mut text = result.join("\n");
            if module.trailing_newline {
                text.push('\n');
            }
            fs::write(path, text).map_err(|e| ReprError::WriteFailure {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Vec::new())
        }
    }
}

/// Locate the `__repr__` span of every class with an eligible constructor.
///
/// Removals come back sorted by position (source order). Classes whose
/// `__repr__` could not have been generated (no constructor, var-positional
/// parameters) keep theirs.
pub fn collect_removals(module: &PyModule) -> Result<Vec<Removal>, ReprError> {
    let mut removals = Vec::new();
    for record in enumerate_classes(module) {
        let model = extract_constructor(&record, module)?;
        let Some(params) = &model.params else {
            continue;
        };
        if !is_eligible(params) {
            continue;
        }
        let Some(def_line) = record.method_def_line(module, "__repr__") else {
            continue;
        };
        let end = module.block_end(def_line);
        debug!(class = %record.name, start = def_line + 1, "removing __repr__");
        removals.push(Removal {
            class_name: record.name.clone(),
            start: def_line,
            end,
        });
    }
    Ok(removals)
}

/// Delete all removal spans from the original lines.
///
/// Applied bottom-up so earlier deletions do not shift later positions.
pub fn apply_removals(original: &[String], removals: &[Removal]) -> Vec<String> {
    let mut result: Vec<String> = original.to_vec();
    let mut ordered: Vec<&Removal> = removals.iter().collect();
    ordered.sort_by_key(|r| std::cmp::Reverse(r.start));
    for removal in ordered {
        let end = removal.end.min(result.len().saturating_sub(1));
        if removal.start <= end {
            result.drain(removal.start..=end);
        }
    }
    result
}

/// List classes with an eligible constructor but no `__repr__`.
pub fn report(path: &Path) -> Result<Vec<ReportEntry>, ReprError> {
    let module = PyModule::load(path)?;
    let mut entries = Vec::new();
    for record in enumerate_classes(&module) {
        let model = extract_constructor(&record, &module)?;
        let Some(params) = &model.params else {
            continue;
        };
        if !is_eligible(params) || record.has_repr(&module) {
            continue;
        }
        entries.push(ReportEntry {
            path: module.path.display().to_string(),
            line: model.source_line,
            class_name: record.name.clone(),
        });
    }
    Ok(entries)
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

    const TWO_CLASSES: &str = "\
class A:
    def __init__(self, x):
        self.x = x

class B:
    def __init__(self, *args):
        self.args = args

class C:
    pass
";

    mod collection {
        use super::*;

        #[test]
        fn only_eligible_classes_yield_changes() {
            let m = module_from(TWO_CLASSES);
            let changes = collect_changes(&m, &Options::default()).expect("collect");
            let names: Vec<&str> = changes.iter().map(|c| c.class_name.as_str()).collect();
            // B has *args, C has no __init__.
            assert_eq!(names, vec!["A"]);
        }

        #[test]
        fn insertion_point_is_after_constructor_body() {
            let m = module_from(TWO_CLASSES);
            let changes = collect_changes(&m, &Options::default()).expect("collect");
            // A's __init__ spans lines 2-3 (1-based), so the block goes
            // before index 3 (0-based), right after `self.x = x`.
            assert_eq!(changes[0].insert_at, 3);
        }

        #[test]
        fn skip_existing_respects_declared_repr() {
            let src = "\
class A:
    def __init__(self, x):
        self.x = x

    def __repr__(self):
        return 'A'
";
            let m = module_from(src);
            let with_skip = Options {
                skip_existing: true,
                ..Options::default()
            };
            assert!(collect_changes(&m, &with_skip).expect("collect").is_empty());
            assert_eq!(
                collect_changes(&m, &Options::default())
                    .expect("collect")
                    .len(),
                1
            );
        }

        #[test]
        fn changes_are_in_source_order() {
            let src = "\
class A:
    def __init__(self, x):
        self.x = x

class B:
    def __init__(self, y):
        self.y = y
";
            let m = module_from(src);
            let changes = collect_changes(&m, &Options::default()).expect("collect");
            assert_eq!(changes.len(), 2);
            assert!(changes[0].insert_at < changes[1].insert_at);
        }
    }

    mod application {
        use super::*;

        #[test]
        fn blocks_land_immediately_after_constructors() {
            let m = module_from(TWO_CLASSES);
            let changes = collect_changes(&m, &Options::default()).expect("collect");
            let result = apply_changes(&m.lines, &changes);
            // The generated block starts with a blank line right after
            // `self.x = x`.
            assert_eq!(result[2], "        self.x = x");
            assert_eq!(result[3], "");
            assert_eq!(result[4], "    def __repr__(self) -> str:");
        }

        #[test]
        fn multiple_insertions_do_not_shift_each_other() {
            let src = "\
class A:
    def __init__(self, x):
        self.x = x

class B:
    def __init__(self, y):
        self.y = y
";
            let m = module_from(src);
            let changes = collect_changes(&m, &Options::default()).expect("collect");
            let result = apply_changes(&m.lines, &changes);
            let repr_count = result
                .iter()
                .filter(|l| l.contains("def __repr__"))
                .count();
            assert_eq!(repr_count, 2);
            // Each block sits right after its own constructor body.
            let a_body = result.iter().position(|l| l == "        self.x = x").unwrap();
            assert_eq!(result[a_body + 2], "    def __repr__(self) -> str:");
            let b_body = result.iter().position(|l| l == "        self.y = y").unwrap();
            assert_eq!(result[b_body + 2], "    def __repr__(self) -> str:");
        }
    }

    mod removal {
        use super::*;

        const WITH_REPRS: &str = "\
class A:
    def __init__(self, x):
        self.x = x

    def __repr__(self):
        return 'A'

class B:
    def __init__(self, *args):
        self.args = args

    def __repr__(self):
        return 'B'
";

        #[test]
        fn only_generatable_classes_lose_their_repr() {
            let m = module_from(WITH_REPRS);
            let removals = collect_removals(&m).expect("collect");
            let names: Vec<&str> = removals.iter().map(|r| r.class_name.as_str()).collect();
            // B has *args, so its __repr__ could not have been generated.
            assert_eq!(names, vec!["A"]);
            assert_eq!((removals[0].start, removals[0].end), (4, 5));
        }

        #[test]
        fn class_without_repr_yields_no_removal() {
            let m = module_from("class A:\n    def __init__(self, x):\n        self.x = x\n");
            assert!(collect_removals(&m).expect("collect").is_empty());
        }

        #[test]
        fn apply_removals_deletes_whole_method_bodies() {
            let src = "\
class A:
    def __init__(self, x):
        self.x = x

    def __repr__(self):
        return 'A'

class B:
    def __init__(self, y):
        self.y = y

    def __repr__(self):
        return 'B'
";
            let m = module_from(src);
            let removals = collect_removals(&m).expect("collect");
            assert_eq!(removals.len(), 2);
            let result = apply_removals(&m.lines, &removals);
            assert!(!result.iter().any(|l| l.contains("def __repr__")));
            assert!(result.iter().any(|l| l == "        self.x = x"));
            assert!(result.iter().any(|l| l == "        self.y = y"));
        }
    }
}
