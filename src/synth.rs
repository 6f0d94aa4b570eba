//! Representation Synthesizer: renders the `__repr__` method source lines.
//!
//! Synthesis is a pure function of `(model, kwarg_splat)`: identical inputs
//! always yield byte-identical lines, which keeps diff previews stable
//! across runs. The produced block is meant for direct textual insertion
//! immediately after the constructor body.

use crate::signature::{ConstructorModel, ParamKind};

/// Produce the source lines of a `__repr__` method for an eligible model.
///
/// Returns an empty vector for the absent form. Otherwise the block is, in
/// order: a leading blank line, the method declaration, a one-line
/// docstring naming the class, the opening return line (qualified class
/// path plus `(`), one line per non-`self` parameter in declaration order,
/// the closing `')')` line, and a trailing blank line.
///
/// A var-keyword parameter renders as the `**` marker paired with the
/// literal `kwarg_splat` text: capture contents are unknowable at
/// generation time, so a textual stand-in is used instead of a live value.
pub fn repr_lines(model: &ConstructorModel, kwarg_splat: &str) -> Vec<String> {
    let Some(params) = &model.params else {
        return Vec::new();
    };

    let mut lines = vec![
        String::new(),
        "    def __repr__(self) -> str:".to_string(),
        format!(
            "        \"\"\"Create a string representation for {}.\"\"\"",
            model.class_name
        ),
        "        return (f'{self.__class__.__module__}.{self.__class__.__name__}('".to_string(),
    ];
    lines.extend(
        params
            .iter()
            .filter(|p| p.name != "self")
            .map(|p| match p.kind {
                ParamKind::VarKeyword => format!("            f'**{kwarg_splat},'"),
                _ => format!("            f'{name}={{self.{name}!r}}, '", name = p.name),
            }),
    );
    lines.push("        ')')".to_string());
    lines.push(String::new());
    lines
}

// ============================================================================
// Tests
// ============================================================================
