//! Signature Extractor: turns a class's `__init__` into a [`ConstructorModel`].
//!
//! The parameter list is parsed straight from the source text with a winnow
//! grammar. Declaration order is preserved exactly; the synthesizer renders
//! parameters in this order and must never see them reordered.
//!
//! ## Grammar
//!
//! ```text
//! <params>  := [<param> ("," <param>)* [","]]
//! <param>   := "**" ident
//!            | "*" [ident]
//!            | "/"
//!            | ident [":" <expr>] ["=" <expr>]
//! <expr>    := balanced token run (brackets and strings respected,
//!              "lambda ... :" one atom), terminated by "," or a
//!              standalone "=" at depth zero
//! ```
//!
//! Parameter kinds follow Python semantics: names before a `/` marker are
//! positional-only, names after a `*` (bare or `*args`) are keyword-only.

use tracing::trace;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, fail, opt, preceded, repeat};
use winnow::prelude::*;
use winnow::token::take_while;
use winnow::ModalResult;

use crate::classes::ClassRecord;
use crate::error::ReprError;
use crate::module::PyModule;

/// The kind of a constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Declared before a `/` marker.
    PositionalOnly,
    /// Ordinary parameter.
    PositionalOrKeyword,
    /// Declared after a `*` marker or `*args`.
    KeywordOnly,
    /// `*args` — collects unnamed trailing arguments.
    VarPositional,
    /// `**kwargs` — collects undeclared keyword arguments.
    VarKeyword,
}

/// One constructor parameter, immutable once extracted.
///
/// `None` is the "no default" / "no annotation" sentinel; the captured
/// expressions are verbatim source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<String>,
    pub annotation: Option<String>,
}

/// The normalized model of a class constructor.
///
/// The absent form (`params = None`, `source_line = -1`, `source_text =
/// None`) represents "this class has no explicit `__init__`" and is a valid
/// state, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorModel {
    pub class_name: String,
    /// Parameters in declaration order, `self` first. `None` when the class
    /// has no explicit constructor.
    pub params: Option<Vec<Parameter>>,
    /// 1-based line of the `def __init__`, or -1 when absent.
    pub source_line: i64,
    /// Verbatim source from the `def` line through the end of the body.
    pub source_text: Option<String>,
}

impl ConstructorModel {
    /// The explicit "no constructor" form.
    pub fn absent(class_name: impl Into<String>) -> Self {
        ConstructorModel {
            class_name: class_name.into(),
            params: None,
            source_line: -1,
            source_text: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.params.is_none()
    }
}

/// Eligibility Filter: can a `__repr__` be generated from these parameters?
///
/// Ineligible iff any parameter is var-positional: its elements have no
/// per-element name, so they cannot be rendered as `name=value` pairs.
/// Everything else is eligible, including a bare `(self)`.
pub fn is_eligible(params: &[Parameter]) -> bool {
    !params.iter().any(|p| p.kind == ParamKind::VarPositional)
}

/// Extract the constructor model for a class.
///
/// Returns the absent form when the class declares no `__init__` of its
/// own. A parameter list that fails to parse is reported as a syntax error
/// at the `def` line.
pub fn extract_constructor(
    record: &ClassRecord,
    module: &PyModule,
) -> Result<ConstructorModel, ReprError> {
    let Some(def_line) = record.method_def_line(module, "__init__") else {
        return Ok(ConstructorModel::absent(record.name.clone()));
    };
    let body_end = module.block_end(def_line);
    let source_text = module.lines[def_line..=body_end].join("\n");

    let sig = signature_text(module, def_line)?;
    let raw = param_list
        .parse(sig.trim())
        .map_err(|e| ReprError::ModuleSyntaxInvalid {
            path: module.path.clone(),
            line: def_line as u32 + 1,
            message: format!("invalid __init__ parameter list: {e}"),
        })?;
    let params = lower(raw);
    trace!(
        class = %record.name,
        line = def_line + 1,
        params = params.len(),
        "extracted constructor"
    );

    Ok(ConstructorModel {
        class_name: record.name.clone(),
        params: Some(params),
        source_line: def_line as i64 + 1,
        source_text: Some(source_text),
    })
}

// ============================================================================
// Signature text extraction
// ============================================================================

/// Collect the text between the `def __init__` parentheses, which may span
/// multiple lines. Comments are stripped; strings are kept verbatim.
fn signature_text(module: &PyModule, def_line: usize) -> Result<String, ReprError> {
    let mut out = String::new();
    let mut depth = 0i32;
    let mut started = false;
    let mut in_string: Option<char> = None;

    for line in module.lines.iter().skip(def_line) {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match in_string {
                Some(q) => {
                    out.push(c);
                    if c == '\\' {
                        if let Some(&next) = chars.get(i + 1) {
                            out.push(next);
                            i += 2;
                            continue;
                        }
                    } else if c == q {
                        in_string = None;
                    }
                }
                None => match c {
                    '#' => break,
                    '\'' | '"' => {
                        in_string = Some(c);
                        if started {
                            out.push(c);
                        }
                    }
                    '(' | '[' | '{' => {
                        depth += 1;
                        if c == '(' && depth == 1 {
                            started = true;
                        } else if started {
                            out.push(c);
                        }
                    }
                    ')' | ']' | '}' => {
                        depth -= 1;
                        if c == ')' && depth == 0 && started {
                            return Ok(out);
                        }
                        if started {
                            out.push(c);
                        }
                    }
                    _ => {
                        if started {
                            out.push(c);
                        }
                    }
                },
            }
            i += 1;
        }
        if started {
            out.push('\n');
        }
    }

    // Load-time validation guarantees balance; reaching here means the def
    // header itself never opened a parameter list.
    Err(ReprError::ModuleSyntaxInvalid {
        path: module.path.clone(),
        line: def_line as u32 + 1,
        message: "unterminated __init__ parameter list".to_string(),
    })
}

// ============================================================================
// Parameter grammar (winnow)
// ============================================================================

/// Raw parse items before kind resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawParam {
    /// `/` marker: everything before it is positional-only.
    Slash,
    /// `*` marker (bare) or `*args`.
    Star(Option<String>),
    /// `**kwargs`.
    DoubleStar(String),
    Named {
        name: String,
        annotation: Option<String>,
        default: Option<String>,
    },
}

fn param_list(input: &mut &str) -> ModalResult<Vec<RawParam>> {
    let _ = multispace0.parse_next(input)?;
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let first = param(input)?;
    let rest: Vec<RawParam> =
        repeat(0.., preceded((multispace0, ',', multispace0), param)).parse_next(input)?;
    let _ = opt((multispace0, ',')).parse_next(input)?;
    let _ = multispace0.parse_next(input)?;

    let mut all = vec![first];
    all.extend(rest);
    Ok(all)
}

fn param(input: &mut &str) -> ModalResult<RawParam> {
    alt((
        preceded("**", ident).map(RawParam::DoubleStar),
        preceded('*', opt(ident)).map(RawParam::Star),
        '/'.map(|_| RawParam::Slash),
        named_param,
    ))
    .parse_next(input)
}

fn named_param(input: &mut &str) -> ModalResult<RawParam> {
    let name = ident(input)?;
    let annotation = opt(preceded(
        (multispace0, ':', multispace0),
        |i: &mut &str| balanced_expr(i, true),
    ))
    .parse_next(input)?;
    let default = opt(preceded(
        (multispace0, '=', multispace0),
        |i: &mut &str| balanced_expr(i, false),
    ))
    .parse_next(input)?;
    Ok(RawParam::Named {
        name,
        annotation,
        default,
    })
}

fn ident(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_')
        .verify(|s: &str| !s.starts_with(|c: char| c.is_ascii_digit()))
        .map(str::to_string)
        .parse_next(input)
}

/// Consume a balanced expression: stops at a `,` at bracket depth zero, or
/// (when `stop_at_eq` is set, for annotations) at a standalone `=` that is
/// not part of a comparison operator.
///
/// A `lambda` is one atom: its parameter commas do not terminate the
/// expression until the lambda's own `:` has been passed.
fn balanced_expr(input: &mut &str, stop_at_eq: bool) -> ModalResult<String> {
    let s = *input;
    let chars: Vec<char> = s.chars().collect();
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    // Bracket depths of lambda headers whose `:` is still pending.
    let mut lambdas: Vec<i32> = Vec::new();
    let mut end = s.len();
    let mut i = 0;
    let mut byte = 0usize;

    let is_word = |c: &char| c.is_alphanumeric() || *c == '_';

    while i < chars.len() {
        let c = chars[i];
        match in_string {
            Some(q) => {
                if c == '\\' {
                    byte += c.len_utf8() + chars.get(i + 1).map_or(0, |n| n.len_utf8());
                    i += 2;
                    continue;
                }
                if c == q {
                    in_string = None;
                }
            }
            None => match c {
                '\'' | '"' => in_string = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                'l' if chars[i..].starts_with(&['l', 'a', 'm', 'b', 'd', 'a'])
                    && (i == 0 || !chars.get(i - 1).is_some_and(is_word))
                    && !chars.get(i + 6).is_some_and(is_word) =>
                {
                    lambdas.push(depth);
                    byte += "lambda".len();
                    i += 6;
                    continue;
                }
                ':' if lambdas.last() == Some(&depth) => {
                    lambdas.pop();
                }
                ',' if depth == 0 && lambdas.is_empty() => {
                    end = byte;
                    break;
                }
                '=' if stop_at_eq && depth == 0 && lambdas.is_empty() => {
                    let next_is_eq = chars.get(i + 1) == Some(&'=');
                    let prev_is_cmp =
                        i > 0 && matches!(chars.get(i - 1), Some('=' | '!' | '<' | '>'));
                    if !next_is_eq && !prev_is_cmp {
                        end = byte;
                        break;
                    }
                }
                _ => {}
            },
        }
        byte += c.len_utf8();
        i += 1;
    }

    let text = s[..end].trim().to_string();
    if text.is_empty() {
        return fail.parse_next(input);
    }
    *input = &s[end..];
    Ok(text)
}

/// Resolve parameter kinds from marker positions.
fn lower(raw: Vec<RawParam>) -> Vec<Parameter> {
    let mut params: Vec<Parameter> = Vec::new();
    let mut keyword_only = false;

    for item in raw {
        match item {
            RawParam::Slash => {
                for p in params.iter_mut() {
                    if p.kind == ParamKind::PositionalOrKeyword {
                        p.kind = ParamKind::PositionalOnly;
                    }
                }
            }
            RawParam::Star(None) => keyword_only = true,
            RawParam::Star(Some(name)) => {
                keyword_only = true;
                params.push(Parameter {
                    name,
                    kind: ParamKind::VarPositional,
                    default: None,
                    annotation: None,
                });
            }
            RawParam::DoubleStar(name) => params.push(Parameter {
                name,
                kind: ParamKind::VarKeyword,
                default: None,
                annotation: None,
            }),
            RawParam::Named {
                name,
                annotation,
                default,
            } => params.push(Parameter {
                name,
                kind: if keyword_only {
                    ParamKind::KeywordOnly
                } else {
                    ParamKind::PositionalOrKeyword
                },
                default,
                annotation,
            }),
        }
    }
    params
}

// ============================================================================
// Tests
// ============================================================================
