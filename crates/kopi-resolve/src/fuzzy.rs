use std::fmt;

use smol_str::SmolStr;
use strsim::levenshtein;

use kopi_scheduler::{check_cancelled, CancellationToken};

use crate::types::parse_param_list;
use crate::{ResolutionError, TypeEnv, TypeRef};

/// A method or constructor as declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutableSig {
    pub name: SmolStr,
    pub params: Vec<TypeRef>,
    /// The last parameter is a varargs array.
    pub varargs: bool,
}

impl ExecutableSig {
    pub fn new(name: impl Into<SmolStr>, params: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            params,
            varargs: false,
        }
    }

    /// Parse `name(T1, T2...)`. A trailing `...` marks the executable varargs.
    pub fn parse(text: &str) -> Result<Self, ResolutionError> {
        Self::parse_in(text, &[])
    }

    pub fn parse_in(text: &str, type_vars: &[&str]) -> Result<Self, ResolutionError> {
        let (name, params) = split_call_syntax(text)?;
        let (params, varargs) = parse_param_list(params, type_vars)?;
        Ok(Self {
            name: name.into(),
            params,
            varargs,
        })
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for ExecutableSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            match param {
                TypeRef::Array(component) if self.varargs && idx + 1 == self.params.len() => {
                    write!(f, "{component}...")?
                }
                param => write!(f, "{param}")?,
            }
        }
        f.write_str(")")
    }
}

/// A call site whose exact resolution failed: the invoked name and the attributed argument
/// types (`TypeRef::Error` for arguments that could not be attributed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: SmolStr,
    pub args: Vec<TypeRef>,
}

impl Invocation {
    pub fn new(name: impl Into<SmolStr>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parse `name(T1, T2)`.
    pub fn parse(text: &str) -> Result<Self, ResolutionError> {
        let (name, args) = split_call_syntax(text)?;
        let (args, varargs) = parse_param_list(args, &[])?;
        if varargs {
            return Err(ResolutionError::Malformed(format!(
                "call arguments cannot be varargs in `{text}`"
            )));
        }
        Ok(Self::new(name, args))
    }
}

fn split_call_syntax(text: &str) -> Result<(&str, &str), ResolutionError> {
    let malformed =
        || ResolutionError::Malformed(format!("expected `name(params)`, got `{text}`"));
    let text = text.trim();
    let open = text.find('(').ok_or_else(malformed)?;
    let inner = text[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
    let name = text[..open].trim();
    if name.is_empty() {
        return Err(malformed());
    }
    Ok((name, inner))
}

/// An executable accepted by fuzzy resolution, with the type the mismatching argument would
/// need to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub executable: ExecutableSig,
    /// The formal parameter type at the mismatch index.
    pub substitute: TypeRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyResolution {
    /// Argument position where every accepted executable disagrees with the call.
    pub mismatch_index: Option<usize>,
    /// Accepted executables, one per distinct substitute type, in declaration order.
    pub matches: Vec<FuzzyMatch>,
    /// Some single-mismatch executables were dropped because they disagreed at a different
    /// position than the first one found.
    pub ambiguous: bool,
}

impl FuzzyResolution {
    pub fn is_resolved(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Types that would make the call resolve if the mismatching argument had them.
    pub fn substitutes(&self) -> impl Iterator<Item = &TypeRef> {
        self.matches.iter().map(|m| &m.substitute)
    }
}

/// Single-mismatch method resolution, used once exact resolution of a call has failed.
///
/// A call like `f(1, "x")` against `f(int, int)` is accepted with the second argument flagged,
/// so completion can still offer candidates of type `int` at that position.
pub struct FuzzyMatcher<'env> {
    env: &'env dyn TypeEnv,
}

impl<'env> FuzzyMatcher<'env> {
    pub fn new(env: &'env dyn TypeEnv) -> Self {
        Self { env }
    }

    pub fn resolve(&self, call: &Invocation, executables: &[ExecutableSig]) -> FuzzyResolution {
        // A fresh token never fires.
        self.resolve_cancellable(call, executables, &CancellationToken::new())
            .unwrap_or_default()
    }

    /// Like [`FuzzyMatcher::resolve`], checking `token` before every executable.
    pub fn resolve_cancellable(
        &self,
        call: &Invocation,
        executables: &[ExecutableSig],
        token: &CancellationToken,
    ) -> Result<FuzzyResolution, ResolutionError> {
        let mut resolution = FuzzyResolution::default();

        for executable in executables {
            check_cancelled(token)?;
            if executable.name != call.name
                || executable.varargs
                || executable.arity() != call.args.len()
            {
                continue;
            }

            let Some(index) = self.single_mismatch(call, executable) else {
                continue;
            };

            match resolution.mismatch_index {
                None => resolution.mismatch_index = Some(index),
                Some(pinned) if pinned != index => {
                    tracing::debug!(
                        target: "kopi.resolve",
                        call = %call.name,
                        pinned,
                        index,
                        executable = %executable,
                        "dropping fuzzy match with a different mismatch position"
                    );
                    resolution.ambiguous = true;
                    continue;
                }
                Some(_) => {}
            }

            let substitute = &executable.params[index];
            if resolution.substitutes().any(|existing| existing == substitute) {
                continue;
            }
            resolution.matches.push(FuzzyMatch {
                executable: executable.clone(),
                substitute: substitute.clone(),
            });
        }

        Ok(resolution)
    }

    /// Index of the only argument not assignable to its formal, if exactly one is.
    fn single_mismatch(&self, call: &Invocation, executable: &ExecutableSig) -> Option<usize> {
        let mut mismatch = None;
        for (index, (actual, formal)) in call.args.iter().zip(&executable.params).enumerate() {
            if actual.is_error() || !self.env.is_assignable(actual, formal) {
                if mismatch.is_some() {
                    return None;
                }
                mismatch = Some(index);
            }
        }
        mismatch
    }

    /// Distinct executable names within `max_distance` edits of `name`, nearest first.
    ///
    /// Ties keep declaration order. `name` itself is excluded.
    pub fn closest_names(
        &self,
        name: &str,
        executables: &[ExecutableSig],
        max_distance: usize,
    ) -> Vec<SmolStr> {
        let mut scored: Vec<(usize, &SmolStr)> = Vec::new();
        for executable in executables {
            if executable.name == name || scored.iter().any(|(_, n)| **n == executable.name) {
                continue;
            }
            if name.chars().count().abs_diff(executable.name.chars().count()) > max_distance {
                continue;
            }
            let distance = levenshtein(name, &executable.name);
            if distance <= max_distance {
                scored.push((distance, &executable.name));
            }
        }
        scored.sort_by_key(|(distance, _)| *distance);
        scored.into_iter().map(|(_, name)| name.clone()).collect()
    }
}
