//! Text inserted when a candidate is accepted.

use kopi_config::RankingConfig;
use kopi_core::{Candidate, CandidateKind, MemberKind};

/// How a candidate turns into editor text, selected by candidate kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStrategy {
    /// The name as-is (variables, types, keywords, packages, chains).
    Plain,
    /// `name(...)`, with parameter placeholders when `guess_arguments` is set.
    Call { guess_arguments: bool },
    /// `name = ` inside an annotation.
    Attribute,
    /// `(a, b) -> ` followed by a body or an expression.
    Lambda { expression: bool },
    /// Placeholders for the arguments of an enclosing call.
    Arguments,
}

/// Result of rendering an [`InsertStrategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertText {
    pub text: String,
    /// `text` uses LSP snippet syntax (`${1:name}`, `$0`).
    pub is_snippet: bool,
}

impl InsertText {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_snippet: false,
        }
    }

    fn snippet(text: String) -> Self {
        Self {
            text,
            is_snippet: true,
        }
    }
}

impl InsertStrategy {
    pub fn for_candidate(candidate: &Candidate, config: &RankingConfig) -> Self {
        match candidate.kind() {
            CandidateKind::Executable(_) | CandidateKind::StaticMember(MemberKind::Method) => {
                InsertStrategy::Call {
                    guess_arguments: config.guess_method_arguments,
                }
            }
            CandidateKind::Attribute => InsertStrategy::Attribute,
            CandidateKind::Lambda { expression } => InsertStrategy::Lambda {
                expression: *expression,
            },
            CandidateKind::ParametersHint => InsertStrategy::Arguments,
            CandidateKind::Keyword
            | CandidateKind::Module
            | CandidateKind::Package
            | CandidateKind::Type(_)
            | CandidateKind::TypeParameter
            | CandidateKind::Variable(_)
            | CandidateKind::StaticMember(MemberKind::Field)
            | CandidateKind::ChainedMember(_) => InsertStrategy::Plain,
        }
    }

    pub fn render(self, candidate: &Candidate) -> InsertText {
        let params = candidate.signature().unwrap_or_default();
        match self {
            InsertStrategy::Plain => InsertText::plain(candidate.name()),
            InsertStrategy::Attribute => InsertText::plain(format!("{} = ", candidate.name())),
            InsertStrategy::Call { .. } if params.is_empty() => {
                InsertText::plain(format!("{}()", candidate.name()))
            }
            InsertStrategy::Call {
                guess_arguments: false,
            } => InsertText::snippet(format!("{}($0)", candidate.name())),
            InsertStrategy::Call {
                guess_arguments: true,
            } => InsertText::snippet(format!("{}({})$0", candidate.name(), placeholders(params))),
            InsertStrategy::Arguments => InsertText::snippet(placeholders(params)),
            InsertStrategy::Lambda { expression } => {
                let names = parameter_names(params);
                let head = match names.as_slice() {
                    [single] => single.clone(),
                    names => format!("({})", names.join(", ")),
                };
                if expression {
                    InsertText::snippet(format!("{head} -> $0"))
                } else {
                    InsertText::snippet(format!("{head} -> {{\n\t$0\n}}"))
                }
            }
        }
    }
}

fn placeholders<S: AsRef<str>>(params: &[S]) -> String {
    parameter_names(params)
        .iter()
        .enumerate()
        .map(|(idx, name)| format!("${{{}:{name}}}", idx + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Argument names guessed from parameter types: `java.util.List<String>` becomes `list`,
/// repeated names get a numeric suffix.
fn parameter_names<S: AsRef<str>>(params: &[S]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(params.len());
    for param in params {
        let base = name_for_type(param.as_ref());
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            suffix += 1;
            name = format!("{base}{suffix}");
        }
        names.push(name);
    }
    names
}

fn name_for_type(ty: &str) -> String {
    let erased = ty.split('<').next().unwrap_or(ty);
    let plural = erased.ends_with("[]") || erased.ends_with("...");
    let simple = erased
        .trim_end_matches("...")
        .trim_end_matches("[]")
        .rsplit('.')
        .next()
        .unwrap_or(erased)
        .trim();

    let mut chars = simple.chars();
    let mut name = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => String::from("arg"),
    };
    if simple.len() == 1 || is_primitive(simple) {
        // `int` or `T` read badly as variable names.
        name = String::from(match simple {
            "boolean" => "flag",
            "char" => "ch",
            "byte" | "short" | "int" | "long" => "i",
            "float" | "double" => "d",
            _ => "arg",
        });
    }
    if plural {
        name.push('s');
    }
    name
}

fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "boolean" | "char" | "byte" | "short" | "int" | "long" | "float" | "double"
    )
}
