use serde::{Deserialize, Serialize};

/// Flavour of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

/// Flavour of a variable-like symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Local,
    Parameter,
    ExceptionParameter,
    ResourceVariable,
    Field,
    EnumConstant,
    /// Record components are exposed by the symbol table as first-class members.
    RecordComponent,
}

impl VariableKind {
    /// Members declared on a type (as opposed to variables scoped to a method body).
    pub fn is_member(self) -> bool {
        matches!(
            self,
            VariableKind::Field | VariableKind::EnumConstant | VariableKind::RecordComponent
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutableKind {
    Method,
    Constructor,
}

/// Kind of a statically imported (or importable) member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Method,
}

/// One link of a chained member proposal such as `list.size()` or `this.name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Locals, parameters, resources and exception parameters.
    Local,
    /// Fields and enum constants.
    Field,
    /// Anything else (typically a method invocation).
    Other,
}

impl LinkKind {
    fn weight(self) -> u32 {
        match self {
            LinkKind::Local => 1,
            LinkKind::Field => 2,
            LinkKind::Other => 3,
        }
    }
}

/// Closed set of completion candidate kinds.
///
/// Per-kind behaviour (priority bucket, insertion strategy) is selected by matching on this enum
/// rather than through a hierarchy of item types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CandidateKind {
    Keyword,
    Module,
    Package,
    Type(TypeKind),
    TypeParameter,
    Variable(VariableKind),
    Executable(ExecutableKind),
    StaticMember(MemberKind),
    ChainedMember(Vec<LinkKind>),
    /// Annotation attribute (`@Retention(value = ...)`).
    Attribute,
    Lambda { expression: bool },
    /// Parameter list hint for an enclosing invocation.
    ParametersHint,
}

/// Coarse symbol category used for identity.
///
/// A field proposed once as a plain variable and once as a static member denotes the same
/// underlying symbol, so both map to [`SymbolCategory::Variable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolCategory {
    Keyword,
    Module,
    Package,
    Type,
    TypeParameter,
    Variable,
    Executable,
    Chain,
    Attribute,
    Lambda,
    Hint,
}

impl CandidateKind {
    /// Whether candidates of this kind carry a parameter signature.
    pub fn takes_signature(&self) -> bool {
        matches!(
            self,
            CandidateKind::Executable(_)
                | CandidateKind::StaticMember(MemberKind::Method)
                | CandidateKind::Attribute
                | CandidateKind::Lambda { .. }
                | CandidateKind::ParametersHint
        )
    }

    /// Kinds that are only ever proposed because they fit the expected type.
    pub fn always_smart(&self) -> bool {
        matches!(
            self,
            CandidateKind::ChainedMember(_)
                | CandidateKind::Lambda { .. }
                | CandidateKind::ParametersHint
        )
    }

    pub fn category(&self) -> SymbolCategory {
        match self {
            CandidateKind::Keyword => SymbolCategory::Keyword,
            CandidateKind::Module => SymbolCategory::Module,
            CandidateKind::Package => SymbolCategory::Package,
            CandidateKind::Type(_) => SymbolCategory::Type,
            CandidateKind::TypeParameter => SymbolCategory::TypeParameter,
            CandidateKind::Variable(_) | CandidateKind::StaticMember(MemberKind::Field) => {
                SymbolCategory::Variable
            }
            CandidateKind::Executable(_) | CandidateKind::StaticMember(MemberKind::Method) => {
                SymbolCategory::Executable
            }
            CandidateKind::ChainedMember(_) => SymbolCategory::Chain,
            CandidateKind::Attribute => SymbolCategory::Attribute,
            CandidateKind::Lambda { .. } => SymbolCategory::Lambda,
            CandidateKind::ParametersHint => SymbolCategory::Hint,
        }
    }

    /// Base-3 encoding of a member chain (locals < fields < other), saturated at 99.
    ///
    /// Returns `0` for non-chain kinds.
    pub fn chain_shape(&self) -> u32 {
        let CandidateKind::ChainedMember(links) = self else {
            return 0;
        };
        links
            .iter()
            .fold(0_u32, |acc, link| {
                acc.saturating_mul(3).saturating_add(link.weight())
            })
            .min(99)
    }
}
