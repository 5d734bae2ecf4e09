use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

use crate::kind::{
    CandidateKind, ExecutableKind, MemberKind, SymbolCategory, TypeKind, VariableKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    #[error("{kind:?} candidates {expectation} a parameter signature")]
    SignatureMismatch {
        kind: CandidateKind,
        expectation: &'static str,
    },
    #[error("candidate name must not be empty")]
    EmptyName,
}

/// One completion proposal.
///
/// Candidates are immutable once built; the flag setters consume and return `self` so hosts can
/// assemble them in a single expression. Deserialization goes through the same validation as
/// [`Candidate::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CandidateRepr")]
pub struct Candidate {
    kind: CandidateKind,
    name: SmolStr,
    qualified_name: SmolStr,
    signature: Option<Vec<SmolStr>>,
    type_name: Option<SmolStr>,
    deprecated: bool,
    smart_typed: bool,
    inherited: bool,
    reference_weight: Option<u32>,
}

#[derive(Deserialize)]
struct CandidateRepr {
    kind: CandidateKind,
    name: SmolStr,
    qualified_name: SmolStr,
    signature: Option<Vec<SmolStr>>,
    #[serde(default)]
    type_name: Option<SmolStr>,
    #[serde(default)]
    deprecated: bool,
    #[serde(default)]
    smart_typed: bool,
    #[serde(default)]
    inherited: bool,
    #[serde(default)]
    reference_weight: Option<u32>,
}

impl TryFrom<CandidateRepr> for Candidate {
    type Error = CandidateError;

    fn try_from(repr: CandidateRepr) -> Result<Self, Self::Error> {
        let mut candidate = Candidate::new(repr.kind, repr.name, repr.signature)?
            .with_qualified_name(repr.qualified_name)
            .deprecated(repr.deprecated)
            .smart_typed(repr.smart_typed)
            .inherited(repr.inherited);
        candidate.type_name = repr.type_name;
        candidate.reference_weight = repr.reference_weight;
        Ok(candidate)
    }
}

/// Key under which two candidates denote the same underlying symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub category: SymbolCategory,
    pub qualified_name: SmolStr,
    pub signature: Option<Vec<SmolStr>>,
}

impl Candidate {
    /// Build a candidate, validating that `signature` is present exactly for executable kinds.
    pub fn new<S>(
        kind: CandidateKind,
        name: impl Into<SmolStr>,
        signature: Option<Vec<S>>,
    ) -> Result<Self, CandidateError>
    where
        S: Into<SmolStr>,
    {
        let name = name.into();
        let anonymous = matches!(
            kind,
            CandidateKind::Lambda { .. } | CandidateKind::ParametersHint
        );
        if name.is_empty() && !anonymous {
            return Err(CandidateError::EmptyName);
        }
        match (kind.takes_signature(), signature.is_some()) {
            (true, false) => {
                return Err(CandidateError::SignatureMismatch {
                    kind,
                    expectation: "require",
                })
            }
            (false, true) => {
                return Err(CandidateError::SignatureMismatch {
                    kind,
                    expectation: "must not carry",
                })
            }
            _ => {}
        }

        let signature = signature.map(|params| params.into_iter().map(Into::into).collect());
        Ok(Self {
            kind,
            qualified_name: name.clone(),
            name,
            signature,
            type_name: None,
            deprecated: false,
            smart_typed: false,
            inherited: false,
            reference_weight: None,
        })
    }

    fn unchecked(kind: CandidateKind, name: SmolStr, signature: Option<Vec<SmolStr>>) -> Self {
        debug_assert_eq!(kind.takes_signature(), signature.is_some());
        Self {
            kind,
            qualified_name: name.clone(),
            name,
            signature,
            type_name: None,
            deprecated: false,
            smart_typed: false,
            inherited: false,
            reference_weight: None,
        }
    }

    pub fn keyword(keyword: impl Into<SmolStr>) -> Self {
        Self::unchecked(CandidateKind::Keyword, keyword.into(), None)
    }

    pub fn package(qualified_name: &str) -> Self {
        let simple = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
        Self::unchecked(CandidateKind::Package, simple.into(), None)
            .with_qualified_name(qualified_name)
    }

    pub fn ty(kind: TypeKind, qualified_name: &str) -> Self {
        let simple = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
        Self::unchecked(CandidateKind::Type(kind), simple.into(), None)
            .with_qualified_name(qualified_name)
    }

    pub fn variable(kind: VariableKind, name: impl Into<SmolStr>) -> Self {
        Self::unchecked(CandidateKind::Variable(kind), name.into(), None)
    }

    pub fn method<I, S>(name: impl Into<SmolStr>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self::unchecked(
            CandidateKind::Executable(ExecutableKind::Method),
            name.into(),
            Some(params.into_iter().map(Into::into).collect()),
        )
    }

    pub fn constructor<I, S>(name: impl Into<SmolStr>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self::unchecked(
            CandidateKind::Executable(ExecutableKind::Constructor),
            name.into(),
            Some(params.into_iter().map(Into::into).collect()),
        )
    }

    pub fn static_field(name: impl Into<SmolStr>) -> Self {
        Self::unchecked(CandidateKind::StaticMember(MemberKind::Field), name.into(), None)
    }

    pub fn static_method<I, S>(name: impl Into<SmolStr>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self::unchecked(
            CandidateKind::StaticMember(MemberKind::Method),
            name.into(),
            Some(params.into_iter().map(Into::into).collect()),
        )
    }

    pub fn with_qualified_name(mut self, qualified_name: impl Into<SmolStr>) -> Self {
        self.qualified_name = qualified_name.into();
        self
    }

    /// Declared type (variables) or return type (methods), used for display only.
    pub fn with_type_name(mut self, type_name: impl Into<SmolStr>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn smart_typed(mut self, smart_typed: bool) -> Self {
        self.smart_typed = smart_typed;
        self
    }

    pub fn inherited(mut self, inherited: bool) -> Self {
        self.inherited = inherited;
        self
    }

    pub fn with_reference_weight(mut self, weight: u32) -> Self {
        self.reference_weight = Some(weight);
        self
    }

    pub fn kind(&self) -> &CandidateKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn signature(&self) -> Option<&[SmolStr]> {
        self.signature.as_deref()
    }

    /// Number of parameters; `0` for candidates without a signature.
    pub fn arity(&self) -> usize {
        self.signature.as_ref().map_or(0, Vec::len)
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Smart-typed either explicitly or because the kind is only proposed for the expected type.
    pub fn is_smart_typed(&self) -> bool {
        self.smart_typed || self.kind.always_smart()
    }

    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    pub fn reference_weight(&self) -> Option<u32> {
        self.reference_weight
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            category: self.kind.category(),
            qualified_name: self.qualified_name.clone(),
            signature: self.signature.clone(),
        }
    }
}
