//! Total ordering of completion candidates.
//!
//! Every candidate maps to a [`SortKey`] tuple; the ranked list is a stable sort by that key.
//! Lower keys are presented first.

use std::cmp::Ordering;
use std::fmt::Write as _;

use kopi_core::{Candidate, CandidateKind, ExecutableKind, MemberKind};

/// Subtracted from the bucket of candidates whose type fits the expected type at the caret.
pub const SMART_TYPE_BONUS: i32 = 1000;

/// Added to deprecated candidates, in its own key component so it never crosses buckets.
pub const DEPRECATED_PENALTY: i32 = 10;

/// Base priority of a candidate kind before the smart-type bonus.
pub fn base_priority(kind: &CandidateKind) -> i32 {
    match kind {
        CandidateKind::Lambda { expression } => 50 - i32::from(*expression),
        CandidateKind::ParametersHint | CandidateKind::Attribute => 100,
        CandidateKind::Variable(kind) if kind.is_member() => 300,
        CandidateKind::Variable(_) => 200,
        CandidateKind::Executable(ExecutableKind::Method) => 500,
        CandidateKind::Executable(ExecutableKind::Constructor) => 650,
        CandidateKind::Keyword => 670,
        CandidateKind::TypeParameter => 700,
        // `chain_shape` is already saturated at 99.
        CandidateKind::ChainedMember(_) => 700 + kind.chain_shape() as i32,
        CandidateKind::StaticMember(MemberKind::Field) => 720,
        CandidateKind::StaticMember(MemberKind::Method) => 750,
        CandidateKind::Type(_) => 800,
        CandidateKind::Package => 900,
        CandidateKind::Module => 950,
    }
}

/// Ordering key of one candidate.
///
/// Field order is significant: the derived `Ord` compares bucket, then deprecation penalty, then
/// name with reference weight, then arity, then the parameter text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    bucket: i32,
    penalty: i32,
    secondary: String,
    arity: u32,
    params: String,
}

impl SortKey {
    pub fn of(candidate: &Candidate) -> Self {
        let mut bucket = base_priority(candidate.kind());
        if candidate.is_smart_typed() {
            bucket -= SMART_TYPE_BONUS;
        }
        let penalty = if candidate.is_deprecated() {
            DEPRECATED_PENALTY
        } else {
            0
        };

        let weight = candidate.reference_weight().unwrap_or(u32::MAX);
        let mut secondary = String::with_capacity(candidate.name().len() + 11);
        let _ = write!(secondary, "{}#{weight:010}", candidate.name());

        let signature = candidate.signature().unwrap_or_default();
        let mut params = String::from("(");
        for (idx, param) in signature.iter().enumerate() {
            if idx > 0 {
                params.push(',');
            }
            params.push_str(param);
        }
        params.push(')');

        Self {
            bucket,
            penalty,
            secondary,
            arity: u32::try_from(signature.len()).unwrap_or(u32::MAX),
            params,
        }
    }

    pub fn bucket(&self) -> i32 {
        self.bucket
    }

    pub fn penalty(&self) -> i32 {
        self.penalty
    }

    pub fn arity(&self) -> u32 {
        self.arity
    }

    /// `bucket + penalty`, the single-integer priority older hosts expect.
    pub fn sort_priority(&self) -> i32 {
        self.bucket + self.penalty
    }

    pub fn secondary_text(&self) -> &str {
        &self.secondary
    }

    pub fn param_text(&self) -> &str {
        &self.params
    }

    /// String form for LSP `sortText`.
    ///
    /// Lexicographic order of the result agrees with the key order: the bucket is shifted into
    /// the non-negative range and zero-padded, and the remaining components are either fixed
    /// width or already compared as text.
    pub fn sort_text(&self) -> String {
        format!(
            "{:04}{:02}{}#{:010}#{}",
            self.bucket + SMART_TYPE_BONUS,
            self.penalty,
            self.secondary,
            self.arity,
            self.params
        )
    }
}

/// Comparator over candidates, consistent with [`SortKey`].
pub fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    SortKey::of(a).cmp(&SortKey::of(b))
}

/// Stable sort of `candidates` by [`SortKey`], computing each key once.
pub fn sort_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut keyed: Vec<(SortKey, Candidate)> = candidates
        .into_iter()
        .map(|candidate| (SortKey::of(&candidate), candidate))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    keyed.into_iter().map(|(_, candidate)| candidate).collect()
}
