use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kopi_completion::{Candidate, CandidateKind, CandidateSource, FnSource, IterSource, Sources};
use kopi_core::{ExecutableKind, LinkKind, MemberKind, TypeKind, VariableKind};
use kopi_scheduler::CancellationToken;
use proptest::prelude::*;

pub fn names(ranked: &[Candidate]) -> Vec<&str> {
    ranked.iter().map(Candidate::name).collect()
}

pub fn local(name: &str) -> Candidate {
    Candidate::variable(VariableKind::Local, name)
}

pub fn iter_source(name: &str, candidates: Vec<Candidate>) -> Box<dyn CandidateSource> {
    Box::new(IterSource::new(name, candidates))
}

/// A source that counts how often it is pulled and yields nothing.
pub fn counting_source(calls: &Arc<AtomicUsize>) -> Box<dyn CandidateSource> {
    let calls = Arc::clone(calls);
    Box::new(FnSource::new("counting", move |_: &CancellationToken| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }))
}

pub fn sources<const N: usize>(sources: [Box<dyn CandidateSource>; N]) -> Sources {
    sources.into_iter().collect()
}

fn simple_kinds() -> Vec<CandidateKind> {
    vec![
        CandidateKind::Keyword,
        CandidateKind::Module,
        CandidateKind::Package,
        CandidateKind::Type(TypeKind::Class),
        CandidateKind::Type(TypeKind::Interface),
        CandidateKind::TypeParameter,
        CandidateKind::Variable(VariableKind::Local),
        CandidateKind::Variable(VariableKind::Field),
        CandidateKind::Executable(ExecutableKind::Method),
        CandidateKind::Executable(ExecutableKind::Constructor),
        CandidateKind::StaticMember(MemberKind::Field),
        CandidateKind::StaticMember(MemberKind::Method),
        CandidateKind::Attribute,
        CandidateKind::ParametersHint,
    ]
}

fn arb_kind() -> impl Strategy<Value = CandidateKind> {
    let link = prop_oneof![
        Just(LinkKind::Local),
        Just(LinkKind::Field),
        Just(LinkKind::Other)
    ];
    prop_oneof![
        8 => prop::sample::select(simple_kinds()),
        1 => prop::collection::vec(link, 1..4).prop_map(CandidateKind::ChainedMember),
        1 => any::<bool>().prop_map(|expression| CandidateKind::Lambda { expression }),
    ]
}

/// Candidates drawn from a small alphabet so that ties on every key component are common.
///
/// Some signatures are long enough to cross the two- and three-digit arity boundaries.
pub fn arb_candidate() -> impl Strategy<Value = Candidate> {
    let param = prop::sample::select(vec!["int", "String", "Object"]);
    (
        arb_kind(),
        "[a-c]{1,3}",
        prop_oneof![
            4 => prop::collection::vec(param.clone(), 0..3),
            1 => prop::collection::vec(param, 95..260),
        ],
        any::<bool>(),
        any::<bool>(),
        prop::option::of(0u32..4),
    )
        .prop_map(|(kind, name, params, deprecated, smart, weight)| {
            let signature = kind.takes_signature().then_some(params);
            let candidate = Candidate::new(kind, name, signature)
                .expect("signature presence follows the kind")
                .deprecated(deprecated)
                .smart_typed(smart);
            match weight {
                Some(weight) => candidate.with_reference_weight(weight),
                None => candidate,
            }
        })
}
