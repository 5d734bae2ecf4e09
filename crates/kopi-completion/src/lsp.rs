//! Conversion of ranked candidates to LSP completion items.

use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionItemLabelDetails, CompletionItemTag,
    CompletionList, InsertTextFormat,
};
use serde_json::{json, Value};

use kopi_config::RankingConfig;
use kopi_core::{
    Candidate, CandidateKind, ExecutableKind, LinkKind, MemberKind, QueryId, TypeKind,
    VariableKind,
};

use crate::sort_key::SortKey;
use crate::strategy::InsertStrategy;

pub fn completion_item_kind(kind: &CandidateKind) -> CompletionItemKind {
    match kind {
        CandidateKind::Keyword => CompletionItemKind::KEYWORD,
        CandidateKind::Module | CandidateKind::Package => CompletionItemKind::MODULE,
        CandidateKind::Type(TypeKind::Class | TypeKind::Record) => CompletionItemKind::CLASS,
        CandidateKind::Type(TypeKind::Interface | TypeKind::Annotation) => {
            CompletionItemKind::INTERFACE
        }
        CandidateKind::Type(TypeKind::Enum) => CompletionItemKind::ENUM,
        CandidateKind::TypeParameter => CompletionItemKind::TYPE_PARAMETER,
        CandidateKind::Variable(VariableKind::EnumConstant) => CompletionItemKind::ENUM_MEMBER,
        CandidateKind::Variable(kind) if kind.is_member() => CompletionItemKind::FIELD,
        CandidateKind::Variable(_) => CompletionItemKind::VARIABLE,
        CandidateKind::Executable(ExecutableKind::Constructor) => CompletionItemKind::CONSTRUCTOR,
        CandidateKind::Executable(ExecutableKind::Method)
        | CandidateKind::StaticMember(MemberKind::Method) => CompletionItemKind::METHOD,
        CandidateKind::StaticMember(MemberKind::Field) => CompletionItemKind::FIELD,
        CandidateKind::ChainedMember(links) => match links.last() {
            Some(LinkKind::Local) => CompletionItemKind::VARIABLE,
            Some(LinkKind::Field) => CompletionItemKind::FIELD,
            Some(LinkKind::Other) | None => CompletionItemKind::METHOD,
        },
        CandidateKind::Attribute => CompletionItemKind::PROPERTY,
        CandidateKind::Lambda { .. } => CompletionItemKind::SNIPPET,
        CandidateKind::ParametersHint => CompletionItemKind::TEXT,
    }
}

/// Convert one ranked candidate.
///
/// `data` carries the query id and qualified name so a later `completionItem/resolve` can find
/// the symbol again for documentation.
pub fn to_lsp_completion_item(
    candidate: &Candidate,
    query: QueryId,
    config: &RankingConfig,
) -> CompletionItem {
    let insert = InsertStrategy::for_candidate(candidate, config).render(candidate);
    let params = candidate.signature().map(|params| {
        let joined: Vec<&str> = params.iter().map(|p| p.as_str()).collect();
        format!("({})", joined.join(", "))
    });

    let label = if candidate.name().is_empty() {
        params.clone().unwrap_or_default()
    } else {
        candidate.name().to_owned()
    };

    let data = json!({
        "kopi": {
            "query": query.to_string(),
            "qualified_name": candidate.qualified_name(),
        }
    });

    CompletionItem {
        label,
        label_details: Some(CompletionItemLabelDetails {
            detail: params.filter(|_| !candidate.name().is_empty()),
            description: candidate.type_name().map(str::to_owned),
        }),
        kind: Some(completion_item_kind(candidate.kind())),
        detail: detail(candidate),
        sort_text: Some(SortKey::of(candidate).sort_text()),
        filter_text: Some(candidate.name().to_owned()).filter(|name| !name.is_empty()),
        insert_text: Some(insert.text),
        insert_text_format: Some(if insert.is_snippet {
            InsertTextFormat::SNIPPET
        } else {
            InsertTextFormat::PLAIN_TEXT
        }),
        tags: candidate
            .is_deprecated()
            .then(|| vec![CompletionItemTag::DEPRECATED]),
        data: Some(data),
        ..CompletionItem::default()
    }
}

fn detail(candidate: &Candidate) -> Option<String> {
    if let Some(type_name) = candidate.type_name() {
        return Some(type_name.to_owned());
    }
    (candidate.qualified_name() != candidate.name()).then(|| candidate.qualified_name().to_owned())
}

/// Convert a ranked list. The list is complete unless the engine truncated it.
pub fn to_lsp_completion_list(
    ranked: &[Candidate],
    query: QueryId,
    config: &RankingConfig,
) -> CompletionList {
    let is_incomplete = config.max_results.is_some_and(|max| ranked.len() >= max);
    CompletionList {
        is_incomplete,
        items: ranked
            .iter()
            .map(|candidate| to_lsp_completion_item(candidate, query, config))
            .collect(),
    }
}

/// Qualified name stored in an item's `data` by [`to_lsp_completion_item`].
pub fn qualified_name_from_data(data: &Value) -> Option<&str> {
    data.get("kopi")?.get("qualified_name")?.as_str()
}
