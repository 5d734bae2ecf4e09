use crate::scoring::is_word_start;

fn humps(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..bytes.len() {
        if bytes[i].is_ascii_uppercase() && is_word_start(bytes, i) || bytes[i - 1] == b'_' {
            if start < i {
                out.push(&text[start..i]);
            }
            start = i;
        }
    }
    if start < bytes.len() {
        out.push(&text[start..]);
    }
    out
}

fn query_humps(query: &str) -> Vec<&str> {
    let bytes = query.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..bytes.len() {
        if bytes[i].is_ascii_uppercase() {
            out.push(&query[start..i]);
            start = i;
        }
    }
    if start < bytes.len() {
        out.push(&query[start..]);
    }
    out
}

/// Camel-case match: `NPE` matches `NullPointerException`, `gNa` matches `getName`.
///
/// The first query hump must be a case-insensitive prefix of the candidate's first hump; every
/// following query hump (which starts with an upper-case letter) must be a case-sensitive prefix
/// of a later candidate hump, in order. Candidate humps may be skipped.
pub fn camel_case_match(query: &str, candidate: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    if !query.is_ascii() || !candidate.is_ascii() {
        return false;
    }

    let wanted = query_humps(query);
    let available = humps(candidate);
    let Some((first, rest)) = wanted.split_first() else {
        return true;
    };
    let Some((head, tail)) = available.split_first() else {
        return false;
    };

    let first_ok = first.len() <= head.len()
        && head.as_bytes()[..first.len()].eq_ignore_ascii_case(first.as_bytes());
    if !first_ok {
        return false;
    }

    let mut tail = tail.iter();
    rest.iter()
        .all(|part| tail.by_ref().any(|hump| hump.starts_with(part)))
}
