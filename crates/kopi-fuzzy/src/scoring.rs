use std::cmp::Ordering;

use crate::camel::camel_case_match;

/// The kind of match that was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// `candidate` starts with `query` (ASCII case-insensitive).
    Prefix,
    /// Every hump of `query` starts a hump of `candidate`.
    CamelCase,
    /// General fuzzy subsequence match.
    Fuzzy,
}

impl MatchKind {
    fn rank(self) -> i32 {
        match self {
            MatchKind::Prefix => 3,
            MatchKind::CamelCase => 2,
            MatchKind::Fuzzy => 1,
        }
    }
}

/// Score returned by [`fuzzy_match`] and [`IdentifierMatcher::score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub kind: MatchKind,
    pub score: i32,
}

/// A key that defines stable ordering for matches; greater is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    kind_rank: i32,
    score: i32,
}

impl MatchScore {
    pub fn rank_key(self) -> RankKey {
        RankKey {
            kind_rank: self.kind.rank(),
            score: self.score,
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.kind_rank, self.score).cmp(&(other.kind_rank, other.score))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline]
fn fold_byte(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

#[inline]
fn is_separator(b: u8) -> bool {
    matches!(b, b'_' | b'$' | b'.' | b'<' | b'>' | b'(' | b')' | b'[' | b']' | b',')
}

pub(crate) fn is_word_start(candidate: &[u8], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    let prev = candidate[i - 1];
    let b = candidate[i];
    is_separator(prev)
        || (prev.is_ascii_lowercase() && b.is_ascii_uppercase())
        || (prev.is_ascii_alphabetic() && b.is_ascii_digit())
        || (prev.is_ascii_digit() && b.is_ascii_alphabetic())
}

const MIN_SCORE: i32 = i32::MIN / 4;
const PREFIX_BASE: i32 = 1_000_000;
const CAMEL_BASE: i32 = 500_000;

const BASE_MATCH: i32 = 10;
const BONUS_WORD_START: i32 = 15;
const BONUS_CONSECUTIVE: i32 = 5;
const BONUS_EXACT_CASE: i32 = 2;
const GAP_PENALTY: i32 = 1;
const LEADING_PENALTY: i32 = 1;
const TRAILING_PENALTY: i32 = 1;

/// Reusable matcher for one typed prefix.
///
/// A completion query scores thousands of identifiers against the same prefix, so the DP rows
/// are kept between calls instead of being reallocated per candidate.
#[derive(Debug, Clone)]
pub struct IdentifierMatcher {
    query: String,
    query_folded: Vec<u8>,
    dp_prev: Vec<i32>,
    dp_cur: Vec<i32>,
    word_starts: Vec<bool>,
}

impl IdentifierMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_owned(),
            query_folded: query.bytes().map(fold_byte).collect(),
            dp_prev: Vec::new(),
            dp_cur: Vec::new(),
            word_starts: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Case-insensitive prefix test.
    pub fn is_prefix_of(&self, candidate: &str) -> bool {
        let c = candidate.as_bytes();
        self.query_folded.len() <= c.len()
            && c.iter()
                .zip(&self.query_folded)
                .all(|(&c, &q)| fold_byte(c) == q)
    }

    /// Prefix or camel-case match, without subsequence fallback.
    pub fn camel_case(&self, candidate: &str) -> Option<MatchScore> {
        if self.query.is_empty() || self.is_prefix_of(candidate) {
            return Some(self.prefix_score(candidate));
        }
        camel_case_match(&self.query, candidate).then(|| MatchScore {
            kind: MatchKind::CamelCase,
            score: CAMEL_BASE - candidate.len() as i32,
        })
    }

    /// Best match of any kind.
    pub fn score(&mut self, candidate: &str) -> Option<MatchScore> {
        if let Some(score) = self.camel_case(candidate) {
            return Some(score);
        }
        self.subsequence_score(candidate.as_bytes())
            .map(|score| MatchScore {
                kind: MatchKind::Fuzzy,
                score,
            })
    }

    fn prefix_score(&self, candidate: &str) -> MatchScore {
        let score = if self.query.is_empty() {
            0
        } else {
            // Shorter identifiers win for the same prefix.
            PREFIX_BASE - candidate.len() as i32
        };
        MatchScore {
            kind: MatchKind::Prefix,
            score,
        }
    }

    fn subsequence_score(&mut self, candidate: &[u8]) -> Option<i32> {
        let query = self.query.as_bytes();
        if query.is_empty() {
            return Some(0);
        }
        if query.len() > candidate.len() {
            return None;
        }

        let n = candidate.len();
        self.dp_prev.clear();
        self.dp_prev.resize(n, MIN_SCORE);
        self.dp_cur.clear();
        self.dp_cur.resize(n, MIN_SCORE);
        self.word_starts.clear();
        self.word_starts
            .extend((0..n).map(|i| is_word_start(candidate, i)));

        let bonus = |word_start: bool, q: u8, c: u8| {
            let mut score = BASE_MATCH;
            if word_start {
                score += BONUS_WORD_START;
            }
            if q == c {
                score += BONUS_EXACT_CASE;
            }
            score
        };

        for (j, &c) in candidate.iter().enumerate() {
            if fold_byte(c) == self.query_folded[0] {
                self.dp_prev[j] =
                    bonus(self.word_starts[j], query[0], c) - LEADING_PENALTY * j as i32;
            }
        }

        for i in 1..query.len() {
            self.dp_cur.fill(MIN_SCORE);
            let mut running_max = MIN_SCORE;
            for (j, &c) in candidate.iter().enumerate() {
                if j > 0 && self.dp_prev[j - 1] > MIN_SCORE / 2 {
                    running_max = running_max.max(self.dp_prev[j - 1] + GAP_PENALTY * j as i32);
                }
                if fold_byte(c) != self.query_folded[i] {
                    continue;
                }

                let gapped = if running_max > MIN_SCORE / 2 {
                    running_max - GAP_PENALTY * j as i32
                } else {
                    MIN_SCORE
                };
                let consecutive = if j > 0 {
                    self.dp_prev[j - 1] + BONUS_CONSECUTIVE
                } else {
                    MIN_SCORE
                };
                let best = gapped.max(consecutive);
                if best <= MIN_SCORE / 2 {
                    continue;
                }
                self.dp_cur[j] = best + bonus(self.word_starts[j], query[i], c);
            }
            std::mem::swap(&mut self.dp_prev, &mut self.dp_cur);
        }

        self.dp_prev
            .iter()
            .enumerate()
            .filter(|(_, &score)| score > MIN_SCORE / 2)
            .map(|(j, &score)| score - TRAILING_PENALTY * (n - 1 - j) as i32)
            .max()
    }
}

/// Fuzzy match `query` against `candidate`.
///
/// - ASCII case-insensitive.
/// - Prefix matches always rank above camel-case matches, which rank above subsequence matches.
pub fn fuzzy_match(query: &str, candidate: &str) -> Option<MatchScore> {
    IdentifierMatcher::new(query).score(candidate)
}
