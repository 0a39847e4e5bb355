//! Preposition recognition for verb calls.
//!
//! A verb line like `put the apple in the box` is split around its first
//! preposition into a direct object (`the apple`) and an indirect object
//! (`the box`). Prepositions may span several words (`in front of`).

use crate::ast::{Expr, Node, Verbcall};

/// The recognized preposition phrases, in registration order.
pub const PREPOSITIONS: &[&str] = &[
    "with",
    "using",
    "at",
    "to",
    "in front of",
    "in",
    "inside",
    "into",
    "on top of",
    "on",
    "onto",
    "upon",
    "out of",
    "from inside",
    "from",
    "over",
    "through",
    "under",
    "underneath",
    "beneath",
    "behind",
    "beside",
    "for",
    "about",
    "is",
    "as",
    "off",
    "off of",
];

/// A preposition occurrence within a token list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrepositionMatch {
    /// The canonical phrase.
    pub phrase: &'static str,
    /// Number of words the phrase spans.
    pub word_count: usize,
    /// Index of the first word.
    pub start: usize,
}

impl PrepositionMatch {
    /// Index one past the last word.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.word_count
    }
}

/// Finds the non-overlapping preposition phrases in `nodes`.
///
/// Only bareword nodes can match, case-insensitively. When several phrases
/// start at the same word the longest wins; a match overlapping an earlier
/// one is dropped. Results are ordered by position.
#[must_use]
pub fn find_prepositions(nodes: &[Node]) -> Vec<PrepositionMatch> {
    let mut candidates = Vec::new();
    for &phrase in PREPOSITIONS {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.len() > nodes.len() {
            continue;
        }
        for start in 0..=nodes.len() - words.len() {
            let matched = words.iter().enumerate().all(|(offset, word)| {
                nodes[start + offset]
                    .as_word()
                    .is_some_and(|w| w.eq_ignore_ascii_case(word))
            });
            if matched {
                candidates.push(PrepositionMatch {
                    phrase,
                    word_count: words.len(),
                    start,
                });
            }
        }
    }

    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.word_count.cmp(&a.word_count)));

    let mut found: Vec<PrepositionMatch> = Vec::new();
    for candidate in candidates {
        if found.last().is_some_and(|last| candidate.start < last.end()) {
            continue;
        }
        found.push(candidate);
    }
    found
}

/// Builds a verb call from a line whose first node is the verb.
///
/// A preposition right after the verb (`look at the sky`) is dropped from
/// the direct object and does not split the line. The next preposition, if
/// any, separates direct and indirect object. `params` always keeps every
/// node after the verb. Returns `None` if the line does not start with a
/// bareword.
#[must_use]
pub fn verbcall_from_line(line: &[Node]) -> Option<Verbcall> {
    let verb = line.first()?.as_word()?.to_string();

    let mut preps = find_prepositions(line);
    preps.retain(|m| m.start >= 1);

    let mut direct_start = 1;
    if preps.first().is_some_and(|m| m.start == 1) {
        direct_start = preps.remove(0).end();
    }

    let (direct_obj, preposition, indirect_obj) = match preps.first() {
        Some(m) => (
            non_empty(&line[direct_start..m.start]),
            Some(m.phrase.to_string()),
            non_empty(&line[m.end()..]),
        ),
        None => (non_empty(line.get(direct_start..).unwrap_or_default()), None, None),
    };

    Some(Verbcall {
        verb,
        direct_obj,
        preposition,
        indirect_obj,
        params: line[1..].to_vec(),
    })
}

fn non_empty(nodes: &[Node]) -> Option<Expr> {
    if nodes.is_empty() {
        None
    } else {
        Some(nodes.to_vec())
    }
}
