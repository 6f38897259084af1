//! Cleanup and validation of raw model output.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("static regex"));

static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:rewritten query|search query|description|query|answer|output)\s*:\s*")
        .expect("static regex")
});

const QUOTES: &[char] = &['"', '\'', '`', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

/// Reduces model output to a single lowercase phrase of at most `max_chars`.
///
/// Drops reasoning blocks, code fences, `Query:`-style labels and wrapping
/// quotes, keeps the first non-empty line and collapses whitespace. Returns an
/// empty string when nothing usable remains.
pub fn sanitize(output: &str, max_chars: usize) -> String {
    let no_think = THINK_BLOCK.replace_all(output, "");
    // An unterminated reasoning block leaves nothing trustworthy.
    if no_think.to_ascii_lowercase().contains("<think>") {
        return String::new();
    }

    let Some(line) = no_think
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```"))
    else {
        return String::new();
    };

    let line = LEADING_LABEL.replace(line, "");
    let line = line
        .trim()
        .trim_matches(QUOTES)
        .trim_end_matches(['.', '!', '?'])
        .trim();

    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    clamp(&collapsed, max_chars)
}

/// Cuts at a char boundary, backing off to the last whole word when possible.
fn clamp(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    if s.chars().nth(max_chars) == Some(' ') {
        return cut;
    }
    match cut.rfind(' ') {
        Some(pos) if pos > 0 => cut[..pos].trim_end().to_string(),
        _ => cut,
    }
}

fn words(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

const NEGATIONS: &[&str] = &["not", "no", "without", "except", "excluding", "never", "none", "nor"];

/// Negation and exclusion tokens of `s`, lowercased, in order of appearance.
/// Contractions ending in `n't` count as one token.
fn negations(s: &str) -> Vec<String> {
    s.split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .replace('\u{2019}', "'")
                .to_lowercase()
        })
        .filter(|t| NEGATIONS.contains(&t.as_str()) || t.ends_with("n't"))
        .collect()
}

/// `true` when every word of `candidate` occurs in `raw_query` and every
/// negation of `raw_query` survives in `candidate`.
///
/// Matching is case-insensitive and tolerates a trailing ASCII plural `s` on
/// either side ("cats" vs "cat"). An empty candidate is never faithful.
pub fn is_faithful(raw_query: &str, candidate: &str) -> bool {
    let kept = negations(candidate);
    if negations(raw_query).iter().any(|n| !kept.contains(n)) {
        return false;
    }
    uses_query_words(raw_query, candidate)
}

fn uses_query_words(raw_query: &str, candidate: &str) -> bool {
    let known: HashSet<String> = words(raw_query).collect();
    let mut any = false;
    for w in words(candidate) {
        any = true;
        let singular = w.strip_suffix('s').filter(|s| !s.is_empty());
        let ok = known.contains(&w)
            || known.contains(&format!("{w}s"))
            || singular.is_some_and(|s| known.contains(s));
        if !ok {
            return false;
        }
    }
    any
}

/// Words of `candidate` absent from `raw_query`, followed by negations the
/// candidate dropped (prefixed with `-`), for diagnostics.
pub(crate) fn foreign_words(raw_query: &str, candidate: &str) -> Vec<String> {
    let kept = negations(candidate);
    words(candidate)
        .filter(|w| !uses_query_words(raw_query, w))
        .chain(
            negations(raw_query)
                .into_iter()
                .filter(|n| !kept.contains(n))
                .map(|n| format!("-{n}")),
        )
        .collect()
}
