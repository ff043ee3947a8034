use hintswap_common::grammar::ProfileUrlGrammar;
use hintswap_common::protocol::ElementHandle;

/// A suggestion link read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub element: ElementHandle,
    pub href: String,
}

/// Pick the link to follow for `username`.
///
/// Only profile URLs qualify. A link whose href contains the username
/// (ignoring case) wins over the first qualifying link.
pub fn pick_candidate<'a>(
    candidates: &'a [Candidate],
    username: &str,
    grammar: &ProfileUrlGrammar,
) -> Option<&'a Candidate> {
    let needle = username.to_lowercase();
    let mut first = None;
    for candidate in candidates.iter().filter(|c| grammar.matches(&c.href)) {
        if candidate.href.to_lowercase().contains(&needle) {
            return Some(candidate);
        }
        first.get_or_insert(candidate);
    }
    first
}
