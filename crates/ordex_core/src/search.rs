//! Automata for fuzzy and pattern search.
//!
//! Both kinds of search compile a matcher once and hand it to the index,
//! which walks only the transitions the matcher can accept. The matcher is
//! owned by the resulting [`Stream`](crate::Stream) and released with it.

use crate::error::{CoreError, CoreResult};
use fst::Automaton;
use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder, DFA, SINK_STATE};
use regex_automata::DenseDFA;
use regex_syntax::hir::{Class, Hir, HirKind, RepetitionKind, RepetitionRange};
use std::sync::OnceLock;

/// Compiled matcher for a pattern search.
pub(crate) type PatternAutomaton = DenseDFA<Vec<usize>, usize>;

/// Largest edit distance a fuzzy search accepts.
pub const MAX_FUZZY_DISTANCE: u32 = 3;

/// State ceiling for a compiled fuzzy matcher.
const MAX_FUZZY_STATES: usize = 10_000;

/// Size ceiling for a pattern, counted in literals and class ranges after
/// repetitions are expanded.
const MAX_PATTERN_WEIGHT: usize = 1 << 16;

const DISTANCES: usize = MAX_FUZZY_DISTANCE as usize + 1;

/// One parametric builder per distance, created on first use.
static BUILDERS: [OnceLock<LevenshteinAutomatonBuilder>; DISTANCES] =
    [const { OnceLock::new() }; DISTANCES];

/// Matcher for keys within a fixed number of character edits of a term.
pub(crate) struct FuzzyAutomaton {
    dfa: DFA,
}

impl std::fmt::Debug for FuzzyAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzyAutomaton").finish_non_exhaustive()
    }
}

impl Automaton for FuzzyAutomaton {
    type State = u32;

    fn start(&self) -> u32 {
        self.dfa.initial_state()
    }

    fn is_match(&self, state: &u32) -> bool {
        matches!(self.dfa.distance(*state), Distance::Exact(_))
    }

    fn can_match(&self, state: &u32) -> bool {
        *state != SINK_STATE
    }

    fn accept(&self, state: &u32, byte: u8) -> u32 {
        self.dfa.transition(*state, byte)
    }
}

/// Builds a matcher for keys within `max_distance` edits of `term`.
///
/// Distance counts single-character insertions, deletions and substitutions.
pub(crate) fn fuzzy(term: &str, max_distance: u32) -> CoreResult<FuzzyAutomaton> {
    if max_distance > MAX_FUZZY_DISTANCE {
        tracing::warn!(term, max_distance, "fuzzy automaton refused");
        return Err(CoreError::AutomatonTooLarge {
            message: format!(
                "edit distance {max_distance} exceeds the maximum of {MAX_FUZZY_DISTANCE}"
            ),
        });
    }
    let builder = BUILDERS[max_distance as usize].get_or_init(|| {
        tracing::debug!(max_distance, "building levenshtein parametric automaton");
        LevenshteinAutomatonBuilder::new(max_distance as u8, false)
    });
    let dfa = builder.build_dfa(term);
    if dfa.num_states() > MAX_FUZZY_STATES {
        tracing::warn!(term, max_distance, states = dfa.num_states(), "fuzzy automaton refused");
        return Err(CoreError::AutomatonTooLarge {
            message: format!(
                "{} states exceed the limit of {MAX_FUZZY_STATES}",
                dfa.num_states()
            ),
        });
    }
    tracing::trace!(term, max_distance, states = dfa.num_states(), "compiled fuzzy automaton");
    Ok(FuzzyAutomaton { dfa })
}

/// Builds a matcher accepting keys the whole of which match `pattern`.
///
/// Lazy repetition, anchors and word boundaries are rejected because the
/// matcher runs over whole keys without lookaround.
pub(crate) fn pattern(pattern: &str) -> CoreResult<PatternAutomaton> {
    let hir = regex_syntax::ParserBuilder::new()
        .build()
        .parse(pattern)
        .map_err(|err| CoreError::pattern(err.to_string()))?;
    check_supported(&hir)?;
    let size = weight(&hir);
    if size > MAX_PATTERN_WEIGHT {
        return Err(CoreError::pattern(format!(
            "pattern too large: weight {size} exceeds {MAX_PATTERN_WEIGHT}"
        )));
    }

    let automaton = regex_automata::dense::Builder::new()
        .anchored(true)
        .longest_match(true)
        .build(pattern)
        .map_err(|err| CoreError::pattern(err.to_string()))?;
    tracing::trace!(pattern, "compiled pattern automaton");
    Ok(automaton)
}

fn check_supported(hir: &Hir) -> CoreResult<()> {
    match hir.kind() {
        HirKind::Empty | HirKind::Literal(_) | HirKind::Class(_) => Ok(()),
        HirKind::Anchor(_) => Err(CoreError::pattern("anchors are not supported")),
        HirKind::WordBoundary(_) => Err(CoreError::pattern("word boundaries are not supported")),
        HirKind::Repetition(rep) => {
            if !rep.greedy {
                return Err(CoreError::pattern("lazy repetition is not supported"));
            }
            check_supported(&rep.hir)
        }
        HirKind::Group(group) => check_supported(&group.hir),
        HirKind::Concat(parts) | HirKind::Alternation(parts) => {
            parts.iter().try_for_each(check_supported)
        }
    }
}

/// Estimates the compiled size of `hir`, saturating on overflow.
fn weight(hir: &Hir) -> usize {
    match hir.kind() {
        HirKind::Empty | HirKind::Anchor(_) | HirKind::WordBoundary(_) => 1,
        HirKind::Literal(_) => 1,
        HirKind::Class(Class::Unicode(class)) => class.ranges().len(),
        HirKind::Class(Class::Bytes(class)) => class.ranges().len(),
        HirKind::Repetition(rep) => {
            let copies = match rep.kind {
                RepetitionKind::ZeroOrOne | RepetitionKind::ZeroOrMore => 1,
                RepetitionKind::OneOrMore => 2,
                RepetitionKind::Range(RepetitionRange::Exactly(n)) => n,
                RepetitionKind::Range(RepetitionRange::AtLeast(n)) => n.saturating_add(1),
                RepetitionKind::Range(RepetitionRange::Bounded(_, m)) => m,
            };
            weight(&rep.hir).saturating_mul((copies as usize).max(1))
        }
        HirKind::Group(group) => weight(&group.hir),
        HirKind::Concat(parts) | HirKind::Alternation(parts) => {
            parts.iter().map(weight).fold(0, usize::saturating_add)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn accepts<A: Automaton>(aut: &A, input: &str) -> bool {
        let mut state = aut.start();
        for &byte in input.as_bytes() {
            state = aut.accept(&state, byte);
        }
        aut.is_match(&state)
    }

    #[test]
    fn fuzzy_counts_edits() {
        let aut = fuzzy("bam", 1).unwrap();
        assert!(accepts(&aut, "bar"));
        assert!(accepts(&aut, "baz"));
        assert!(accepts(&aut, "ba"));
        assert!(!accepts(&aut, "foo"));
    }

    #[test]
    fn fuzzy_substitutes_multibyte_characters() {
        let aut = fuzzy("aé", 1).unwrap();
        assert!(accepts(&aut, "aö"));
        assert!(accepts(&aut, "aë"));
        assert!(accepts(&aut, "a"));
        assert!(!accepts(&aut, "öö"));

        let aut = fuzzy("möö", 1).unwrap();
        assert!(accepts(&aut, "möo"));
        assert!(accepts(&aut, "mäö"));
        assert!(!accepts(&aut, "moo"));
    }

    #[test]
    fn fuzzy_refuses_huge_automaton() {
        let term = "a".repeat(24);
        let err = fuzzy(&term, 24).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AutomatonTooLarge);

        let err = fuzzy("bam", MAX_FUZZY_DISTANCE + 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AutomatonTooLarge);
        assert!(fuzzy("bam", MAX_FUZZY_DISTANCE).is_ok());
    }

    #[test]
    fn pattern_matches_whole_key() {
        let aut = pattern("ba.").unwrap();
        assert!(accepts(&aut, "bar"));
        assert!(accepts(&aut, "baz"));
        assert!(!accepts(&aut, "ba"));
        assert!(!accepts(&aut, "barn"));
    }

    #[test]
    fn pattern_alternation_keeps_longer_branch() {
        let aut = pattern("a|ab").unwrap();
        assert!(accepts(&aut, "a"));
        assert!(accepts(&aut, "ab"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert_eq!(pattern("(ba").unwrap_err().kind(), ErrorKind::Pattern);
    }

    #[test]
    fn oversized_pattern_is_rejected() {
        let err = pattern(r"[\w]{200}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Pattern);
        assert!(err.to_string().contains("too large"));

        assert!(pattern(r"\d{2}").is_ok());
        assert!(pattern("[a-z]{1,40}").is_ok());
    }

    #[test]
    fn pattern_weight_expands_repetition() {
        let parse = |p: &str| regex_syntax::Parser::new().parse(p).unwrap();
        assert_eq!(weight(&parse("abc")), 3);
        assert_eq!(weight(&parse("[a-c]{4}")), 4);
        assert_eq!(weight(&parse("(ab|c)+")), 6);
    }

    #[test]
    fn unsupported_constructs_are_rejected() {
        for bad in ["^bar", "bar$", r"\bbar", "ba.*?", "(?:x|a+?)"] {
            let err = pattern(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Pattern, "pattern {bad:?}");
        }
    }
}
