//! # Running a compiled graph over input
//! [GraphEvaluator] walks a [RegexGraph] one byte at a time, the way
//! [`DfaEvaluator`](https://docs.rs/dandy) walks a plain string-alphabet DFA: it owns
//! a reference to the graph and a cursor, and each [GraphEvaluator::step] is O(1) work
//! plus a linear scan of the current state's transitions. [RegexGraph::run] wraps this
//! into the one-shot longest-match query most callers want.

use super::{accept_ids, DfaState, RegexGraph};

/// The result of matching a compiled graph against a prefix of some input: how many
/// bytes were consumed and which pattern ids accept there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub length: usize,
    pub accept_ids: Vec<usize>,
}

/// A cursor over a [RegexGraph], tracking the current state and the best match seen
/// so far as input is fed in one byte at a time.
#[derive(Clone, Debug)]
pub struct GraphEvaluator<'a> {
    graph: &'a RegexGraph,
    current_state: Option<usize>,
    position: usize,
    last_match: Option<Match>,
}

impl<'a> GraphEvaluator<'a> {
    /// Starts a fresh walk of `graph` at state 0, recording an immediate match if
    /// state 0 itself already accepts (e.g. `a*` matches the empty input).
    pub fn new(graph: &'a RegexGraph) -> Self {
        let mut eval = GraphEvaluator {
            graph,
            current_state: Some(0),
            position: 0,
            last_match: None,
        };
        eval.record_if_accepting();
        eval
    }

    /// The state currently occupied, or `None` once a byte with no matching
    /// transition has been fed in (the walk is then stuck for good).
    pub fn current_state(&self) -> Option<&DfaState> {
        self.current_state.map(|idx| &self.graph.states()[idx])
    }

    /// True iff the current state accepts (has a non-empty `accept` set).
    pub fn is_accepting(&self) -> bool {
        self.current_state()
            .is_some_and(|state| !state.accept.is_empty())
    }

    /// The best match recorded so far: the longest prefix consumed that ended in an
    /// accepting state.
    pub fn last_match(&self) -> Option<&Match> {
        self.last_match.as_ref()
    }

    /// Feeds one byte, following the first transition (in insertion order) whose
    /// [`CharSet`](crate::charset::CharSet) contains it. Returns the state reached,
    /// or `None` if no transition matched (the walk is then permanently stuck).
    pub fn step(&mut self, byte: u8) -> Option<&DfaState> {
        let Some(idx) = self.current_state else {
            return None;
        };
        let state = &self.graph.states()[idx];
        let next = state
            .transitions
            .iter()
            .find(|(charset, _)| charset.contains(byte))
            .map(|(_, target)| *target);

        self.current_state = next;
        self.position += 1;
        match next {
            Some(_) => {
                self.record_if_accepting();
                self.current_state()
            }
            None => None,
        }
    }

    fn record_if_accepting(&mut self) {
        if let Some(state) = self.current_state() {
            if !state.accept.is_empty() {
                self.last_match = Some(Match {
                    length: self.position,
                    accept_ids: accept_ids(state),
                });
            }
        }
    }
}

impl RegexGraph {
    /// Matches `input` against this compiled graph, returning the longest prefix
    /// that ends in an accepting state (and the pattern ids that accept there), or
    /// `None` if no prefix — including the empty one — accepts.
    pub fn run(&self, input: &[u8]) -> Option<Match> {
        let mut eval = GraphEvaluator::new(self);
        for &byte in input {
            if eval.step(byte).is_none() {
                break;
            }
        }
        eval.last_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;
    use crate::charset::CharSet;

    fn atom(c: u8) -> Ast {
        Ast::atom(CharSet::single(c))
    }

    fn compiled(patterns: Vec<Ast>) -> RegexGraph {
        let mut graph = RegexGraph::new(patterns);
        graph.compile(None);
        graph.aggregate();
        graph
    }

    #[test]
    fn longest_match_wins_across_patterns() {
        // "a+", "ab", "(a|b)+" over "aab": a+ matches "aa" (len 2), (a|b)+ matches
        // the whole "aab" (len 3) — the longer one wins.
        let a_plus = Ast::repeat(atom(b'a'), 1, None);
        let ab = Ast::sequence(vec![atom(b'a'), atom(b'b')]);
        let ab_star = Ast::repeat(Ast::choice(vec![atom(b'a'), atom(b'b')]), 1, None);
        let graph = compiled(vec![a_plus, ab, ab_star]);

        let m = graph.run(b"aab").expect("should match");
        assert_eq!(m.length, 3);
        assert_eq!(m.accept_ids, vec![2]);
    }

    #[test]
    fn empty_input_with_star_matches_empty_string() {
        let graph = compiled(vec![Ast::repeat(atom(b'a'), 0, None)]);
        let m = graph.run(b"").expect("a* must match empty input");
        assert_eq!(m.length, 0);
        assert_eq!(m.accept_ids, vec![0]);
    }

    #[test]
    fn no_transition_falls_back_to_last_match() {
        let graph = compiled(vec![Ast::sequence(vec![atom(b'a'), atom(b'b')])]);
        assert!(graph.run(b"ac").is_none());
        assert!(graph.run(b"a").is_none());
        assert_eq!(graph.run(b"ab").unwrap().length, 2);
    }

    #[test]
    fn no_match_at_all_returns_none() {
        let graph = compiled(vec![atom(b'a')]);
        assert!(graph.run(b"b").is_none());
    }

    #[test]
    fn run_is_deterministic() {
        let graph = compiled(vec![Ast::repeat(atom(b'a'), 1, None), atom(b'b')]);
        assert_eq!(graph.run(b"aaa"), graph.run(b"aaa"));
    }
}
