//! # Subset construction, minimisation and ambiguity analysis
//! [RegexGraph] owns the growing set of [DfaState]s produced by repeatedly
//! differentiating every item of every state ([Ast::advance]) until no state adds a
//! new successor. [RegexGraph::compile] drives that fixed point; [RegexGraph::aggregate]
//! then throws away item-set identity and merges states that are observably
//! equivalent; [RegexGraph::analyse] reports which accepting patterns can't be told
//! apart on some input.
//!
//! The one subtlety worth flagging up front: during a single state's processing, a
//! transition's "target" starts out as a candidate *set of AST items* (the items that
//! would make up the destination state) and is only resolved to a state index once
//! every edge reaching it has been collected — see [RegexGraph::process_state].

pub mod eval;

use crate::ast::{Ast, Status};
use crate::charset::CharSet;
use std::fmt::{self, Display, Formatter};

/// One DFA state: the AST items it's built from, its outgoing transitions (always
/// pairwise-disjoint [CharSet] keys once [RegexGraph::compile] has processed it), and
/// the subset of `exprs` that accept here.
#[derive(Clone, Debug, Default)]
pub struct DfaState {
    pub exprs: Vec<Ast>,
    pub transitions: Vec<(CharSet, usize)>,
    pub accept: Vec<Ast>,
}

/// A family compiled together into a single automaton. State 0 is always the initial
/// state, seeded with one [Ast::Family] per input pattern.
#[derive(Clone, Debug, Default)]
pub struct RegexGraph {
    states: Vec<DfaState>,
}

/// A report that two or more patterns can match the same input. See
/// [RegexGraph::analyse].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ambiguity {
    /// The family ids that all accept together at the reported witness.
    pub ids: Vec<usize>,
    /// A shortest representative input (one byte per transition followed back to the
    /// initial state) that lands in the ambiguous state.
    pub witness: Vec<u8>,
}

impl RegexGraph {
    /// Seeds state 0 with one [Ast::Family] per pattern, in input order (id == index).
    pub fn new(patterns: Vec<Ast>) -> Self {
        let exprs = patterns
            .into_iter()
            .enumerate()
            .map(|(id, ast)| Ast::family(id, ast))
            .collect();
        RegexGraph {
            states: vec![DfaState {
                exprs,
                transitions: Vec::new(),
                accept: Vec::new(),
            }],
        }
    }

    /// The states built so far, in index order.
    pub fn states(&self) -> &[DfaState] {
        &self.states
    }

    /// Number of states currently in the graph.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Runs subset-construction passes until a fixed point, or until the graph would
    /// grow past `max_state` (if given), in which case it stops early with a partial
    /// but well-formed graph — every state fully processed by that point is correct,
    /// only states beyond the cutoff are left unprocessed.
    pub fn compile(&mut self, max_state: Option<usize>) -> &mut Self {
        let mut last: Option<usize> = None;
        let mut boundary = 0usize;
        while last != Some(boundary) && max_state.map_or(true, |cap| boundary < cap) {
            last = Some(boundary);
            boundary = self.compile_pass(boundary);
        }
        self
    }

    /// Processes every state in `[start, len)` as of entry, possibly appending new
    /// states along the way. New states appended during this pass are *not*
    /// processed by it — they're picked up by the next pass, starting at the
    /// returned boundary.
    fn compile_pass(&mut self, start: usize) -> usize {
        let stop = self.states.len();
        for i in start..stop {
            self.process_state(i);
        }
        stop
    }

    /// Computes `can_end`, differentiates every item of state `i`, and resolves the
    /// resulting candidate transitions into indices — the per-state body of
    /// subset construction (spec section 4.4).
    fn process_state(&mut self, i: usize) {
        let exprs = self.states[i].exprs.clone();
        let can_end = exprs
            .iter()
            .any(|e| e.advance(false).iter().any(|(path, _, _)| path.is_epsilon()));

        let mut accept: Vec<Ast> = Vec::new();
        let mut transitions: Vec<(CharSet, Vec<Ast>)> = Vec::new();

        for e in &exprs {
            for (path, _status, next) in e.advance(can_end) {
                if path.is_epsilon() {
                    add_unique(&mut accept, e.clone());
                } else {
                    merge_edge(&mut transitions, path, next);
                }
            }
        }

        let mut resolved: Vec<(CharSet, usize)> = Vec::with_capacity(transitions.len());
        for (path, candidate) in transitions {
            let target = self
                .states
                .iter()
                .position(|s| item_sets_equal(&s.exprs, &candidate))
                .unwrap_or_else(|| {
                    let idx = self.states.len();
                    self.states.push(DfaState {
                        exprs: candidate,
                        transitions: Vec::new(),
                        accept: Vec::new(),
                    });
                    idx
                });
            resolved.push((path, target));
        }
        unify_transitions(&mut resolved);

        self.states[i].accept = accept;
        self.states[i].transitions = resolved;
    }

    /// Minimises the graph in place: normalises each state's `accept` set to one
    /// entry per distinct [Ast::Family] id, then repeatedly merges states with
    /// identical accept-id-sets and identical transition functions until a full pass
    /// makes no further change.
    pub fn aggregate(&mut self) -> &mut Self {
        for state in self.states.iter_mut() {
            normalise_accept(&mut state.accept);
        }

        loop {
            let mut changed = false;
            let mut i = 0;
            while i < self.states.len() {
                let mut j = i + 1;
                while j < self.states.len() {
                    if states_equivalent(&self.states[i], &self.states[j]) {
                        self.merge_states(i, j);
                        changed = true;
                    } else {
                        j += 1;
                    }
                }
                i += 1;
            }
            if !changed {
                break;
            }
        }
        self
    }

    /// Redirects every transition targeting `j` to `i`, then deletes `j` by moving
    /// the last state into its slot (redirecting transitions to the moved state's
    /// old index accordingly), and re-unifies every state's transitions in case the
    /// redirect produced duplicate targets.
    fn merge_states(&mut self, i: usize, j: usize) {
        self.redirect(j, i);
        let last = self.states.len() - 1;
        self.states.swap_remove(j);
        if j != last {
            self.redirect(last, j);
        }
        for state in self.states.iter_mut() {
            unify_transitions(&mut state.transitions);
        }
    }

    fn redirect(&mut self, from: usize, to: usize) {
        for state in self.states.iter_mut() {
            for (_, target) in state.transitions.iter_mut() {
                if *target == from {
                    *target = to;
                }
            }
        }
    }

    /// For every state whose `accept` names more than one pattern id, finds some
    /// input that reaches it (by walking transitions backwards to state 0) and
    /// reports the ids as mutually ambiguous on that witness.
    pub fn analyse(&self) -> Vec<Ambiguity> {
        let mut out = Vec::new();
        for (i, state) in self.states.iter().enumerate() {
            let ids = accept_ids(state);
            if ids.len() > 1 {
                let witness = self.witness_to(i, &mut Vec::new()).unwrap_or_default();
                out.push(Ambiguity { ids, witness });
            }
        }
        out
    }

    fn witness_to(&self, state_id: usize, visited: &mut Vec<usize>) -> Option<Vec<u8>> {
        if state_id == 0 {
            return Some(Vec::new());
        }
        visited.push(state_id);
        for (i, state) in self.states.iter().enumerate() {
            if visited.contains(&i) {
                continue;
            }
            for (path, target) in &state.transitions {
                if *target == state_id {
                    if let Some(mut prefix) = self.witness_to(i, visited) {
                        prefix.push(path.ranges()[0].0);
                        return Some(prefix);
                    }
                }
            }
        }
        None
    }
}

/// Sorted, deduplicated family ids a state accepts on.
fn accept_ids(state: &DfaState) -> Vec<usize> {
    let mut ids: Vec<usize> = state.accept.iter().map(family_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn family_id(ast: &Ast) -> usize {
    match ast {
        Ast::Family { id, .. } => *id,
        _ => {
            debug_assert!(false, "accept items are always Family-wrapped");
            0
        }
    }
}

fn states_equivalent(a: &DfaState, b: &DfaState) -> bool {
    accept_ids(a) == accept_ids(b) && transitions_agree(&a.transitions, &b.transitions)
}

fn transitions_agree(a: &[(CharSet, usize)], b: &[(CharSet, usize)]) -> bool {
    a.len() == b.len() && a.iter().all(|(k, t)| b.iter().any(|(k2, t2)| k == k2 && t == t2))
}

/// Deduplicates `accept` by family id, keeping the last occurrence (matching
/// reference behaviour), and resets the inner AST of every kept item — cosmetic,
/// but keeps the minimisation-equivalence check symmetric with a freshly compiled
/// state (spec-resolved open question, see DESIGN.md).
fn normalise_accept(accept: &mut Vec<Ast>) {
    let mut seen = Vec::new();
    let mut kept = Vec::new();
    for item in accept.iter().rev() {
        let id = family_id(item);
        if !seen.contains(&id) {
            seen.push(id);
            kept.push(item.clone());
        }
    }
    kept.reverse();
    for item in kept.iter_mut() {
        if let Ast::Family { inner, .. } = item {
            inner.reset();
        }
    }
    *accept = kept;
}

fn add_unique(items: &mut Vec<Ast>, item: Ast) -> bool {
    if items.iter().any(|other| other == &item) {
        false
    } else {
        items.push(item);
        true
    }
}

fn item_sets_equal(a: &[Ast], b: &[Ast]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x == y))
}

/// Coalesces transitions that already share a target into a single entry keyed by
/// the union of their [CharSet]s — step 4 of spec section 4.4, also reused after
/// [RegexGraph::merge_states] redirects may have produced fresh duplicates.
fn unify_transitions(transitions: &mut Vec<(CharSet, usize)>) {
    let mut unified: Vec<(CharSet, usize)> = Vec::with_capacity(transitions.len());
    for (path, target) in transitions.drain(..) {
        match unified.iter_mut().find(|(_, t)| *t == target) {
            Some(entry) => entry.0 = entry.0.union(&path),
            None => unified.push((path, target)),
        }
    }
    *transitions = unified;
}

/// Merges a new derivative edge `(new_path -> new_item)` into a state's
/// in-progress candidate transitions, preserving the invariant that keys stay
/// pairwise disjoint — the edge-splitting protocol of spec section 4.4.
fn merge_edge(transitions: &mut Vec<(CharSet, Vec<Ast>)>, mut new_path: CharSet, new_item: Ast) {
    let snapshot = transitions.clone();
    for (old_path, old_targets) in snapshot {
        if new_path.is_epsilon() {
            break;
        }
        let (only_new, only_old, both) = new_path.intersect(&old_path);

        if let Some(pos) = transitions.iter().position(|(p, _)| p == &old_path) {
            transitions.remove(pos);
        }
        if !only_old.is_epsilon() {
            transitions.push((only_old, old_targets.clone()));
        }
        if !both.is_epsilon() {
            let mut merged = old_targets;
            add_unique(&mut merged, new_item.clone());
            transitions.push((both, merged));
        }
        new_path = only_new;
    }
    if !new_path.is_epsilon() {
        transitions.push((new_path, vec![new_item]));
    }
}

impl Display for RegexGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            writeln!(f, "State {i}")?;
            for expr in &state.exprs {
                writeln!(f, " {expr}")?;
            }
            writeln!(f, "accept:")?;
            for expr in &state.accept {
                writeln!(f, " {expr}")?;
            }
            writeln!(f, "transitions:")?;
            for (path, target) in &state.transitions {
                writeln!(f, " {path} -> {target}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::CharSet;

    fn atom(c: u8) -> Ast {
        Ast::atom(CharSet::single(c))
    }

    #[test]
    fn compile_builds_disjoint_transitions() {
        // "a|ab": sharing the leading `a` must split into a 1-char edge and a longer one.
        let a_only = Ast::atom(CharSet::single(b'a'));
        let ab = Ast::sequence(vec![atom(b'a'), atom(b'b')]);
        let mut graph = RegexGraph::new(vec![a_only, ab]);
        graph.compile(None);

        for state in graph.states() {
            for (i, (p1, _)) in state.transitions.iter().enumerate() {
                for (p2, _) in state.transitions.iter().skip(i + 1) {
                    let (_, _, both) = p1.intersect(p2);
                    assert!(both.is_epsilon(), "transitions must stay pairwise disjoint");
                }
            }
        }
    }

    #[test]
    fn compile_is_idempotent_at_fixpoint() {
        let mut graph = RegexGraph::new(vec![Ast::repeat(atom(b'a'), 0, None)]);
        graph.compile(None);
        let before = graph.state_count();
        graph.compile(None);
        assert_eq!(graph.state_count(), before);
    }

    #[test]
    fn aggregate_merges_states_with_identical_behaviour() {
        // "ab|cb": once past the first char, both halves behave identically.
        let ab = Ast::sequence(vec![atom(b'a'), atom(b'b')]);
        let cb = Ast::sequence(vec![atom(b'c'), atom(b'b')]);
        let mut graph = RegexGraph::new(vec![ab, cb]);
        graph.compile(None);
        let before = graph.state_count();
        graph.aggregate();
        assert!(graph.state_count() <= before);

        for i in 0..graph.states().len() {
            for j in (i + 1)..graph.states().len() {
                assert!(!states_equivalent(&graph.states()[i], &graph.states()[j]));
            }
        }
    }

    #[test]
    fn analyse_reports_shared_accepts() {
        // Two patterns that both accept "a".
        let mut graph = RegexGraph::new(vec![atom(b'a'), atom(b'a')]);
        graph.compile(None);
        graph.aggregate();
        let ambiguities = graph.analyse();
        assert!(ambiguities.iter().any(|a| a.ids == vec![0, 1] && a.witness == vec![b'a']));
    }

    #[test]
    fn analyse_is_empty_without_shared_accepts() {
        let mut graph = RegexGraph::new(vec![atom(b'a'), atom(b'b')]);
        graph.compile(None);
        graph.aggregate();
        assert!(graph.analyse().is_empty());
    }

    #[test]
    fn max_state_bounds_partial_compile() {
        let mut graph = RegexGraph::new(vec![Ast::repeat(atom(b'a'), 0, None)]);
        graph.compile(Some(1));
        assert!(graph.state_count() <= 2);
    }
}
