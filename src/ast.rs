//! # Regex AST and the derivative engine
//! [Ast] is the regex operator tree that [crate::graph::RegexGraph] compiles into a
//! DFA. It is a closed, five-variant tagged sum (not a trait-object hierarchy — the
//! shapes are fixed and known at compile time), and every variant implements the same
//! four operations: [Ast::advance] (the one-step derivative), [Ast::reset], structural
//! equality that is aware of in-progress derivation state (see the module-level notes
//! below), and [Display] rendering for diagnostics.
//!
//! ## Equality is not structural in the usual sense
//! Two ASTs compare equal if they would behave identically from here on, not if they
//! were built from the same literal syntax. This is what lets subset construction
//! converge on a finite number of DFA states even for patterns like `a*`: after enough
//! iterations, every `Repeat` in "can stop any time" mode collapses to the same item,
//! regardless of exactly how many iterations it has already completed. See each
//! variant's `PartialEq` arm below, which mirrors spec section 4.1 one rule per
//! variant.
//!
//! ## Derivation never mutates a shared subtree
//! [Ast::advance] always returns freshly constructed nodes; a node reachable from an
//! earlier derivation step is never written through. This crate uses plain [Clone]
//! (structural copies) rather than copy-on-write, since the trees involved are small
//! and the simplicity is worth more than avoiding a few allocations.

use crate::charset::CharSet;
use std::fmt::{self, Display, Formatter};

/// Whether a one-step derivative completes a match right now, or needs more input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// The edge completes a match if the input ends here.
    HasMatch,
    /// More input is required after following this edge.
    NotMatch,
}

/// One outgoing edge of [Ast::advance]: the character set labelling it (or
/// [CharSet::epsilon] for "no character consumed, but derivation progressed"), whether
/// it completes a match, and the AST state on the far side of the edge.
pub type Edge = (CharSet, Status, Ast);

/// The regex operator tree. See the module docs for the equality/derivation
/// invariants that make subset construction terminate.
#[derive(Clone, Debug)]
pub enum Ast {
    /// Matches exactly one character from `charset`. `consumed` is true once that
    /// character has already been produced in the current derivation walk.
    Atom { charset: CharSet, consumed: bool },
    /// Matches `inner` between `min` and `max` (`None` = unbounded) times. `count` is
    /// the number of complete iterations so far; `dirty` is true once the current
    /// iteration has started producing characters; `greedy` controls whether the
    /// repeat prefers to stop as soon as it's allowed to.
    Repeat {
        inner: Box<Ast>,
        min: usize,
        max: Option<usize>,
        count: usize,
        dirty: bool,
        greedy: bool,
    },
    /// Alternation. `cursor` is `None` before one alternative has been selected for
    /// the current derivation, else the index of the chosen alternative.
    Choice {
        alternatives: Vec<Ast>,
        cursor: Option<usize>,
    },
    /// Concatenation. `cursor` is the index of the child currently being derived;
    /// `cursor == children.len()` means the sequence has already completed.
    Sequence { children: Vec<Ast>, cursor: usize },
    /// A named pattern wrapper. `id` survives every transformation and is what the
    /// matcher reports when this item accepts.
    Family { id: usize, inner: Box<Ast> },
}

impl Ast {
    /// A single-character atom.
    pub fn atom(charset: CharSet) -> Self {
        Ast::Atom {
            charset,
            consumed: false,
        }
    }

    /// `inner` repeated `min..=max` times (`max = None` for unbounded), greedy.
    pub fn repeat(inner: Ast, min: usize, max: Option<usize>) -> Self {
        Ast::Repeat {
            inner: Box::new(inner),
            min,
            max,
            count: 0,
            dirty: false,
            greedy: true,
        }
    }

    /// Alternation between `alternatives`, none selected yet.
    pub fn choice(alternatives: Vec<Ast>) -> Self {
        Ast::Choice {
            alternatives,
            cursor: None,
        }
    }

    /// Concatenation of `children`, starting at the first.
    pub fn sequence(children: Vec<Ast>) -> Self {
        Ast::Sequence {
            children,
            cursor: 0,
        }
    }

    /// Wraps `inner` with a pattern id that survives to the matcher's output.
    pub fn family(id: usize, inner: Ast) -> Self {
        Ast::Family {
            id,
            inner: Box::new(inner),
        }
    }

    /// Resets this node (and its children) back to its initial, untouched state.
    pub fn reset(&mut self) {
        match self {
            Ast::Atom { consumed, .. } => *consumed = false,
            Ast::Repeat {
                inner, count, dirty, ..
            } => {
                *count = 0;
                *dirty = false;
                inner.reset();
            }
            Ast::Choice {
                alternatives,
                cursor,
            } => {
                *cursor = None;
                for alt in alternatives.iter_mut() {
                    alt.reset();
                }
            }
            Ast::Sequence { children, cursor } => {
                *cursor = 0;
                for child in children.iter_mut() {
                    child.reset();
                }
            }
            Ast::Family { inner, .. } => inner.reset(),
        }
    }

    /// Enumerates every one-step continuation of this AST node. `can_end` is true iff
    /// some item of the enclosing DFA state could already end here with no further
    /// input — it only affects non-greedy [Ast::Repeat] nodes, which prefer to
    /// terminate rather than attempt another iteration when it is set.
    pub fn advance(&self, can_end: bool) -> Vec<Edge> {
        match self {
            Ast::Atom { charset, consumed } => {
                if *consumed {
                    vec![(CharSet::epsilon(), Status::HasMatch, self.clone())]
                } else {
                    vec![(
                        charset.clone(),
                        Status::HasMatch,
                        Ast::Atom {
                            charset: charset.clone(),
                            consumed: true,
                        },
                    )]
                }
            }

            Ast::Repeat {
                inner,
                min,
                max,
                count,
                dirty,
                greedy,
            } => {
                let (min, max, count, dirty, greedy) = (*min, *max, *count, *dirty, *greedy);

                if !greedy && can_end {
                    return vec![(
                        CharSet::epsilon(),
                        Status::HasMatch,
                        Ast::Repeat {
                            inner: inner.clone(),
                            min,
                            max,
                            count,
                            dirty,
                            greedy,
                        },
                    )];
                }

                let mut result = Vec::new();
                if !dirty && count >= min {
                    result.push((
                        CharSet::epsilon(),
                        Status::HasMatch,
                        Ast::Repeat {
                            inner: inner.clone(),
                            min,
                            max,
                            count,
                            dirty,
                            greedy,
                        },
                    ));
                }
                if max == Some(count) {
                    return result;
                }

                for (path, status, sub_expr) in inner.advance(can_end) {
                    let mut cur_inner = sub_expr;
                    let mut cur_count = count;

                    if status == Status::HasMatch {
                        cur_inner.reset();
                        cur_count += 1;

                        if max == Some(cur_count) {
                            result.push((
                                path,
                                Status::HasMatch,
                                Ast::Repeat {
                                    inner: Box::new(cur_inner),
                                    min,
                                    max,
                                    count: cur_count,
                                    dirty: false,
                                    greedy,
                                },
                            ));
                            continue;
                        }
                        if path.is_epsilon() {
                            let next = Ast::Repeat {
                                inner: Box::new(cur_inner),
                                min,
                                max,
                                count: cur_count,
                                dirty: false,
                                greedy,
                            };
                            result.extend(next.advance(can_end));
                            continue;
                        }
                        if cur_count >= min {
                            result.push((
                                path.clone(),
                                Status::HasMatch,
                                Ast::Repeat {
                                    inner: Box::new(cur_inner.clone()),
                                    min,
                                    max,
                                    count: cur_count,
                                    dirty: false,
                                    greedy,
                                },
                            ));
                        }
                    }

                    result.push((
                        path,
                        Status::NotMatch,
                        Ast::Repeat {
                            inner: Box::new(cur_inner),
                            min,
                            max,
                            count: cur_count,
                            dirty: true,
                            greedy,
                        },
                    ));
                }
                result
            }

            Ast::Choice {
                alternatives,
                cursor,
            } => {
                let mut result = Vec::new();
                match cursor {
                    None => {
                        for i in 0..alternatives.len() {
                            let copy = Ast::Choice {
                                alternatives: alternatives.clone(),
                                cursor: Some(i),
                            };
                            result.extend(copy.advance(can_end));
                        }
                    }
                    Some(idx) => {
                        for (path, status, sub_expr) in alternatives[*idx].advance(can_end) {
                            let mut new_alts = alternatives.clone();
                            new_alts[*idx] = sub_expr;
                            result.push((
                                path,
                                status,
                                Ast::Choice {
                                    alternatives: new_alts,
                                    cursor: Some(*idx),
                                },
                            ));
                        }
                    }
                }
                result
            }

            Ast::Sequence { children, cursor } => {
                if *cursor == children.len() {
                    return vec![(CharSet::epsilon(), Status::HasMatch, self.clone())];
                }

                let mut result = Vec::new();
                for (path, status, sub_expr) in children[*cursor].advance(can_end) {
                    let mut new_children = children.clone();
                    new_children[*cursor] = sub_expr;
                    let mut new_cursor = *cursor;
                    if status == Status::HasMatch {
                        new_cursor += 1;
                    }

                    if new_cursor == new_children.len() {
                        result.push((
                            path,
                            Status::HasMatch,
                            Ast::Sequence {
                                children: new_children,
                                cursor: new_cursor,
                            },
                        ));
                    } else if path.is_epsilon() {
                        let copy = Ast::Sequence {
                            children: new_children,
                            cursor: new_cursor,
                        };
                        result.extend(copy.advance(can_end));
                    } else {
                        result.push((
                            path,
                            Status::NotMatch,
                            Ast::Sequence {
                                children: new_children,
                                cursor: new_cursor,
                            },
                        ));
                    }
                }
                result
            }

            Ast::Family { id, inner } => inner
                .advance(can_end)
                .into_iter()
                .map(|(path, status, sub_expr)| {
                    (
                        path,
                        status,
                        Ast::Family {
                            id: *id,
                            inner: Box::new(sub_expr),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl PartialEq for Ast {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Ast::Atom { consumed: a, .. }, Ast::Atom { consumed: b, .. }) => a == b,
            (
                Ast::Repeat {
                    inner: a_inner,
                    min: a_min,
                    max: a_max,
                    count: a_count,
                    ..
                },
                Ast::Repeat {
                    inner: b_inner,
                    min: b_min,
                    max: b_max,
                    count: b_count,
                    ..
                },
            ) => {
                let can_stop_anywhere = a_count >= a_min
                    && b_count >= b_min
                    && a_max.is_none()
                    && b_max.is_none();
                (a_count == b_count || can_stop_anywhere) && a_inner == b_inner
            }
            (
                Ast::Choice {
                    alternatives: a_alts,
                    cursor: a_cursor,
                },
                Ast::Choice {
                    alternatives: b_alts,
                    cursor: b_cursor,
                },
            ) => {
                a_cursor == b_cursor
                    && match a_cursor {
                        None => true,
                        Some(i) => a_alts[*i] == b_alts[*i],
                    }
            }
            (
                Ast::Sequence {
                    children: a_children,
                    cursor: a_cursor,
                },
                Ast::Sequence {
                    children: b_children,
                    cursor: b_cursor,
                },
            ) => {
                a_cursor == b_cursor
                    && (*a_cursor == a_children.len() || a_children[*a_cursor] == b_children[*b_cursor])
            }
            (
                Ast::Family {
                    id: a_id,
                    inner: a_inner,
                },
                Ast::Family {
                    id: b_id,
                    inner: b_inner,
                },
            ) => a_id == b_id && a_inner == b_inner,
            _ => false,
        }
    }
}

impl Eq for Ast {}

impl Display for Ast {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Atom { charset, .. } => write!(f, "{charset}"),
            Ast::Repeat {
                inner,
                min,
                count,
                max,
                ..
            } => {
                write!(f, "{inner}{{{min},{count},")?;
                match max {
                    Some(max) => write!(f, "{max}}}"),
                    None => write!(f, "}}"),
                }
            }
            Ast::Choice {
                alternatives,
                cursor,
            } => {
                write!(f, "(")?;
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    if Some(i) == *cursor {
                        write!(f, "[{alt}]")?;
                    } else {
                        write!(f, "{alt}")?;
                    }
                }
                write!(f, ")")
            }
            Ast::Sequence { children, cursor } => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i == *cursor {
                        write!(f, "[{child}]")?;
                    } else {
                        write!(f, "{child}")?;
                    }
                }
                write!(f, ")")
            }
            Ast::Family { id, inner } => write!(f, "{inner}->{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(c: u8) -> Ast {
        Ast::atom(CharSet::single(c))
    }

    #[test]
    fn atom_advance_consumes_once() {
        let a = atom(b'a');
        let edges = a.advance(false);
        assert_eq!(edges.len(), 1);
        let (path, status, next) = &edges[0];
        assert_eq!(path, &CharSet::single(b'a'));
        assert_eq!(*status, Status::HasMatch);

        let edges2 = next.advance(false);
        assert_eq!(edges2.len(), 1);
        assert!(edges2[0].0.is_epsilon());
    }

    #[test]
    fn unbounded_repeat_converges_after_min_reached() {
        // a* : after 5 or 50 iterations, both "can stop any time" states are equal.
        let five = Ast::Repeat {
            inner: Box::new(atom(b'a')),
            min: 0,
            max: None,
            count: 5,
            dirty: false,
            greedy: true,
        };
        let fifty = Ast::Repeat {
            inner: Box::new(atom(b'a')),
            min: 0,
            max: None,
            count: 50,
            dirty: false,
            greedy: true,
        };
        assert_eq!(five, fifty);
    }

    #[test]
    fn bounded_repeat_distinguishes_counts() {
        let a2 = Ast::Repeat {
            inner: Box::new(atom(b'a')),
            min: 0,
            max: Some(3),
            count: 2,
            dirty: false,
            greedy: true,
        };
        let a1 = Ast::Repeat {
            inner: Box::new(atom(b'a')),
            min: 0,
            max: Some(3),
            count: 1,
            dirty: false,
            greedy: true,
        };
        assert_ne!(a2, a1);
    }

    #[test]
    fn sequence_epsilon_edge_recurses_into_next_child() {
        // Sequence(Repeat(a,0,0), b): the repeat with max=0 can only emit EPSILON,
        // so advancing the sequence should directly expose `b`'s atom edge.
        let seq = Ast::sequence(vec![Ast::repeat(atom(b'a'), 0, Some(0)), atom(b'b')]);
        let edges = seq.advance(false);
        assert_eq!(edges.len(), 1);
        let (path, status, _) = &edges[0];
        assert_eq!(path, &CharSet::single(b'b'));
        assert_eq!(*status, Status::HasMatch);
    }

    #[test]
    fn non_greedy_repeat_prefers_stopping_when_can_end() {
        let r = Ast::Repeat {
            inner: Box::new(atom(b'a')),
            min: 0,
            max: None,
            count: 0,
            dirty: false,
            greedy: false,
        };
        let edges = r.advance(true);
        assert_eq!(edges.len(), 1);
        assert!(edges[0].0.is_epsilon());
        assert_eq!(edges[0].1, Status::HasMatch);
    }
}
