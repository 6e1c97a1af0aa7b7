//! # rexdfa
//!
//! `rexdfa` compiles a family of named regular expressions into a single
//! deterministic finite automaton that, given an input string, reports at each
//! position which (possibly multiple) named patterns match — the kind of engine a
//! lexer generator uses internally.
//!
//! ## Usage
//!
//! ```rust
//! use rexdfa::RegexGraph;
//! use rexdfa::parser::parse_regex;
//!
//! let patterns = ["a+", "ab", "(a|b)+"]
//!     .into_iter()
//!     .map(|p| parse_regex(p).unwrap())
//!     .collect();
//!
//! let mut graph = RegexGraph::new(patterns);
//! graph.compile(None).aggregate();
//!
//! let m = graph.run(b"aab").unwrap();
//! assert_eq!(m.length, 3);
//! assert_eq!(m.accept_ids, vec![2]);
//! ```
//!
//! ## How it fits together
//!
//! - [`parser`] turns regex source text into an [`ast::Ast`].
//! - [`ast`] is the regex operator tree; its [`ast::Ast::advance`] is the
//!   incremental derivative that drives compilation one character at a time.
//! - [`charset`] is the interval-set algebra ([`charset::CharSet`]) that labels
//!   every derivative edge.
//! - [`graph`] runs subset construction ([`graph::RegexGraph::compile`]),
//!   minimisation ([`graph::RegexGraph::aggregate`]) and ambiguity analysis
//!   ([`graph::RegexGraph::analyse`]) over the AST items, and
//!   [`graph::eval`] executes the resulting automaton
//!   ([`graph::RegexGraph::run`]).
//!
//! ## Scope
//!
//! This crate has no I/O, CLI, or file-format surface — it is a pure compute
//! library. Non-goals: submatch capture groups, backreferences, anchors, Unicode
//! classes beyond the byte alphabet `0..=127`, lookaround, and NFA simulation.

pub mod ast;
pub mod charset;
pub mod graph;
pub mod parser;

pub use ast::Ast;
pub use graph::eval::Match;
pub use graph::{Ambiguity, RegexGraph};
pub use parser::{parse_regex, ParseError};
