//! # wfa-rs: Weighted Automata and Rational Expressions in Rust
//!
//! **`wfa-rs`** is a library for working with **weighted rational expressions** and
//! **weighted finite automata** over a variety of label and weight algebras.
//!
//! ## What is a weighted automaton?
//!
//! A weighted automaton maps every word to a weight taken in a semiring: Booleans give the
//! classical recognizers, integers count paths, tropical semirings compute shortest paths,
//! and rational expressions used as weights give transducer-like objects.
//! Rational expressions describe the same series; the derived-term construction turns an
//! expression into an equivalent automaton.
//!
//! ## Key Features
//!
//! - **Contexts**: every value lives in a [`Context`][crate::context::Context], a labelset (letters,
//!   nullable letters, words, or tuples of these) paired with a weightset (`B`, `Z`, `Q`, `R`,
//!   `Zmin`, `Zmax`, or expressions).
//! - **Expressions with identities**: [`Expression`][crate::expression::Expression]s are normalized
//!   while being built, at the chosen [`Identities`][crate::expression::Identities] level.
//! - **Expansions and derived terms**: first-order expansions, constant terms, and derived-term
//!   automata whose states remember their expressions.
//! - **Automaton algorithms**: epsilon-elimination, ambiguity, synchronization of multi-tape
//!   automata, determinization, accessibility, strongly connected components.
//! - **Formats**: the canonical expression syntax (text and utf8), an ERE dialect, polynomials,
//!   and DOT for automata.
//!
//! ## Basic Usage
//!
//! ```rust
//! use wfa_rs::context::Context;
//! use wfa_rs::expression::Expression;
//!
//! // 1. Pick a context: letters `a` and `b`, integer weights
//! let ctx = Context::parse("lal_char(ab), z").unwrap();
//!
//! // 2. Parse an expression
//! let e = Expression::parse(&ctx, "(a+<2>b)*").unwrap();
//!
//! // 3. Build its derived-term automaton
//! let aut = e.derived_term().unwrap().strip();
//! assert_eq!(aut.num_states(), 1);
//!
//! // 4. Evaluate words
//! assert_eq!(aut.eval("abb").unwrap().to_string(), "4");
//! ```
//!
//! ## Core Components
//!
//! - **[`context`]**, **[`labelset`]**, **[`weightset`]**: the algebras.
//! - **[`expression`]**, **[`parser`]**, **[`printer`]**: rational expressions and their syntaxes.
//! - **[`polynomial`]**, **[`expansion`]**, **[`derived_term`]**, **[`standard`]**: linear combinations,
//!   derivation and the standard automaton.
//! - **[`automaton`]**: the mutable automaton, with algorithms in [`properties`], [`scc`],
//!   [`proper`], [`ambiguity`], [`synchronize`], [`determinize`] and [`cast`] (which also
//!   projects multi-tape automata onto one tape).
//! - **[`dot`]**, **[`info`]**: input/output and summaries.

pub mod ambiguity;
pub mod automaton;
pub mod cast;
pub mod context;
pub mod derived_term;
pub mod determinize;
pub mod dot;
pub mod error;
pub mod expansion;
pub mod expression;
pub mod info;
pub mod labelset;
pub mod parser;
pub mod polynomial;
pub mod printer;
pub mod proper;
pub mod properties;
pub mod scc;
pub mod standard;
pub mod synchronize;
pub mod weightset;
