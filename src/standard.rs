//! Standard (Glushkov) automata of expressions.
//!
//! The automaton is built bottom-up: every sub-expression yields a standard
//! automaton (a single initial state with no incoming transition), and the
//! operators glue these together without ever adding spontaneous
//! transitions. There is one state per atom occurrence, plus the initial one.

use log::debug;

use crate::automaton::{Automaton, StateId};
use crate::error::{Error, Result};
use crate::expression::{Exp, ExpNode, Expression};
use crate::weightset::{Semiring, WeightSet};

/// A standard sub-automaton: its initial state and its final states.
struct Piece {
    initial: StateId,
    finals: Vec<StateId>,
}

struct Builder {
    aut: Automaton,
    ws: WeightSet,
}

impl Builder {
    fn build(&mut self, e: &Exp) -> Result<Piece> {
        match &**e {
            ExpNode::Zero => Ok(Piece {
                initial: self.aut.new_state(),
                finals: Vec::new(),
            }),
            ExpNode::One => {
                let initial = self.aut.new_state();
                self.aut.set_final(initial, self.ws.one());
                Ok(Piece {
                    initial,
                    finals: vec![initial],
                })
            }
            ExpNode::Atom(label) => {
                let initial = self.aut.new_state();
                let s = self.aut.new_state();
                self.aut.set_transition(initial, s, label.clone(), self.ws.one());
                self.aut.set_final(s, self.ws.one());
                Ok(Piece {
                    initial,
                    finals: vec![s],
                })
            }
            ExpNode::Sum(es) => self.fold(es, Self::sum),
            ExpNode::Prod(es) => self.fold(es, Self::prod),
            ExpNode::Star(sub) => {
                let p = self.build(sub)?;
                self.star(p)
            }
            ExpNode::LWeight(w, sub) => {
                let p = self.build(sub)?;
                for t in self.aut.all_out(p.initial).to_vec() {
                    let weight = self.ws.mul(w, self.aut.weight_of(t));
                    self.aut.set_weight(t, weight);
                }
                Ok(self.live_finals(p))
            }
            ExpNode::RWeight(sub, w) => {
                let p = self.build(sub)?;
                for &f in &p.finals {
                    let weight = self.ws.mul(&self.aut.final_weight(f), w);
                    self.aut.set_final(f, weight);
                }
                Ok(self.live_finals(p))
            }
            other => Err(Error::precondition(
                "standard",
                format!("operator {} not supported", other.kind_name()),
            )),
        }
    }

    fn fold(&mut self, es: &[Exp], op: fn(&mut Self, Piece, Piece) -> Piece) -> Result<Piece> {
        let mut it = es.iter();
        let mut res = match it.next() {
            Some(first) => self.build(first)?,
            None => {
                return Ok(Piece {
                    initial: self.aut.new_state(),
                    finals: Vec::new(),
                })
            }
        };
        for e in it {
            let p = self.build(e)?;
            res = op(self, res, p);
        }
        Ok(res)
    }

    /// Merge the initial state of `rhs` into the one of `lhs`.
    fn sum(&mut self, lhs: Piece, rhs: Piece) -> Piece {
        for t in self.aut.all_out(rhs.initial).to_vec() {
            let tr = self.aut.transition(t).clone();
            self.aut.add_transition(lhs.initial, tr.dst, tr.label, tr.weight);
        }
        self.aut.del_state(rhs.initial);
        let mut finals = vec![lhs.initial];
        finals.extend(lhs.finals.into_iter().filter(|&f| f != lhs.initial));
        finals.extend(rhs.finals.into_iter().filter(|&f| f != rhs.initial));
        self.live_finals(Piece {
            initial: lhs.initial,
            finals,
        })
    }

    /// Plug the transitions leaving the initial state of `rhs` onto every
    /// final state of `lhs`.
    fn prod(&mut self, lhs: Piece, rhs: Piece) -> Piece {
        let rhs_out = self.aut.all_out(rhs.initial).to_vec();
        let rhs_out: Vec<_> = rhs_out.into_iter().map(|t| self.aut.transition(t).clone()).collect();
        let mut finals = Vec::new();
        for &f in &lhs.finals {
            let w = self.aut.final_weight(f);
            self.aut.set_final(f, self.ws.zero());
            for tr in &rhs_out {
                let weight = self.ws.mul(&w, &tr.weight);
                self.aut.add_transition(f, tr.dst, tr.label.clone(), weight);
            }
            if self.aut.is_final(f) {
                finals.push(f);
            }
        }
        self.aut.del_state(rhs.initial);
        finals.extend(rhs.finals.into_iter().filter(|&f| f != rhs.initial));
        Piece {
            initial: lhs.initial,
            finals,
        }
    }

    /// `E*` as `(c* E')* c*`, where `c` is the constant term of `E` and `E'`
    /// its proper part: every final state loops back through the (rescaled)
    /// transitions of the initial state.
    fn star(&mut self, p: Piece) -> Result<Piece> {
        let c = self.aut.final_weight(p.initial);
        let cs = self.ws.star(&c)?;
        for t in self.aut.out(p.initial) {
            let weight = self.ws.mul(&cs, self.aut.weight_of(t));
            self.aut.set_weight(t, weight);
        }
        self.aut.set_final(p.initial, cs.clone());
        let init_out: Vec<_> = self
            .aut
            .out(p.initial)
            .into_iter()
            .map(|t| self.aut.transition(t).clone())
            .collect();
        for &f in p.finals.iter().filter(|&&f| f != p.initial) {
            let w = self.aut.final_weight(f);
            for tr in &init_out {
                self.aut.add_transition(f, tr.dst, tr.label.clone(), self.ws.mul(&w, &tr.weight));
            }
            self.aut.set_final(f, self.ws.mul(&w, &cs));
        }
        let mut finals = vec![p.initial];
        finals.extend(p.finals.into_iter().filter(|&f| f != p.initial));
        Ok(self.live_finals(Piece {
            initial: p.initial,
            finals,
        }))
    }

    /// Drop the final states whose weight vanished.
    fn live_finals(&self, mut p: Piece) -> Piece {
        p.finals.retain(|&f| self.aut.is_final(f));
        p
    }
}

/// Build the standard automaton of `e`.
///
/// Only the rational operators are supported: sums, products, stars and
/// weights. Anything else (conjunction, tuples, complement...) is rejected.
pub fn standard(e: &Expression) -> Result<Automaton> {
    let rs = e.set();
    let mut b = Builder {
        aut: Automaton::new(rs.context().clone()),
        ws: rs.weightset().clone(),
    };
    let p = b.build(e.exp())?;
    b.aut.set_initial(p.initial, b.ws.one());
    // Renumber the states left over by the merges.
    let res = b.aut.restrict(|_| true);
    debug!("standard: {} states, {} transitions", res.num_states(), res.num_transitions());
    Ok(res)
}

impl Expression {
    /// The standard automaton of this expression.
    pub fn standard(&self) -> Result<Automaton> {
        standard(self)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::context::Context;

    fn std_aut(ctx: &str, text: &str) -> Automaton {
        let ctx = Context::parse(ctx).unwrap();
        Expression::parse(&ctx, text).unwrap().standard().unwrap()
    }

    #[test]
    fn test_one_state_per_atom() {
        let aut = std_aut("lal_char(ab), b", "(a+b)*a(a+b)");
        assert_eq!(aut.num_states(), 6);
        assert!(aut.is_standard());
        assert!(aut.is_proper());
        assert_eq!(aut.eval("bab").unwrap().to_string(), "1");
        assert_eq!(aut.eval("bba").unwrap().to_string(), "0");
    }

    #[test]
    fn test_words() {
        let aut = std_aut("law_char(ab), b", "a(a+b)*");
        assert_eq!(aut.num_states(), 4);
        assert_eq!(aut.num_transitions(), 7);
        assert_eq!(aut.final_states().len(), 3);
        assert!(aut.is_standard());
    }

    #[test]
    fn test_weights() {
        let aut = std_aut("lal_char(ab), z", "<2>(<3>a+b<5>)*<7>");
        assert_eq!(aut.num_states(), 3);
        let init = aut.initial_states()[0];
        assert_eq!(aut.final_weight(init).to_string(), "14");
        assert_eq!(aut.eval("a").unwrap().to_string(), "42");
        assert_eq!(aut.eval("ab").unwrap().to_string(), "210");
        assert_eq!(aut.eval("ba").unwrap().to_string(), "210");
    }

    #[test]
    fn test_star_of_nullable() {
        let aut = std_aut("lal_char(a), q", "(<1/2>\\e+a)*");
        let init = aut.initial_states()[0];
        assert_eq!(aut.final_weight(init).to_string(), "2");
        assert_eq!(aut.eval("aa").unwrap().to_string(), "8");
    }

    #[test]
    fn test_zero_and_one() {
        let aut = std_aut("lal_char(a), b", "\\z");
        assert_eq!(aut.num_states(), 1);
        assert!(aut.final_states().is_empty());
        let aut = std_aut("lal_char(a), b", "\\e");
        assert_eq!(aut.num_states(), 1);
        assert_eq!(aut.final_states().len(), 1);
    }

    #[test]
    fn test_matches_derived_term_on_tuples() {
        let ctx = Context::parse("lat<lan_char(abc), lan_char(xyz)>, z").unwrap();
        for text in ["a|x", "a|\\e"] {
            let e = Expression::parse(&ctx, text).unwrap();
            let dt = e.derived_term().unwrap().strip();
            assert!(e.standard().unwrap().is_isomorphic(&dt), "{}", text);
        }
    }

    #[test]
    fn test_unsupported() {
        let ctx = Context::parse("lal_char(ab), b").unwrap();
        let e = Expression::parse(&ctx, "a&b*").unwrap();
        assert!(matches!(e.standard(), Err(Error::PreconditionViolation { .. })));
    }
}
