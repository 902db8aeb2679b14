//! Derived-term automata.
//!
//! States are the distinct expressions reachable from the input by taking
//! expansions; each state remembers the expression it stands for.

use std::collections::{BTreeMap, HashMap, VecDeque};

use log::debug;

use crate::automaton::{Automaton, StateId};
use crate::error::Result;
use crate::expansion::{to_expansion, ExpPolynomial, Expansion};
use crate::expression::{Exp, Expression, ExpressionSet};
use crate::weightset::Semiring;

/// A derived-term automaton with the expression of each state.
#[derive(Debug, Clone)]
pub struct DerivedTerm {
    pub automaton: Automaton,
    pub origins: BTreeMap<StateId, Exp>,
}

impl DerivedTerm {
    /// Forget the origins.
    pub fn strip(self) -> Automaton {
        self.automaton
    }

    /// The expression a state was built from.
    pub fn origin(&self, s: StateId) -> Option<&Exp> {
        self.origins.get(&s)
    }
}

struct Builder<'a> {
    rs: &'a ExpressionSet,
    aut: Automaton,
    states: HashMap<Exp, StateId>,
    origins: BTreeMap<StateId, Exp>,
    todo: VecDeque<(Exp, StateId)>,
}

impl Builder<'_> {
    fn state(&mut self, e: &Exp) -> StateId {
        if let Some(&s) = self.states.get(e) {
            return s;
        }
        let s = self.aut.new_state();
        debug!("derived_term: state {} = {}", s, crate::printer::format_exp(e, Default::default()));
        self.states.insert(e.clone(), s);
        self.origins.insert(s, e.clone());
        self.todo.push_back((e.clone(), s));
        s
    }
}

/// Build the derived-term automaton of `e`.
pub fn derived_term(e: &Expression) -> Result<DerivedTerm> {
    let rs = e.set();
    let mut b = Builder {
        rs,
        aut: Automaton::new(rs.context().clone()),
        states: HashMap::new(),
        origins: BTreeMap::new(),
        todo: VecDeque::new(),
    };
    let ws = rs.weightset();
    // `<k>E` starts in the state of `E` with initial weight `k`.
    let init = ExpPolynomial::monomial(rs, e.exp().clone(), ws.one());
    for (f, w) in init.iter() {
        let s = b.state(f);
        b.aut.add_initial(s, w.clone());
    }
    while let Some((f, s)) = b.todo.pop_front() {
        let Expansion { constant, polynomials } = to_expansion(b.rs, &f)?;
        b.aut.set_final(s, constant);
        for (label, p) in polynomials {
            for (g, w) in p.iter() {
                let d = b.state(g);
                b.aut.add_transition(s, d, label.clone(), w.clone());
            }
        }
    }
    debug!(
        "derived_term: {} states, {} transitions",
        b.aut.num_states(),
        b.aut.num_transitions()
    );
    Ok(DerivedTerm {
        automaton: b.aut,
        origins: b.origins,
    })
}

impl Expression {
    /// The expansion of this expression.
    pub fn expansion(&self) -> Result<Expansion> {
        to_expansion(self.set(), self.exp())
    }

    /// The weight of the empty word.
    pub fn constant_term(&self) -> Result<crate::weightset::Weight> {
        crate::expansion::constant_term(self.set(), self.exp())
    }

    /// The sum of weighted monomials equivalent to this expression.
    pub fn expand(&self) -> Expression {
        Expression::new(self.set().clone(), crate::expansion::expand(self.set(), self.exp()))
    }

    pub fn derived_term(&self) -> Result<DerivedTerm> {
        derived_term(self)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::context::Context;
    use crate::error::Error;
    use crate::expression::Identities;
    use crate::parser::Syntax;

    fn dt(ctx: &str, text: &str) -> DerivedTerm {
        let ctx = Context::parse(ctx).unwrap();
        Expression::parse(&ctx, text).unwrap().derived_term().unwrap()
    }

    #[test]
    fn test_third_letter_from_end() {
        let res = dt("lal_char(ab), b", "(a+b)*a(a+b)");
        assert_eq!(res.automaton.num_states(), 3);
        assert_eq!(res.automaton.initial_states().len(), 1);
        assert_eq!(res.automaton.final_states().len(), 1);
        assert_eq!(res.automaton.num_transitions(), 5);
    }

    #[test]
    fn test_origins() {
        let res = dt("lal_char(ab), z", "<2>ab");
        let aut = &res.automaton;
        let init = aut.initial_states()[0];
        assert_eq!(aut.initial_weight(init).to_string(), "2");
        assert_eq!(crate::printer::format_exp(res.origin(init).unwrap(), Default::default()), "ab");
        assert_eq!(res.origins.len(), aut.num_states());
        let aut = res.strip();
        assert_eq!(aut.num_states(), 3);
    }

    #[test]
    fn test_weights() {
        let res = dt("lal_char(a), q", "(<1/2>a)*");
        let aut = &res.automaton;
        assert_eq!(aut.num_states(), 1);
        let s = aut.initial_states()[0];
        assert_eq!(aut.final_weight(s).to_string(), "1");
        let t = aut.out(s)[0];
        assert_eq!(aut.weight_of(t).to_string(), "1/2");
    }

    #[test]
    fn test_not_starable() {
        let ctx = Context::parse("lal_char(a), z").unwrap();
        let e = Expression::parse_with(&ctx, "(\\e+a)*", Identities::Linear, Syntax::Default).unwrap();
        assert!(matches!(e.derived_term(), Err(Error::NotStarable { .. })));
    }

    #[test]
    fn test_letter_tapes() {
        let c = "lat<lal_char(ab), lal_char(xy)>, z";
        let res = dt(c, "(<2>a)|x").strip();
        assert_eq!(res.num_states(), 2);
        assert_eq!(res.num_transitions(), 1);
        let t = res.transitions().next().unwrap();
        assert_eq!(res.label_of(t).to_string(), "a|x");
        assert_eq!(res.weight_of(t).to_string(), "2");
        assert_eq!(res.final_weight(res.dst_of(t)).to_string(), "1");

        let res = dt(c, "(a+b)|x").strip();
        assert_eq!(res.num_states(), 2);
        assert_eq!(res.num_transitions(), 2);

        let res = dt(c, "(a|x+<2>b|y)*").strip();
        assert_eq!(res.num_states(), 1);
        assert_eq!(res.num_transitions(), 2);
    }

    #[test]
    fn test_zero() {
        let res = dt("lal_char(a), b", "\\z");
        assert_eq!(res.automaton.num_states(), 0);
        assert!(res.automaton.initial_states().is_empty());
    }
}
