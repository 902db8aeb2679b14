//! Structural properties of automata, accessibility, and evaluation.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::automaton::{Automaton, StateId, TransitionId};
use crate::error::{Error, Result};
use crate::labelset::{unescape_letters, Label, LabelSet};
use crate::scc::tarjan;
use crate::weightset::{Semiring, Weight};

impl Automaton {
    fn reachable(&self, from: StateId, forward: bool) -> BTreeSet<StateId> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(s) = queue.pop_front() {
            let ts = if forward { self.all_out(s) } else { self.all_in(s) };
            for &t in ts {
                let n = if forward { self.dst_of(t) } else { self.src_of(t) };
                if !n.is_sentinel() && seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen
    }

    /// States reachable from an initial state.
    pub fn accessible_states(&self) -> BTreeSet<StateId> {
        self.reachable(StateId::PRE, true)
    }

    /// States from which a final state is reachable.
    pub fn coaccessible_states(&self) -> BTreeSet<StateId> {
        self.reachable(StateId::POST, false)
    }

    /// States both accessible and coaccessible.
    pub fn useful_states(&self) -> BTreeSet<StateId> {
        let co = self.coaccessible_states();
        self.accessible_states().intersection(&co).copied().collect()
    }

    /// The sub-automaton of the useful states.
    pub fn trim(&self) -> Automaton {
        let useful = self.useful_states();
        self.restrict(|s| useful.contains(&s))
    }

    pub fn is_trim(&self) -> bool {
        self.useful_states().len() == self.num_states()
    }

    /// Whether no state is useful.
    pub fn is_useless(&self) -> bool {
        self.useful_states().is_empty()
    }

    /// Whether there is no state at all.
    pub fn is_empty(&self) -> bool {
        self.num_states() == 0
    }

    fn is_spontaneous(&self, t: TransitionId) -> bool {
        let l = self.label_of(t);
        !l.is_special() && l.is_one()
    }

    pub fn num_eps_transitions(&self) -> usize {
        self.transitions().filter(|&t| self.is_spontaneous(t)).count()
    }

    /// Whether no transition is spontaneous.
    pub fn is_proper(&self) -> bool {
        self.num_eps_transitions() == 0
    }

    /// Whether the spontaneous transitions form no cycle.
    pub fn is_eps_acyclic(&self) -> bool {
        let eps_succ = |s: StateId| -> Vec<StateId> {
            self.out(s)
                .into_iter()
                .filter(|&t| self.is_spontaneous(t))
                .map(|t| self.dst_of(t))
                .collect()
        };
        let self_loop = self.states().any(|s| eps_succ(s).contains(&s));
        !self_loop && tarjan(self.states(), eps_succ).iter().all(|c| c.len() == 1)
    }

    /// One initial state, with weight one, and no transition coming back
    /// into it.
    pub fn is_standard(&self) -> bool {
        match self.initial_transitions() {
            [t] => {
                let s = self.dst_of(*t);
                self.weight_of(*t).is_one() && self.inc(s).is_empty()
            }
            _ => false,
        }
    }

    pub fn is_costandard(&self) -> bool {
        self.transpose().is_standard()
    }

    pub fn is_normalized(&self) -> bool {
        self.is_standard() && self.is_costandard()
    }

    pub(crate) fn require_free(&self, operation: &'static str) -> Result<()> {
        if self.labelset().is_free() {
            Ok(())
        } else {
            Err(Error::precondition(
                operation,
                format!("a free labelset, not {}", self.labelset()),
            ))
        }
    }

    fn is_deterministic_state(&self, s: StateId) -> bool {
        let mut seen = HashSet::new();
        self.out(s).into_iter().all(|t| seen.insert(self.label_of(t).clone()))
    }

    /// States whose outgoing transitions have pairwise distinct labels.
    pub fn num_deterministic_states(&self) -> Result<usize> {
        self.require_free("num_deterministic_states")?;
        Ok(self.states().filter(|&s| self.is_deterministic_state(s)).count())
    }

    pub fn num_codeterministic_states(&self) -> Result<usize> {
        self.require_free("num_codeterministic_states")?;
        self.transpose().num_deterministic_states()
    }

    /// At most one initial state, and deterministic states only.
    pub fn is_deterministic(&self) -> Result<bool> {
        self.require_free("is_deterministic")?;
        Ok(self.initial_transitions().len() <= 1 && self.states().all(|s| self.is_deterministic_state(s)))
    }

    pub fn is_codeterministic(&self) -> Result<bool> {
        self.require_free("is_codeterministic")?;
        self.transpose().is_deterministic()
    }

    /// An initial state, and an outgoing transition for every letter from
    /// every state.
    pub fn is_complete(&self) -> Result<bool> {
        self.require_free("is_complete")?;
        let generators = self.labelset().generators().ok_or_else(|| {
            Error::precondition("is_complete", format!("a closed alphabet, not {}", self.labelset()))
        })?;
        if self.initial_transitions().is_empty() {
            return Ok(false);
        }
        Ok(self.states().all(|s| {
            let labels: HashSet<&Label> = self.out(s).into_iter().map(|t| self.label_of(t)).collect();
            generators.iter().all(|g| labels.contains(g))
        }))
    }

    /// The weight of `word`, given as escaped letters (`\e` for the empty
    /// word).
    pub fn eval(&self, word: &str) -> Result<Weight> {
        let ls = self.labelset();
        if !matches!(ls, LabelSet::Letters(_) | LabelSet::Nullable(_)) || !self.is_proper() {
            return Err(Error::precondition(
                "eval",
                format!("a proper automaton over letters, not {}", ls),
            ));
        }
        let letters = if word.trim() == "\\e" || word.trim() == "ε" {
            Vec::new()
        } else {
            unescape_letters(word.trim())?
        };
        let ws = self.weightset();
        let mut current: HashMap<StateId, Weight> = self
            .initial_transitions()
            .iter()
            .map(|&t| (self.dst_of(t), self.weight_of(t).clone()))
            .collect();
        for c in letters {
            let label = ls.letter(c);
            let mut next: HashMap<StateId, Weight> = HashMap::new();
            for (s, w) in &current {
                for t in self.out(*s) {
                    if *self.label_of(t) != label {
                        continue;
                    }
                    let v = ws.mul(w, self.weight_of(t));
                    let entry = next.entry(self.dst_of(t)).or_insert_with(|| ws.zero());
                    *entry = ws.add(entry, &v);
                }
            }
            current = next;
        }
        Ok(current
            .iter()
            .fold(ws.zero(), |acc, (s, w)| ws.add(&acc, &ws.mul(w, &self.final_weight(*s)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::expression::Expression;

    fn derive(ctx: &str, text: &str) -> Automaton {
        let ctx = Context::parse(ctx).unwrap();
        Expression::parse(&ctx, text).unwrap().derived_term().unwrap().strip()
    }

    #[test]
    fn test_accessibility() {
        let ctx = Context::parse("lal_char(ab), b").unwrap();
        let one = ctx.weightset().one();
        let mut aut = Automaton::new(ctx);
        let p = aut.new_state();
        let q = aut.new_state();
        let r = aut.new_state();
        let s = aut.new_state();
        aut.set_initial(p, one.clone());
        aut.add_transition(p, q, Label::Letter('a'), one.clone());
        aut.add_transition(p, r, Label::Letter('b'), one.clone());
        aut.add_transition(s, q, Label::Letter('a'), one.clone());
        aut.set_final(q, one);
        assert_eq!(aut.accessible_states(), BTreeSet::from([p, q, r]));
        assert_eq!(aut.coaccessible_states(), BTreeSet::from([p, q, s]));
        assert_eq!(aut.useful_states(), BTreeSet::from([p, q]));
        assert!(!aut.is_trim());
        let trimmed = aut.trim();
        assert!(trimmed.is_trim());
        assert_eq!(trimmed.num_states(), 2);
        assert!(!aut.is_useless());
        assert!(!aut.is_empty());
    }

    #[test]
    fn test_standard_and_deterministic() {
        let aut = derive("lal_char(ab), b", "(a+b)*a(a+b)");
        assert!(!aut.is_standard());
        assert!(!aut.is_deterministic().unwrap());
        assert_eq!(aut.num_deterministic_states().unwrap(), 2);
        assert!(!aut.is_complete().unwrap());
        let aut = derive("lal_char(ab), b", "ab");
        assert!(aut.is_standard());
        assert!(aut.is_costandard());
        assert!(aut.is_normalized());
        assert!(aut.is_deterministic().unwrap());
        assert!(aut.is_codeterministic().unwrap());
        let words = derive("law_char(ab), b", "ab");
        assert!(matches!(words.is_deterministic(), Err(Error::PreconditionViolation { .. })));
    }

    #[test]
    fn test_eps_acyclic() {
        let ctx = Context::parse("lan_char(a), b").unwrap();
        let one = ctx.weightset().one();
        let mut aut = Automaton::new(ctx);
        let p = aut.new_state();
        let q = aut.new_state();
        aut.set_initial(p, one.clone());
        aut.add_transition(p, q, Label::One, one.clone());
        assert!(!aut.is_proper());
        assert!(aut.is_eps_acyclic());
        aut.add_transition(q, p, Label::One, one.clone());
        assert!(!aut.is_eps_acyclic());
        aut.add_transition(q, q, Label::Letter('a'), one);
        assert_eq!(aut.num_eps_transitions(), 2);
    }

    #[test]
    fn test_eval() {
        let aut = derive("lal_char(ab), z", "(a+<2>b)*");
        assert_eq!(aut.eval("\\e").unwrap().to_string(), "1");
        assert_eq!(aut.eval("abb").unwrap().to_string(), "4");
        let aut = derive("lal_char(ab), zmin", "(<1>a+<2>b)*<3>");
        assert_eq!(aut.eval("ab").unwrap().to_string(), "6");
    }
}
