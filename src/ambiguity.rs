//! Ambiguity: words accepted by several paths, and cycles read several ways.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use crate::automaton::{Automaton, StateId};
use crate::error::{Error, Result};
use crate::labelset::{Label, LabelSet};
use crate::scc::{sccs, tarjan};

/// A pair of paths: their current states, and whether they already differ.
type Pair = (StateId, StateId, bool);

impl Automaton {
    /// The shortest word accepted by two distinct paths.
    ///
    /// Fails with [`Error::Unambiguous`] when there is none.
    pub fn ambiguous_word(&self) -> Result<Label> {
        self.require_free("ambiguous_word")?;
        let mut parent: HashMap<Pair, Option<(Pair, Label)>> = HashMap::new();
        let mut queue = VecDeque::new();
        let inits = self.initial_states();
        for &p in &inits {
            for &q in &inits {
                let pair = (p, q, p != q);
                parent.insert(pair, None);
                queue.push_back(pair);
            }
        }
        while let Some(pair @ (p, q, diverged)) = queue.pop_front() {
            if diverged && self.is_final(p) && self.is_final(q) {
                let word = self.trace_word(&parent, pair)?;
                debug!("ambiguous_word: {}", word);
                return Ok(word);
            }
            for t1 in self.out(p) {
                let label = self.label_of(t1);
                for t2 in self.out(q) {
                    if self.label_of(t2) != label {
                        continue;
                    }
                    let (d1, d2) = (self.dst_of(t1), self.dst_of(t2));
                    let next = (d1, d2, diverged || d1 != d2);
                    if let std::collections::hash_map::Entry::Vacant(e) = parent.entry(next) {
                        e.insert(Some((pair, label.clone())));
                        queue.push_back(next);
                    }
                }
            }
        }
        Err(Error::Unambiguous)
    }

    fn trace_word(&self, parent: &HashMap<Pair, Option<(Pair, Label)>>, mut pair: Pair) -> Result<Label> {
        let mut labels = Vec::new();
        while let Some(Some((prev, label))) = parent.get(&pair) {
            labels.push(label.clone());
            pair = *prev;
        }
        labels.reverse();
        word_of(self.labelset(), &labels)
    }

    /// Whether some word is accepted by two distinct paths.
    pub fn is_ambiguous(&self) -> Result<bool> {
        match self.ambiguous_word() {
            Ok(_) => Ok(true),
            Err(Error::Unambiguous) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether some cycle of the automaton can be read along two distinct
    /// cycles with the same label.
    pub fn is_cycle_ambiguous(&self) -> Result<bool> {
        self.require_free("is_cycle_ambiguous")?;
        for component in sccs(self) {
            let members: HashSet<StateId> = component.iter().copied().collect();
            let nodes: Vec<(StateId, StateId)> = component
                .iter()
                .flat_map(|&p| component.iter().map(move |&q| (p, q)))
                .collect();
            let succ = |(p, q): (StateId, StateId)| -> Vec<(StateId, StateId)> {
                let mut res = Vec::new();
                for t1 in self.out(p) {
                    for t2 in self.out(q) {
                        let (d1, d2) = (self.dst_of(t1), self.dst_of(t2));
                        if self.label_of(t1) == self.label_of(t2) && members.contains(&d1) && members.contains(&d2) {
                            res.push((d1, d2));
                        }
                    }
                }
                res
            };
            for product in tarjan(nodes, succ) {
                let diagonal = product.iter().any(|(p, q)| p == q);
                let off_diagonal = product.iter().any(|(p, q)| p != q);
                if diagonal && off_diagonal {
                    debug!("is_cycle_ambiguous: product component of size {}", product.len());
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// Concatenate the letters of `labels` into a word of the word version of
/// `ls`.
pub(crate) fn word_of(ls: &LabelSet, labels: &[Label]) -> Result<Label> {
    match ls.words() {
        LabelSet::Tuple(tapes) => {
            let mut letters = vec![Vec::new(); tapes.len()];
            for l in labels {
                if let Label::Tuple(ls) = l {
                    for (acc, t) in letters.iter_mut().zip(ls) {
                        acc.extend(t.letters());
                    }
                }
            }
            Ok(Label::Tuple(
                tapes
                    .iter()
                    .zip(&letters)
                    .map(|(t, w)| t.word(w))
                    .collect::<Result<_>>()?,
            ))
        }
        words => {
            let letters: Vec<char> = labels.iter().flat_map(Label::letters).collect();
            words.word(&letters)
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::context::Context;
    use crate::expression::Expression;
    use crate::weightset::Semiring;

    fn derive(ctx: &str, text: &str) -> Automaton {
        let ctx = Context::parse(ctx).unwrap();
        Expression::parse(&ctx, text).unwrap().derived_term().unwrap().strip()
    }

    #[test]
    fn test_ambiguous_word() {
        let aut = derive("lal_char(ab), b", "a*a*");
        assert!(aut.is_ambiguous().unwrap());
        assert_eq!(aut.ambiguous_word().unwrap().to_string(), "a");
        let aut = derive("lal_char(ab), b", "(a+b)*a(a+b)*");
        assert_eq!(aut.ambiguous_word().unwrap().to_string(), "aa");
    }

    #[test]
    fn test_unambiguous() {
        let aut = derive("lal_char(ab), b", "(a+b)*a(a+b)");
        assert!(matches!(aut.ambiguous_word(), Err(Error::Unambiguous)));
        assert!(!aut.is_ambiguous().unwrap());
        assert!(!aut.is_cycle_ambiguous().unwrap());
    }

    #[test]
    fn test_requires_free_labelset() {
        let aut = derive("law_char(ab), b", "a*");
        assert!(matches!(aut.is_ambiguous(), Err(Error::PreconditionViolation { .. })));
    }

    #[test]
    fn test_cycle_ambiguous() {
        let ctx = Context::parse("lal_char(a), b").unwrap();
        let one = ctx.weightset().one();
        let mut aut = Automaton::new(ctx);
        let p = aut.new_state();
        let q = aut.new_state();
        aut.set_initial(p, one.clone());
        aut.add_transition(p, p, Label::Letter('a'), one.clone());
        aut.add_transition(p, q, Label::Letter('a'), one.clone());
        aut.add_transition(q, p, Label::Letter('a'), one.clone());
        aut.set_final(p, one);
        assert!(aut.is_cycle_ambiguous().unwrap());
        assert!(aut.is_ambiguous().unwrap());
    }
}
